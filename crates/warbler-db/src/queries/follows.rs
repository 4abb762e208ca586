use super::{USER_COLUMNS, user_from_row};
use crate::models::UserRow;
use crate::queries::users::query_user_by_id;
use crate::{Database, DbError, DbResult};

// Edge direction: `user_following_id` follows `user_being_followed_id`.

impl Database {
    /// Make `follower_id` follow `followed_id`. Returns `false` if the edge already existed.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> DbResult<bool> {
        if follower_id == followed_id {
            return Err(DbError::Validation("users cannot follow themselves".into()));
        }

        self.with_conn(|conn| {
            if query_user_by_id(conn, follower_id)?.is_none()
                || query_user_by_id(conn, followed_id)?.is_none()
            {
                return Err(DbError::NotFound("user"));
            }

            let added = conn.execute(
                "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id)
                 VALUES (?1, ?2)",
                [followed_id, follower_id],
            )?;
            Ok(added == 1)
        })
    }

    /// Remove the edge if present. Returns whether anything was removed.
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> DbResult<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                [followed_id, follower_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Users following `user_id`, in the order they followed.
    pub fn list_followers(&self, user_id: i64) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM follows f
                 JOIN users u ON u.id = f.user_following_id
                 WHERE f.user_being_followed_id = ?1
                 ORDER BY f.rowid"
            ))?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users `user_id` follows, in the order they were followed.
    pub fn list_following(&self, user_id: i64) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM follows f
                 JOIN users u ON u.id = f.user_being_followed_id
                 WHERE f.user_following_id = ?1
                 ORDER BY f.rowid"
            ))?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_following(&self, user_id: i64, other_id: i64) -> DbResult<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM follows
                    WHERE user_following_id = ?1 AND user_being_followed_id = ?2
                 )",
                [user_id, other_id],
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn is_followed_by(&self, user_id: i64, other_id: i64) -> DbResult<bool> {
        self.is_following(other_id, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};

    fn names(rows: Vec<UserRow>) -> Vec<String> {
        rows.into_iter().map(|u| u.username).collect()
    }

    #[test]
    fn follow_is_directional() {
        let db = db();
        let u1 = user(&db, "test1");
        let u2 = user(&db, "test2");

        assert!(db.follow(u1.id, u2.id).unwrap());

        assert_eq!(names(db.list_following(u1.id).unwrap()), vec!["test2"]);
        assert_eq!(names(db.list_followers(u2.id).unwrap()), vec!["test1"]);
        assert!(db.list_followers(u1.id).unwrap().is_empty());
        assert!(db.list_following(u2.id).unwrap().is_empty());
        assert!(db.is_following(u1.id, u2.id).unwrap());
        assert!(!db.is_following(u2.id, u1.id).unwrap());
        assert!(db.is_followed_by(u2.id, u1.id).unwrap());
        assert!(!db.is_followed_by(u1.id, u2.id).unwrap());
    }

    #[test]
    fn follow_twice_is_a_noop() {
        let db = db();
        let u1 = user(&db, "test1");
        let u2 = user(&db, "test2");

        assert!(db.follow(u1.id, u2.id).unwrap());
        assert!(!db.follow(u1.id, u2.id).unwrap());
        assert_eq!(db.list_followers(u2.id).unwrap().len(), 1);
    }

    #[test]
    fn self_follow_is_rejected() {
        let db = db();
        let u1 = user(&db, "test1");
        assert!(matches!(db.follow(u1.id, u1.id), Err(DbError::Validation(_))));
    }

    #[test]
    fn follow_unknown_user_is_not_found() {
        let db = db();
        let u1 = user(&db, "test1");
        assert!(matches!(db.follow(u1.id, 4242), Err(DbError::NotFound("user"))));
    }

    #[test]
    fn unfollow_removes_only_that_edge() {
        let db = db();
        let u1 = user(&db, "test1");
        let u2 = user(&db, "test2");
        db.follow(u1.id, u2.id).unwrap();
        db.follow(u2.id, u1.id).unwrap();

        assert!(db.unfollow(u1.id, u2.id).unwrap());
        assert!(!db.unfollow(u1.id, u2.id).unwrap());
        assert!(db.list_following(u1.id).unwrap().is_empty());
        assert_eq!(names(db.list_following(u2.id).unwrap()), vec!["test1"]);
    }

    #[test]
    fn followers_keep_insertion_order() {
        let db = db();
        let target = user(&db, "target");
        let c = user(&db, "carol");
        let a = user(&db, "alice");
        db.follow(c.id, target.id).unwrap();
        db.follow(a.id, target.id).unwrap();

        assert_eq!(names(db.list_followers(target.id).unwrap()), vec!["carol", "alice"]);
    }
}
