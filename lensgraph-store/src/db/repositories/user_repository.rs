use anyhow::{Context, Result};
use rusqlite::OptionalExtension;

use lensgraph_types::User;

use crate::db::DbPool;
use crate::error::duplicate_or;

const USER_COLUMNS: &str = "u.username, u.email, u.password, u.name, u.bio, u.photo_url";

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            username: row.get(0)?,
            email: row.get(1)?,
            password: row.get(2)?,
            name: row.get(3)?,
            bio: row.get(4)?,
            photo_url: row.get(5)?,
        })
    }

    /// Create a user node; usernames are unique
    pub fn create(&self, user: &User) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (username, email, password, name, bio, photo_url)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                &user.username,
                &user.email,
                &user.password,
                &user.name,
                user.bio.as_deref(),
                user.photo_url.as_deref(),
            ),
        )
        .map_err(|e| duplicate_or(e, "user", &user.username))
        .context("Failed to create user")?;

        tracing::debug!(username = %user.username, "Created user");
        Ok(())
    }

    /// Get user by username
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.username = ?", USER_COLUMNS),
                [username],
                Self::map_user,
            )
            .optional()
            .context("Failed to get user by username")?;
        Ok(user)
    }

    /// All users in creation order
    pub fn list(&self) -> Result<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users u ORDER BY u.id", USER_COLUMNS))?;
        let users = stmt
            .query_map([], Self::map_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// FOLLOWS edge; returns false when either user is missing or the edge already exists
    pub fn follow(&self, follower: &str, followed: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id)
                 SELECT a.id, b.id FROM users a, users b
                 WHERE a.username = ? AND b.username = ?",
                (follower, followed),
            )
            .context("Failed to follow user")?;

        if created == 0 {
            tracing::warn!(follower, followed, "FOLLOWS not created");
        }
        Ok(created > 0)
    }

    /// Check if `follower` follows `followed`
    pub fn is_following(&self, follower: &str, followed: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows f
             JOIN users a ON f.follower_id = a.id
             JOIN users b ON f.followed_id = b.id
             WHERE a.username = ? AND b.username = ?",
            (follower, followed),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Usernames this user follows
    pub fn following(&self, username: &str) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT b.username FROM follows f
             JOIN users a ON f.follower_id = a.id
             JOIN users b ON f.followed_id = b.id
             WHERE a.username = ?
             ORDER BY b.username",
        )?;

        let following = stmt
            .query_map([username], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(following)
    }

    /// Usernames following this user
    pub fn followers(&self, username: &str) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT a.username FROM follows f
             JOIN users a ON f.follower_id = a.id
             JOIN users b ON f.followed_id = b.id
             WHERE b.username = ?
             ORDER BY a.username",
        )?;

        let followers = stmt
            .query_map([username], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(followers)
    }
}
