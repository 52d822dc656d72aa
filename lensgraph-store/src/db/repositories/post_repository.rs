use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params_from_iter, OptionalExtension};

use lensgraph_types::{Comment, FeedItem, Post, RecencyWindow, RelationKind};

use super::window_clause;
use crate::db::{date_column, date_to_sql, DbPool};
use crate::error::duplicate_or;

const POST_COLUMNS: &str = "p.id, p.image_url, p.caption, p.posted_on";

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            image_url: row.get(1)?,
            caption: row.get(2)?,
            posted_on: date_column(row, 3)?,
        })
    }

    /// Create a post node; post ids are unique
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, image_url, caption, posted_on) VALUES (?, ?, ?, ?)",
            (post.id, &post.image_url, &post.caption, date_to_sql(post.posted_on)),
        )
        .map_err(|e| duplicate_or(e, "post", post.id))
        .context("Failed to create post")?;

        tracing::debug!(post_id = post.id, "Created post");
        Ok(())
    }

    /// Get a single post by id
    pub fn get_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS),
                [post_id],
                Self::map_post,
            )
            .optional()
            .context("Failed to get post")?;
        Ok(post)
    }

    /// Insert a set-like User -> Post edge, matching both endpoints first
    fn relate(&self, kind: RelationKind, table: &str, username: &str, post_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (user_id, post_id)
                     SELECT u.id, p.id FROM users u, posts p
                     WHERE u.username = ? AND p.id = ?",
                    table
                ),
                (username, post_id),
            )
            .with_context(|| format!("Failed to create {} edge", kind))?;

        if created == 0 {
            tracing::warn!(%kind, username, post_id, "Edge not created");
        }
        Ok(created > 0)
    }

    /// MAKES: mark `username` as the author of the post
    pub fn attribute(&self, username: &str, post_id: i64) -> Result<bool> {
        self.relate(RelationKind::Makes, "makes", username, post_id)
    }

    pub fn like(&self, username: &str, post_id: i64) -> Result<bool> {
        self.relate(RelationKind::Likes, "likes", username, post_id)
    }

    pub fn bookmark(&self, username: &str, post_id: i64) -> Result<bool> {
        self.relate(RelationKind::Bookmarks, "bookmarks", username, post_id)
    }

    /// COMMENTS: every call adds a comment, even with identical text
    pub fn comment(&self, username: &str, text: &str, post_id: i64, on: NaiveDate) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute(
                "INSERT INTO comments (user_id, post_id, body, created_on)
                 SELECT u.id, p.id, ?, ? FROM users u, posts p
                 WHERE u.username = ? AND p.id = ?",
                (text, date_to_sql(on), username, post_id),
            )
            .context("Failed to create comment")?;

        if created == 0 {
            tracing::warn!(username, post_id, "COMMENTS not created");
        }
        Ok(created > 0)
    }

    /// Posts made by a user, newest first
    pub fn by_author(&self, username: &str) -> Result<Vec<Post>> {
        self.posts_via("makes", username)
    }

    pub fn liked_by(&self, username: &str) -> Result<Vec<Post>> {
        self.posts_via("likes", username)
    }

    pub fn bookmarked_by(&self, username: &str) -> Result<Vec<Post>> {
        self.posts_via("bookmarks", username)
    }

    fn posts_via(&self, table: &str, username: &str) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts p
             JOIN {} e ON e.post_id = p.id
             JOIN users u ON e.user_id = u.id
             WHERE u.username = ?
             ORDER BY p.posted_on DESC, p.id",
            POST_COLUMNS, table
        ))?;

        let posts = stmt
            .query_map([username], Self::map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Number of LIKES on a post
    pub fn like_count(&self, post_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Comments on a post in the order they were made
    pub fn comments_on(&self, post_id: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, u.username, c.post_id, c.body, c.created_on
             FROM comments c
             JOIN users u ON c.user_id = u.id
             WHERE c.post_id = ?
             ORDER BY c.id",
        )?;

        let comments = stmt
            .query_map([post_id], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    author_username: row.get(1)?,
                    post_id: row.get(2)?,
                    text: row.get(3)?,
                    created_on: date_column(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    /// Posts made inside `window` by the people `username` follows
    pub fn followed_feed(
        &self,
        username: &str,
        window: &RecencyWindow,
        today: NaiveDate,
    ) -> Result<Vec<FeedItem>> {
        let (clause, range_params) = window_clause("p.posted_on", &window.ranges(today));
        let query = format!(
            "SELECT b.username, {}
             FROM users a
             JOIN follows f ON f.follower_id = a.id
             JOIN users b ON f.followed_id = b.id
             JOIN makes m ON m.user_id = b.id
             JOIN posts p ON m.post_id = p.id
             WHERE a.username = ? AND {}
             ORDER BY p.posted_on DESC, p.id",
            POST_COLUMNS, clause
        );

        let mut params = vec![username.to_string()];
        params.extend(range_params);

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&query)?;
        let feed = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(FeedItem {
                    author_username: row.get(0)?,
                    post: Post {
                        id: row.get(1)?,
                        image_url: row.get(2)?,
                        caption: row.get(3)?,
                        posted_on: date_column(row, 4)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load followed feed")?;

        tracing::debug!(username, items = feed.len(), "Loaded followed feed");
        Ok(feed)
    }
}
