use anyhow::{Context, Result};

use lensgraph_types::{Post, Tag};

use crate::db::{date_column, DbPool};

pub struct TagRepository {
    pool: DbPool,
}

impl TagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a tag node; returns false if the tag already existed
    pub fn create(&self, name: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute("INSERT OR IGNORE INTO tags (name) VALUES (?)", [name])
            .context("Failed to create tag")?;
        Ok(created > 0)
    }

    /// All tags, alphabetically
    pub fn list(&self) -> Result<Vec<Tag>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| Ok(Tag { name: row.get(0)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// TAGGED edge from an existing tag to an existing post
    pub fn tag_post(&self, post_id: i64, name: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute(
                "INSERT OR IGNORE INTO tagged (tag_id, post_id)
                 SELECT t.id, p.id FROM tags t, posts p
                 WHERE t.name = ? AND p.id = ?",
                (name, post_id),
            )
            .context("Failed to tag post")?;

        if created == 0 {
            tracing::warn!(tag = name, post_id, "TAGGED not created");
        }
        Ok(created > 0)
    }

    /// Posts carrying a tag
    pub fn posts_tagged(&self, name: &str) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.image_url, p.caption, p.posted_on
             FROM posts p
             JOIN tagged tg ON tg.post_id = p.id
             JOIN tags t ON tg.tag_id = t.id
             WHERE t.name = ?
             ORDER BY p.posted_on DESC, p.id",
        )?;

        let posts = stmt
            .query_map([name], |row| {
                Ok(Post {
                    id: row.get(0)?,
                    image_url: row.get(1)?,
                    caption: row.get(2)?,
                    posted_on: date_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Tag names on a post
    pub fn tags_for_post(&self, post_id: i64) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN tagged tg ON tg.tag_id = t.id
             WHERE tg.post_id = ?
             ORDER BY t.name",
        )?;

        let tags = stmt
            .query_map([post_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }
}
