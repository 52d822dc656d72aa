use anyhow::{Context, Result};

use lensgraph_types::{NodeCounts, NodeLabel, RelationKind};

use crate::db::repositories::{
    MessageRepository, NotificationRepository, PostRepository, TagRepository, UserRepository,
};
use crate::db::schema::GRAPH_TABLES;
use crate::db::Database;

/// Edge table and the column/lookup used to find its source node
fn edge_table(kind: RelationKind) -> (&'static str, &'static str) {
    match kind {
        RelationKind::Makes => ("makes", "user_id"),
        RelationKind::Likes => ("likes", "user_id"),
        RelationKind::Bookmarks => ("bookmarks", "user_id"),
        RelationKind::Tagged => ("tagged", "tag_id"),
        RelationKind::Comments => ("comments", "user_id"),
        RelationKind::Follows => ("follows", "follower_id"),
        RelationKind::Messages => ("messages", "sender_id"),
        RelationKind::Received => ("received", "user_id"),
    }
}

/// The photo-sharing graph: one repository per node label over a shared pool
pub struct SocialGraph {
    db: Database,
    pub users: UserRepository,
    pub posts: PostRepository,
    pub tags: TagRepository,
    pub notifications: NotificationRepository,
    pub messages: MessageRepository,
}

impl SocialGraph {
    pub fn new(db: Database) -> Self {
        let pool = db.pool.clone();
        Self {
            users: UserRepository::new(pool.clone()),
            posts: PostRepository::new(pool.clone()),
            tags: TagRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Remove every node and relationship; document collections are untouched
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction()?;
        for table in GRAPH_TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])
                .with_context(|| format!("Failed to clear {}", table))?;
        }
        tx.commit().context("Failed to commit graph wipe")?;

        tracing::info!("Graph cleared");
        Ok(())
    }

    pub fn node_counts(&self) -> Result<NodeCounts> {
        let conn = self.db.connection()?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };

        Ok(NodeCounts {
            users: count("users")?,
            posts: count("posts")?,
            tags: count("tags")?,
            notifications: count("notifications")?,
        })
    }

    /// Total edges of one type
    pub fn relationship_count(&self, kind: RelationKind) -> Result<usize> {
        let (table, _) = edge_table(kind);
        let conn = self.db.connection()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }

    /// Edges of one type leaving a node; `key` is a username, or a tag name for TAGGED
    pub fn outgoing_count(&self, kind: RelationKind, key: &str) -> Result<usize> {
        let (table, source_column) = edge_table(kind);
        let (node_table, key_column) = match kind.source() {
            NodeLabel::Tag => ("tags", "name"),
            _ => ("users", "username"),
        };

        let conn = self.db.connection()?;
        let n: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} e JOIN {} s ON e.{} = s.id WHERE s.{} = ?",
                    table, node_table, source_column, key_column
                ),
                [key],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to count {} edges from {}", kind, key))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lensgraph_types::{Post, User};

    fn graph() -> Result<SocialGraph> {
        let db = Database::in_memory()?;
        db.initialize()?;
        Ok(SocialGraph::new(db))
    }

    fn post(id: i64) -> Post {
        Post {
            id,
            image_url: "url".to_string(),
            caption: "caption".to_string(),
            posted_on: NaiveDate::from_ymd_opt(2018, 5, 1).unwrap(),
        }
    }

    #[test]
    fn test_counts_and_clear() -> Result<()> {
        let graph = graph()?;
        graph.users.create(&User::new("a@x.y", "pw", "A", "alice"))?;
        graph.users.create(&User::new("b@x.y", "pw", "B", "bob"))?;
        graph.posts.create(&post(1))?;
        graph.posts.create(&post(2))?;
        graph.tags.create("nature")?;
        graph.posts.attribute("alice", 1)?;
        graph.posts.attribute("alice", 2)?;
        graph.posts.like("bob", 1)?;
        graph.tags.tag_post(1, "nature")?;
        graph.users.follow("bob", "alice")?;

        assert_eq!(
            graph.node_counts()?,
            NodeCounts {
                users: 2,
                posts: 2,
                tags: 1,
                notifications: 0
            }
        );
        assert_eq!(graph.outgoing_count(RelationKind::Makes, "alice")?, 2);
        assert_eq!(graph.outgoing_count(RelationKind::Makes, "bob")?, 0);
        assert_eq!(graph.outgoing_count(RelationKind::Tagged, "nature")?, 1);
        assert_eq!(graph.relationship_count(RelationKind::Follows)?, 1);

        graph.clear()?;
        assert_eq!(graph.node_counts()?, NodeCounts::default());
        for kind in RelationKind::ALL {
            assert_eq!(graph.relationship_count(kind)?, 0);
        }
        Ok(())
    }

    #[test]
    fn test_clear_keeps_documents() -> Result<()> {
        let graph = graph()?;
        let conn = graph.database().connection()?;
        conn.execute(
            "INSERT INTO documents (collection, doc_id, body) VALUES ('movies', '1', '{}')",
            [],
        )?;
        drop(conn);

        graph.clear()?;
        let conn = graph.database().connection()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        assert_eq!(n, 1);
        Ok(())
    }
}
