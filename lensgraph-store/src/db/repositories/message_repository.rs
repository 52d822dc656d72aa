use anyhow::{Context, Result};
use chrono::NaiveDate;

use lensgraph_types::Message;

use crate::db::{date_column, date_to_sql, DbPool};

pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// MESSAGES edge; every call adds a message
    pub fn send(&self, sender: &str, text: &str, recipient: &str, on: NaiveDate) -> Result<bool> {
        let conn = self.pool.get()?;
        let created = conn
            .execute(
                "INSERT INTO messages (sender_id, recipient_id, body, sent_on)
                 SELECT a.id, b.id, ?, ? FROM users a, users b
                 WHERE a.username = ? AND b.username = ?",
                (text, date_to_sql(on), sender, recipient),
            )
            .context("Failed to send message")?;

        if created == 0 {
            tracing::warn!(sender, recipient, "MESSAGES not created");
        }
        Ok(created > 0)
    }

    /// Messages exchanged between two users, both directions, in send order
    pub fn conversation(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, a.username, b.username, m.body, m.sent_on
             FROM messages m
             JOIN users a ON m.sender_id = a.id
             JOIN users b ON m.recipient_id = b.id
             WHERE (a.username = ?1 AND b.username = ?2)
                OR (a.username = ?2 AND b.username = ?1)
             ORDER BY m.id",
        )?;

        let messages = stmt
            .query_map((user_a, user_b), |row| {
                Ok(Message {
                    id: row.get(0)?,
                    from_username: row.get(1)?,
                    to_username: row.get(2)?,
                    text: row.get(3)?,
                    sent_on: date_column(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{date, setup_test_db, user};
    use crate::db::repositories::UserRepository;

    #[test]
    fn test_conversation_covers_both_directions() -> Result<()> {
        let db = setup_test_db()?;
        let users = UserRepository::new(db.pool.clone());
        for name in ["madmax", "theTruther", "estolfo"] {
            users.create(&user(name))?;
        }
        let repo = MessageRepository::new(db.pool.clone());
        let today = date(2018, 5, 4);

        repo.send("madmax", "Did you see Katherines new photo?", "theTruther", today)?;
        repo.send("theTruther", "Yea, I even left a comment haha", "madmax", today)?;
        repo.send("estolfo", "Which database is your favorite?", "madmax", today)?;
        repo.send("madmax", "Cool cool", "theTruther", today)?;

        let texts: Vec<String> = repo
            .conversation("madmax", "theTruther")?
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "Did you see Katherines new photo?",
                "Yea, I even left a comment haha",
                "Cool cool",
            ]
        );

        let reversed = repo.conversation("theTruther", "madmax")?;
        assert_eq!(reversed.len(), 3);
        assert_eq!(reversed[1].from_username, "theTruther");
        Ok(())
    }

    #[test]
    fn test_send_to_missing_user_creates_nothing() -> Result<()> {
        let db = setup_test_db()?;
        UserRepository::new(db.pool.clone()).create(&user("madmax"))?;
        let repo = MessageRepository::new(db.pool.clone());

        assert!(!repo.send("madmax", "anyone?", "ghost", date(2018, 5, 4))?);
        assert!(repo.conversation("madmax", "ghost")?.is_empty());
        Ok(())
    }
}
