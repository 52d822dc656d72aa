mod user_repository;
mod post_repository;
mod tag_repository;
mod notification_repository;
mod message_repository;

pub use user_repository::UserRepository;
pub use post_repository::PostRepository;
pub use tag_repository::TagRepository;
pub use notification_repository::NotificationRepository;
pub use message_repository::MessageRepository;

use lensgraph_types::DateRange;

use super::date_to_sql;

/// `(col BETWEEN ? AND ?) OR ...` plus its parameters, one pair per range
pub(crate) fn window_clause(column: &str, ranges: &[DateRange]) -> (String, Vec<String>) {
    let clause = ranges
        .iter()
        .map(|_| format!("({} BETWEEN ? AND ?)", column))
        .collect::<Vec<_>>()
        .join(" OR ");
    let params = ranges
        .iter()
        .flat_map(|range| [date_to_sql(range.start), date_to_sql(range.end)])
        .collect();
    (format!("({})", clause), params)
}

#[cfg(test)]
pub(crate) mod test_support {
    use anyhow::Result;
    use chrono::NaiveDate;
    use lensgraph_types::{Post, User};

    use crate::db::Database;

    pub fn setup_test_db() -> Result<Database> {
        let db = Database::in_memory()?;
        db.initialize()?;
        Ok(db)
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn user(username: &str) -> User {
        User::new(&format!("{}@example.com", username), "secret", username, username)
    }

    pub fn post(id: i64, posted_on: NaiveDate) -> Post {
        Post {
            id,
            image_url: format!("https://img.example.com/{}", id),
            caption: format!("caption {}", id),
            posted_on,
        }
    }
}
