use anyhow::Result;
use serde_json::Value;

use lensgraph_types::{yyyymmdd, FeedItem, Post};

/// `username, YYYYMMDD, caption, url`
pub fn feed_line(item: &FeedItem) -> String {
    format!(
        "{}, {}, {}, {}",
        item.author_username,
        yyyymmdd(item.post.posted_on),
        item.post.caption,
        item.post.image_url
    )
}

/// `YYYYMMDD, caption, url`
pub fn photo_line(post: &Post) -> String {
    format!("{}, {}, {}", yyyymmdd(post.posted_on), post.caption, post.image_url)
}

pub fn pretty(doc: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn portrait() -> Post {
        Post {
            id: 4,
            image_url: "https://example.com/p/4".to_string(),
            caption: "Smiling, but only softly".to_string(),
            posted_on: NaiveDate::from_ymd_opt(2018, 5, 2).unwrap(),
        }
    }

    #[test]
    fn test_feed_line_format() {
        let item = FeedItem {
            author_username: "kittykat".to_string(),
            post: portrait(),
        };
        assert_eq!(
            feed_line(&item),
            "kittykat, 20180502, Smiling, but only softly, https://example.com/p/4"
        );
    }

    #[test]
    fn test_photo_line_format() {
        assert_eq!(
            photo_line(&portrait()),
            "20180502, Smiling, but only softly, https://example.com/p/4"
        );
    }

    #[test]
    fn test_pretty_document() {
        let text = pretty(&json!({"_id": "Short", "count": 3})).unwrap();
        assert!(text.contains("\"_id\": \"Short\""));
        assert!(text.contains('\n'));
    }
}
