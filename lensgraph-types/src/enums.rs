use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeLabel {
    User,
    Post,
    Tag,
    Notification,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::User => "User",
            NodeLabel::Post => "Post",
            NodeLabel::Tag => "Tag",
            NodeLabel::Notification => "Notification",
        }
    }
}

/// Typed, directed edges of the social graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Makes,
    Likes,
    Bookmarks,
    Tagged,
    Comments,
    Follows,
    Messages,
    Received,
}

impl RelationKind {
    pub const ALL: [RelationKind; 8] = [
        RelationKind::Makes,
        RelationKind::Likes,
        RelationKind::Bookmarks,
        RelationKind::Tagged,
        RelationKind::Comments,
        RelationKind::Follows,
        RelationKind::Messages,
        RelationKind::Received,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Makes => "MAKES",
            RelationKind::Likes => "LIKES",
            RelationKind::Bookmarks => "BOOKMARKS",
            RelationKind::Tagged => "TAGGED",
            RelationKind::Comments => "COMMENTS",
            RelationKind::Follows => "FOLLOWS",
            RelationKind::Messages => "MESSAGES",
            RelationKind::Received => "RECEIVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MAKES" => Some(RelationKind::Makes),
            "LIKES" => Some(RelationKind::Likes),
            "BOOKMARKS" => Some(RelationKind::Bookmarks),
            "TAGGED" => Some(RelationKind::Tagged),
            "COMMENTS" => Some(RelationKind::Comments),
            "FOLLOWS" => Some(RelationKind::Follows),
            "MESSAGES" => Some(RelationKind::Messages),
            "RECEIVED" => Some(RelationKind::Received),
            _ => None,
        }
    }

    pub fn source(&self) -> NodeLabel {
        match self {
            RelationKind::Tagged => NodeLabel::Tag,
            _ => NodeLabel::User,
        }
    }

    pub fn target(&self) -> NodeLabel {
        match self {
            RelationKind::Follows | RelationKind::Messages => NodeLabel::User,
            RelationKind::Received => NodeLabel::Notification,
            _ => NodeLabel::Post,
        }
    }

    /// Event edges keep every occurrence; the rest behave like sets
    pub fn allows_parallel_edges(&self) -> bool {
        matches!(self, RelationKind::Comments | RelationKind::Messages)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_kind() {
        for kind in RelationKind::ALL {
            assert_eq!(RelationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationKind::parse("follows"), Some(RelationKind::Follows));
        assert_eq!(RelationKind::parse("POKES"), None);
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(RelationKind::Tagged.source(), NodeLabel::Tag);
        assert_eq!(RelationKind::Tagged.target(), NodeLabel::Post);
        assert_eq!(RelationKind::Received.target(), NodeLabel::Notification);
        assert_eq!(RelationKind::Messages.target(), NodeLabel::User);
        assert!(RelationKind::Comments.allows_parallel_edges());
        assert!(!RelationKind::Likes.allows_parallel_edges());
    }
}
