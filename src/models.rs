//! Domain Models
//! Mission: Tweet, reply, like, and followship shapes shared across layers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tweet row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A reply row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub tweet_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Tweet joined with its author and aggregate counts
#[derive(Debug, Clone, Serialize)]
pub struct TweetWithMeta {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub account: String,
    pub name: String,
    pub avatar: String,
    pub reply_count: i64,
    pub like_count: i64,
}

/// Reply joined with its author, for tweet reply listings
#[derive(Debug, Clone, Serialize)]
pub struct ReplyWithAuthor {
    pub id: Uuid,
    pub tweet_id: Uuid,
    pub comment: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Uuid,
    pub account: String,
    pub name: String,
    pub avatar: String,
}

/// Reply joined with the replied tweet's author, for a user's reply history
#[derive(Debug, Clone, Serialize)]
pub struct UserReply {
    pub id: Uuid,
    pub comment: String,
    pub created_at: String,
    pub updated_at: String,
    pub tweeter_id: Uuid,
    pub tweeter_name: String,
}

/// A like joined with the liked tweet and its author
#[derive(Debug, Clone, Serialize)]
pub struct LikedTweet {
    pub id: Uuid,
    pub tweet_id: Uuid,
    pub created_at: String,
    pub tweet_updated_at: String,
    pub tweeter_id: Uuid,
    pub account: String,
    pub name: String,
    pub avatar: String,
    pub description: String,
    pub reply_count: i64,
    pub like_count: i64,
}

/// Profile excerpt of one end of a followship edge
#[derive(Debug, Clone, Serialize)]
pub struct FollowProfile {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub introduction: Option<String>,
}

/// Ranking row for the follower leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct RankedUser {
    pub id: Uuid,
    pub account: String,
    pub name: String,
    pub avatar: String,
    pub follower_count: i64,
}

/// Per-user aggregates for the admin listing
#[derive(Debug, Clone, Serialize)]
pub struct UserWithStats {
    pub id: Uuid,
    pub account: String,
    pub name: String,
    pub avatar: String,
    pub cover: String,
    pub tweet_count: i64,
    pub like_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Sort direction for ranked listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}
