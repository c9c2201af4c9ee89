//! Authentication Models
//! Mission: Define user, identity, and token claim structures

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    pub account: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String, // bcrypt hash - never serialize
    pub avatar: String,
    pub cover: String,
    pub introduction: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Role partition. Accounts are unique within a role, not globally,
/// and the role of a user never changes after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Parse a role path segment. Anything other than the two known
    /// partitions is rejected by the caller.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// A like held by the signed-in user, as carried on the rehydrated identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeRef {
    pub id: Uuid,
    pub tweet_id: Uuid,
}

/// Request-scoped reconstruction of a user for authorization decisions.
///
/// Built in two places: the local strategy attaches the follow sets at
/// sign-in, and the token verifier rebuilds the whole thing (including
/// current likes) from the live store on every request. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedIdentity {
    #[serde(flatten)]
    pub user: User,
    pub following_ids: Vec<Uuid>,
    pub follower_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<LikeRef>>,
}

impl AuthenticatedIdentity {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn is_following(&self, user_id: Uuid) -> bool {
        self.following_ids.contains(&user_id)
    }

    /// Tweet ids the signed-in user currently likes. Empty when the
    /// identity was built without like data (sign-in path).
    pub fn liked_tweet_ids(&self) -> HashSet<Uuid> {
        self.likes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|l| l.tweet_id)
            .collect()
    }
}

/// JWT claims: a snapshot of the identity at sign-in time. Only `sub` is
/// trusted after verification; everything else is refreshed from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    pub account: String,
    pub name: String,
    pub following_ids: Vec<Uuid>,
    pub follower_ids: Vec<Uuid>,
    pub exp: usize, // expiration timestamp
}

/// Sign-in form body
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub account: String,
    pub password: String,
}

/// Sign-in response
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub user: AuthenticatedIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(role: Role) -> User {
        let now = Utc::now().to_rfc3339();
        User {
            id: Uuid::new_v4(),
            role,
            account: "tester".to_string(),
            name: "Tester".to_string(),
            email: "tester@example.com".to_string(),
            password: "$2b$12$hash".to_string(),
            avatar: "https://example.com/avatar.jpg".to_string(),
            cover: "https://example.com/cover.png".to_string(),
            introduction: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("user"), Some(Role::User));
        assert_eq!(Role::from_str("root"), None);
        assert_eq!(Role::from_str("Admin"), None);
        assert_eq!(Role::from_str(""), None);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let role: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = test_user(Role::User);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["account"], "tester");
    }

    #[test]
    fn test_identity_like_lookup() {
        let user = test_user(Role::User);
        let tweet_id = Uuid::new_v4();
        let identity = AuthenticatedIdentity {
            user,
            following_ids: vec![],
            follower_ids: vec![],
            likes: Some(vec![LikeRef {
                id: Uuid::new_v4(),
                tweet_id,
            }]),
        };

        assert!(identity.liked_tweet_ids().contains(&tweet_id));
        assert!(!identity.is_admin());
    }
}
