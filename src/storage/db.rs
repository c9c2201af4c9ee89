//! Database-backed Social Graph Storage
//! Mission: One SQLite database for accounts, tweets, and the follow graph
//!
//! Key choices:
//! - WAL mode for concurrent reads during writes
//! - Single mutex-guarded connection; statements prepare against it directly
//! - Uniqueness invariants live in the schema (role-partitioned accounts,
//!   one like per user/tweet pair, one edge per ordered follow pair)

use crate::auth::models::{LikeRef, Role, User};
use crate::models::{
    FollowProfile, LikedTweet, RankedUser, Reply, ReplyWithAuthor, SortOrder, Tweet,
    TweetWithMeta, UserReply, UserWithStats,
};
use anyhow::{Context, Result};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Profile image defaults applied at signup
pub const DEFAULT_AVATAR_URL: &str = "https://i.imgur.com/TGuHpHB.jpg";
pub const DEFAULT_COVER_URL: &str = "https://i.imgur.com/vzIPCvD.png";

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    role TEXT NOT NULL,
    account TEXT NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    password TEXT NOT NULL,
    avatar TEXT NOT NULL,
    cover TEXT NOT NULL,
    introduction TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Accounts and emails are unique per role partition, not globally
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_role_account ON users(role, account);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_role_email ON users(role, email);

CREATE TABLE IF NOT EXISTS tweets (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    description TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tweets_user_updated ON tweets(user_id, updated_at DESC);
CREATE INDEX IF NOT EXISTS idx_tweets_created ON tweets(created_at DESC);

CREATE TABLE IF NOT EXISTS replies (
    id TEXT PRIMARY KEY,
    tweet_id TEXT NOT NULL REFERENCES tweets(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    comment TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_replies_tweet ON replies(tweet_id, created_at);
CREATE INDEX IF NOT EXISTS idx_replies_user_updated ON replies(user_id, updated_at DESC);

CREATE TABLE IF NOT EXISTS likes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    tweet_id TEXT NOT NULL REFERENCES tweets(id),
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_user_tweet ON likes(user_id, tweet_id);
CREATE INDEX IF NOT EXISTS idx_likes_tweet ON likes(tweet_id);

CREATE TABLE IF NOT EXISTS followships (
    follower_id TEXT NOT NULL REFERENCES users(id),
    following_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (follower_id, following_id)
);

CREATE INDEX IF NOT EXISTS idx_followships_following ON followships(following_id, created_at DESC);
"#;

const USER_COLUMNS: &str =
    "id, role, account, name, email, password, avatar, cover, introduction, created_at, updated_at";

/// Fields required to create a user row
pub struct NewUser {
    pub role: Role,
    pub account: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub cover: String,
}

/// Social graph storage over a single SQLite database
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database and apply the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // guarded by our own mutex

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to apply schema")?;

        info!("💾 Database ready at {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a default admin account on first start so the admin surface
    /// is reachable before any seeding
    pub fn seed_default_admin(&self) -> Result<()> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count > 0 {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        let password_hash = hash("12345678", DEFAULT_COST).context("Failed to hash password")?;

        conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
            params![
                Uuid::new_v4().to_string(),
                Role::Admin.as_str(),
                "root",
                "root",
                "root@example.com",
                password_hash,
                DEFAULT_AVATAR_URL,
                DEFAULT_COVER_URL,
                Option::<String>::None,
                now,
                now,
            ],
        )
        .context("Failed to insert default admin")?;

        info!("🔐 Default admin created (account: root, password: 12345678)");
        warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");

        Ok(())
    }

    // ===== Users =====

    pub fn create_user(&self, new: NewUser) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let user = User {
            id: Uuid::new_v4(),
            role: new.role,
            account: new.account,
            name: new.name,
            email: new.email,
            password: new.password_hash,
            avatar: new.avatar,
            cover: new.cover,
            introduction: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.conn.lock();
        conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
            params![
                user.id.to_string(),
                user.role.as_str(),
                user.account,
                user.name,
                user.email,
                user.password,
                user.avatar,
                user.cover,
                user.introduction,
                user.created_at,
                user.updated_at,
            ],
        )
        .context("Failed to insert user")?;

        info!("✅ Created {} account: {}", user.role.as_str(), user.account);

        Ok(user)
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;

        match stmt.query_row(params![id.to_string()], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Role-scoped account lookup: the same account string may exist once
    /// per partition
    pub fn get_user_by_account(&self, role: Role, account: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 AND account = ?2"
        ))?;

        match stmt.query_row(params![role.as_str(), account], row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn account_taken(&self, role: Role, account: &str, exclude: Option<Uuid>) -> Result<bool> {
        let conn = self.conn.lock();
        let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1 AND account = ?2 AND id != ?3",
            params![role.as_str(), account, exclude],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn email_taken(&self, role: Role, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let conn = self.conn.lock();
        let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1 AND email = ?2 AND id != ?3",
            params![role.as_str(), email, exclude],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Update name/introduction, returning the fresh row (None if the user
    /// is gone)
    pub fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        introduction: Option<&str>,
    ) -> Result<Option<User>> {
        {
            let conn = self.conn.lock();
            let changed = conn.execute(
                "UPDATE users SET name = ?1, introduction = ?2, updated_at = ?3 WHERE id = ?4",
                params![name, introduction, Utc::now().to_rfc3339(), id.to_string()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.get_user_by_id(id)
    }

    /// Update account credentials; a `None` password hash keeps the
    /// current one
    pub fn update_account(
        &self,
        id: Uuid,
        account: &str,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<Option<User>> {
        {
            let conn = self.conn.lock();
            let now = Utc::now().to_rfc3339();
            let changed = match password_hash {
                Some(hash) => conn.execute(
                    "UPDATE users SET account = ?1, name = ?2, email = ?3, password = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![account, name, email, hash, now, id.to_string()],
                )?,
                None => conn.execute(
                    "UPDATE users SET account = ?1, name = ?2, email = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![account, name, email, now, id.to_string()],
                )?,
            };
            if changed == 0 {
                return Ok(None);
            }
        }
        self.get_user_by_id(id)
    }

    /// All user-role accounts with their aggregates, most-followed first
    pub fn list_users_with_stats(&self) -> Result<Vec<UserWithStats>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.account, u.name, u.avatar, u.cover,
                    (SELECT COUNT(*) FROM tweets t WHERE t.user_id = u.id) AS tweet_count,
                    (SELECT COUNT(*) FROM likes l JOIN tweets t ON t.id = l.tweet_id
                     WHERE t.user_id = u.id) AS like_count,
                    (SELECT COUNT(*) FROM followships f WHERE f.following_id = u.id) AS follower_count,
                    (SELECT COUNT(*) FROM followships f WHERE f.follower_id = u.id) AS following_count
             FROM users u
             WHERE u.role = 'user'
             ORDER BY follower_count DESC, u.id ASC",
        )?;

        let users = stmt
            .query_map([], |row| {
                Ok(UserWithStats {
                    id: parse_uuid(0, row.get(0)?)?,
                    account: row.get(1)?,
                    name: row.get(2)?,
                    avatar: row.get(3)?,
                    cover: row.get(4)?,
                    tweet_count: row.get(5)?,
                    like_count: row.get(6)?,
                    follower_count: row.get(7)?,
                    following_count: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    /// Follower leaderboard: user-role accounts excluding the caller,
    /// ranked by a follower-count subquery
    pub fn followers_rank(
        &self,
        exclude: Uuid,
        order: SortOrder,
        limit: i64,
    ) -> Result<Vec<RankedUser>> {
        let conn = self.conn.lock();
        // Direction comes from an enum, never from raw client input
        let sql = format!(
            "SELECT u.id, u.account, u.name, u.avatar,
                    (SELECT COUNT(*) FROM followships f WHERE f.following_id = u.id) AS follower_count
             FROM users u
             WHERE u.role = 'user' AND u.id != ?1
             ORDER BY follower_count {}, u.id ASC
             LIMIT ?2",
            order.as_sql()
        );
        let mut stmt = conn.prepare(&sql)?;

        let users = stmt
            .query_map(params![exclude.to_string(), limit], |row| {
                Ok(RankedUser {
                    id: parse_uuid(0, row.get(0)?)?,
                    account: row.get(1)?,
                    name: row.get(2)?,
                    avatar: row.get(3)?,
                    follower_count: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    // ===== Followships =====

    pub fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT following_id FROM followships WHERE follower_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id.to_string()], |row| {
                parse_uuid(0, row.get(0)?)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    pub fn follower_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT follower_id FROM followships WHERE following_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id.to_string()], |row| {
                parse_uuid(0, row.get(0)?)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Insert a follow edge. Returns false when the edge already exists.
    pub fn add_followship(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO followships (follower_id, following_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                follower_id.to_string(),
                following_id.to_string(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a follow edge. Returns false when no edge existed.
    pub fn remove_followship(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM followships WHERE follower_id = ?1 AND following_id = ?2",
            params![follower_id.to_string(), following_id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// Profiles following the given user, most recent followship first
    pub fn followers_of(&self, user_id: Uuid) -> Result<Vec<FollowProfile>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.name, u.avatar, u.introduction
             FROM followships f JOIN users u ON u.id = f.follower_id
             WHERE f.following_id = ?1
             ORDER BY f.created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id.to_string()], row_to_follow_profile)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Profiles the given user follows, most recent followship first
    pub fn followings_of(&self, user_id: Uuid) -> Result<Vec<FollowProfile>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.name, u.avatar, u.introduction
             FROM followships f JOIN users u ON u.id = f.following_id
             WHERE f.follower_id = ?1
             ORDER BY f.created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id.to_string()], row_to_follow_profile)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ===== Tweets =====

    pub fn create_tweet(&self, user_id: Uuid, description: &str) -> Result<Tweet> {
        let now = Utc::now().to_rfc3339();
        let tweet = Tweet {
            id: Uuid::new_v4(),
            user_id,
            description: description.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tweets (id, user_id, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tweet.id.to_string(),
                tweet.user_id.to_string(),
                tweet.description,
                tweet.created_at,
                tweet.updated_at,
            ],
        )
        .context("Failed to insert tweet")?;

        Ok(tweet)
    }

    pub fn get_tweet(&self, id: Uuid) -> Result<Option<Tweet>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, description, created_at, updated_at FROM tweets WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], row_to_tweet) {
            Ok(tweet) => Ok(Some(tweet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_tweet_with_meta(&self, id: Uuid) -> Result<Option<TweetWithMeta>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{TWEET_META_SELECT} WHERE t.id = ?1"
        ))?;

        match stmt.query_row(params![id.to_string()], row_to_tweet_meta) {
            Ok(tweet) => Ok(Some(tweet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every tweet with author info and counts, newest first
    pub fn list_tweets(&self) -> Result<Vec<TweetWithMeta>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{TWEET_META_SELECT} ORDER BY t.created_at DESC"
        ))?;
        let rows = stmt
            .query_map([], row_to_tweet_meta)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// One user's tweets with counts, most recently updated first
    pub fn tweets_of_user(&self, user_id: Uuid) -> Result<Vec<TweetWithMeta>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{TWEET_META_SELECT} WHERE t.user_id = ?1 ORDER BY t.updated_at DESC"
        ))?;
        let rows = stmt
            .query_map(params![user_id.to_string()], row_to_tweet_meta)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn tweet_count(&self, user_id: Uuid) -> Result<i64> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM tweets WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a tweet with its replies and likes in one transaction.
    /// Returns false when the tweet did not exist.
    pub fn delete_tweet(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let id = id.to_string();
        tx.execute("DELETE FROM likes WHERE tweet_id = ?1", params![id])?;
        tx.execute("DELETE FROM replies WHERE tweet_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM tweets WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(removed > 0)
    }

    // ===== Replies =====

    pub fn create_reply(&self, tweet_id: Uuid, user_id: Uuid, comment: &str) -> Result<Reply> {
        let now = Utc::now().to_rfc3339();
        let reply = Reply {
            id: Uuid::new_v4(),
            tweet_id,
            user_id,
            comment: comment.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO replies (id, tweet_id, user_id, comment, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                reply.id.to_string(),
                reply.tweet_id.to_string(),
                reply.user_id.to_string(),
                reply.comment,
                reply.created_at,
                reply.updated_at,
            ],
        )
        .context("Failed to insert reply")?;

        Ok(reply)
    }

    /// Replies on a tweet with commenter info, oldest first
    pub fn replies_of_tweet(&self, tweet_id: Uuid) -> Result<Vec<ReplyWithAuthor>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.tweet_id, r.comment, r.created_at, r.updated_at,
                    u.id, u.account, u.name, u.avatar
             FROM replies r JOIN users u ON u.id = r.user_id
             WHERE r.tweet_id = ?1
             ORDER BY r.created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![tweet_id.to_string()], |row| {
                Ok(ReplyWithAuthor {
                    id: parse_uuid(0, row.get(0)?)?,
                    tweet_id: parse_uuid(1, row.get(1)?)?,
                    comment: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    user_id: parse_uuid(5, row.get(5)?)?,
                    account: row.get(6)?,
                    name: row.get(7)?,
                    avatar: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// One user's replies with the replied tweet's author, newest first
    pub fn replies_of_user(&self, user_id: Uuid) -> Result<Vec<UserReply>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.comment, r.created_at, r.updated_at, tu.id, tu.name
             FROM replies r
             JOIN tweets t ON t.id = r.tweet_id
             JOIN users tu ON tu.id = t.user_id
             WHERE r.user_id = ?1
             ORDER BY r.updated_at DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(UserReply {
                    id: parse_uuid(0, row.get(0)?)?,
                    comment: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                    tweeter_id: parse_uuid(4, row.get(4)?)?,
                    tweeter_name: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ===== Likes =====

    /// Insert a like. Returns false when the user already likes the tweet.
    pub fn add_like(&self, user_id: Uuid, tweet_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO likes (id, user_id, tweet_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                user_id.to_string(),
                tweet_id.to_string(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Remove a like. Returns false when no like existed.
    pub fn remove_like(&self, user_id: Uuid, tweet_id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND tweet_id = ?2",
            params![user_id.to_string(), tweet_id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// (like id, tweet id) pairs for the identity rehydration path
    pub fn likes_of_user(&self, user_id: Uuid) -> Result<Vec<LikeRef>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, tweet_id FROM likes WHERE user_id = ?1")?;
        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(LikeRef {
                    id: parse_uuid(0, row.get(0)?)?,
                    tweet_id: parse_uuid(1, row.get(1)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// One user's likes with the liked tweet and its author, newest first
    pub fn liked_tweets_of_user(&self, user_id: Uuid) -> Result<Vec<LikedTweet>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT l.id, l.tweet_id, l.created_at,
                    t.description, t.updated_at,
                    tu.id, tu.account, tu.name, tu.avatar,
                    (SELECT COUNT(*) FROM replies r WHERE r.tweet_id = t.id) AS reply_count,
                    (SELECT COUNT(*) FROM likes l2 WHERE l2.tweet_id = t.id) AS like_count
             FROM likes l
             JOIN tweets t ON t.id = l.tweet_id
             JOIN users tu ON tu.id = t.user_id
             WHERE l.user_id = ?1
             ORDER BY l.created_at DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(LikedTweet {
                    id: parse_uuid(0, row.get(0)?)?,
                    tweet_id: parse_uuid(1, row.get(1)?)?,
                    created_at: row.get(2)?,
                    description: row.get(3)?,
                    tweet_updated_at: row.get(4)?,
                    tweeter_id: parse_uuid(5, row.get(5)?)?,
                    account: row.get(6)?,
                    name: row.get(7)?,
                    avatar: row.get(8)?,
                    reply_count: row.get(9)?,
                    like_count: row.get(10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

const TWEET_META_SELECT: &str =
    "SELECT t.id, t.user_id, t.description, t.created_at, t.updated_at,
            u.account, u.name, u.avatar,
            (SELECT COUNT(*) FROM replies r WHERE r.tweet_id = t.id) AS reply_count,
            (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS like_count
     FROM tweets t JOIN users u ON u.id = t.user_id";

// ===== Row mappers =====

fn parse_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_role(idx: usize, value: String) -> rusqlite::Result<Role> {
    Role::from_str(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown role: {value}").into(),
        )
    })
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(0, row.get(0)?)?,
        role: parse_role(1, row.get(1)?)?,
        account: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        password: row.get(5)?,
        avatar: row.get(6)?,
        cover: row.get(7)?,
        introduction: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn row_to_tweet(row: &rusqlite::Row) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: parse_uuid(0, row.get(0)?)?,
        user_id: parse_uuid(1, row.get(1)?)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn row_to_tweet_meta(row: &rusqlite::Row) -> rusqlite::Result<TweetWithMeta> {
    Ok(TweetWithMeta {
        id: parse_uuid(0, row.get(0)?)?,
        user_id: parse_uuid(1, row.get(1)?)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        account: row.get(5)?,
        name: row.get(6)?,
        avatar: row.get(7)?,
        reply_count: row.get(8)?,
        like_count: row.get(9)?,
    })
}

fn row_to_follow_profile(row: &rusqlite::Row) -> rusqlite::Result<FollowProfile> {
    Ok(FollowProfile {
        id: parse_uuid(0, row.get(0)?)?,
        name: row.get(1)?,
        avatar: row.get(2)?,
        introduction: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (Database, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::new(temp_file.path().to_str().unwrap()).unwrap();
        (db, temp_file)
    }

    fn make_user(db: &Database, role: Role, account: &str) -> User {
        db.create_user(NewUser {
            role,
            account: account.to_string(),
            name: account.to_string(),
            email: format!("{account}@example.com"),
            password_hash: "hash".to_string(),
            avatar: DEFAULT_AVATAR_URL.to_string(),
            cover: DEFAULT_COVER_URL.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let fetched = db.get_user_by_id(alice.id).unwrap().unwrap();
        assert_eq!(fetched.account, "alice");
        assert_eq!(fetched.role, Role::User);

        let by_account = db.get_user_by_account(Role::User, "alice").unwrap();
        assert!(by_account.is_some());

        // Account lookup is role-scoped
        assert!(db.get_user_by_account(Role::Admin, "alice").unwrap().is_none());
    }

    #[test]
    fn test_role_partitioned_uniqueness() {
        let (db, _tmp) = create_test_db();

        make_user(&db, Role::User, "alice");
        assert!(db.account_taken(Role::User, "alice", None).unwrap());
        assert!(!db.account_taken(Role::Admin, "alice", None).unwrap());

        // The same account string is allowed in the other partition
        make_user(&db, Role::Admin, "alice");

        // A second insert into the same partition trips the unique index
        let dup = db.create_user(NewUser {
            role: Role::User,
            account: "alice".to_string(),
            name: "Imposter".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar: String::new(),
            cover: String::new(),
        });
        assert!(dup.is_err());
    }

    #[test]
    fn test_uniqueness_check_excludes_self() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        assert!(!db.account_taken(Role::User, "alice", Some(alice.id)).unwrap());
        assert!(!db
            .email_taken(Role::User, "alice@example.com", Some(alice.id))
            .unwrap());
    }

    #[test]
    fn test_update_account_keeps_password_when_none() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let updated = db
            .update_account(alice.id, "alice2", "Alice II", "a2@example.com", None)
            .unwrap()
            .unwrap();

        assert_eq!(updated.account, "alice2");
        assert_eq!(updated.password, "hash");

        let updated = db
            .update_account(alice.id, "alice2", "Alice II", "a2@example.com", Some("newhash"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.password, "newhash");
    }

    #[test]
    fn test_followships() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let bob = make_user(&db, Role::User, "bob");

        assert!(db.add_followship(alice.id, bob.id).unwrap());
        // Duplicate edge is reported, not inserted
        assert!(!db.add_followship(alice.id, bob.id).unwrap());

        assert_eq!(db.following_ids(alice.id).unwrap(), vec![bob.id]);
        assert_eq!(db.follower_ids(bob.id).unwrap(), vec![alice.id]);

        let followers = db.followers_of(bob.id).unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, alice.id);

        assert!(db.remove_followship(alice.id, bob.id).unwrap());
        assert!(!db.remove_followship(alice.id, bob.id).unwrap());
        assert!(db.following_ids(alice.id).unwrap().is_empty());
    }

    #[test]
    fn test_likes_unique_per_pair() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let tweet = db.create_tweet(alice.id, "hello world").unwrap();

        assert!(db.add_like(alice.id, tweet.id).unwrap());
        assert!(!db.add_like(alice.id, tweet.id).unwrap());

        let likes = db.likes_of_user(alice.id).unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].tweet_id, tweet.id);

        assert!(db.remove_like(alice.id, tweet.id).unwrap());
        assert!(!db.remove_like(alice.id, tweet.id).unwrap());
    }

    #[test]
    fn test_tweet_meta_counts() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let bob = make_user(&db, Role::User, "bob");
        let tweet = db.create_tweet(alice.id, "first!").unwrap();

        db.create_reply(tweet.id, bob.id, "nice").unwrap();
        db.create_reply(tweet.id, alice.id, "thanks").unwrap();
        db.add_like(bob.id, tweet.id).unwrap();

        let meta = db.get_tweet_with_meta(tweet.id).unwrap().unwrap();
        assert_eq!(meta.reply_count, 2);
        assert_eq!(meta.like_count, 1);
        assert_eq!(meta.account, "alice");

        assert_eq!(db.tweet_count(alice.id).unwrap(), 1);
    }

    #[test]
    fn test_delete_tweet_cascades() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let tweet = db.create_tweet(alice.id, "doomed").unwrap();
        db.create_reply(tweet.id, alice.id, "reply").unwrap();
        db.add_like(alice.id, tweet.id).unwrap();

        assert!(db.delete_tweet(tweet.id).unwrap());
        assert!(db.get_tweet(tweet.id).unwrap().is_none());
        assert!(db.likes_of_user(alice.id).unwrap().is_empty());
        assert!(db.replies_of_tweet(tweet.id).unwrap().is_empty());

        // Second delete finds nothing
        assert!(!db.delete_tweet(tweet.id).unwrap());
    }

    #[test]
    fn test_followers_rank_ordering_and_exclusion() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let bob = make_user(&db, Role::User, "bob");
        let carol = make_user(&db, Role::User, "carol");
        make_user(&db, Role::Admin, "boss");

        // carol: 2 followers, bob: 1, alice: 0
        db.add_followship(alice.id, carol.id).unwrap();
        db.add_followship(bob.id, carol.id).unwrap();
        db.add_followship(carol.id, bob.id).unwrap();

        let rank = db.followers_rank(alice.id, SortOrder::Desc, 10).unwrap();
        let accounts: Vec<&str> = rank.iter().map(|u| u.account.as_str()).collect();
        // Caller and admin-role users never appear
        assert_eq!(accounts, vec!["carol", "bob"]);
        assert_eq!(rank[0].follower_count, 2);

        let rank = db.followers_rank(alice.id, SortOrder::Asc, 10).unwrap();
        assert_eq!(rank[0].account, "bob");

        let rank = db.followers_rank(alice.id, SortOrder::Desc, 1).unwrap();
        assert_eq!(rank.len(), 1);
    }

    #[test]
    fn test_replies_of_user_carry_tweeter() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let bob = make_user(&db, Role::User, "bob");
        let tweet = db.create_tweet(alice.id, "original").unwrap();
        db.create_reply(tweet.id, bob.id, "me first").unwrap();

        let replies = db.replies_of_user(bob.id).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].tweeter_id, alice.id);
        assert_eq!(replies[0].tweeter_name, "alice");
    }

    #[test]
    fn test_liked_tweets_detail() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let bob = make_user(&db, Role::User, "bob");
        let tweet = db.create_tweet(alice.id, "likable").unwrap();
        db.add_like(bob.id, tweet.id).unwrap();

        let liked = db.liked_tweets_of_user(bob.id).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].tweeter_id, alice.id);
        assert_eq!(liked[0].description, "likable");
        assert_eq!(liked[0].like_count, 1);
    }

    #[test]
    fn test_seed_default_admin_once() {
        let (db, _tmp) = create_test_db();

        db.seed_default_admin().unwrap();
        let root = db.get_user_by_account(Role::Admin, "root").unwrap();
        assert!(root.is_some());

        // Idempotent
        db.seed_default_admin().unwrap();
        assert!(db.list_users_with_stats().unwrap().is_empty()); // admins not listed
    }

    #[test]
    fn test_admin_listing_stats() {
        let (db, _tmp) = create_test_db();

        let alice = make_user(&db, Role::User, "alice");
        let bob = make_user(&db, Role::User, "bob");
        let tweet = db.create_tweet(alice.id, "stats").unwrap();
        db.add_like(bob.id, tweet.id).unwrap();
        db.add_followship(bob.id, alice.id).unwrap();

        let stats = db.list_users_with_stats().unwrap();
        assert_eq!(stats.len(), 2);
        let alice_row = stats.iter().find(|u| u.account == "alice").unwrap();
        assert_eq!(alice_row.tweet_count, 1);
        assert_eq!(alice_row.like_count, 1); // likes received on her tweets
        assert_eq!(alice_row.follower_count, 1);
        assert_eq!(alice_row.following_count, 0);
    }
}
