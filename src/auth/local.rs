//! Local Strategy
//! Mission: Validate account/password credentials against a role partition

use crate::auth::models::{AuthenticatedIdentity, Role};
use crate::error::ApiError;
use crate::storage::Database;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

/// Credential-based authentication check. Owned by router setup and handed
/// to the sign-in handler explicitly; there is no process-wide registry.
#[derive(Clone)]
pub struct LocalStrategy {
    db: Arc<Database>,
}

impl LocalStrategy {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Validate `{role, account, password}` and build the sign-in identity:
    /// the user minus the password hash, plus current follow sets.
    pub fn authenticate(
        &self,
        role: Role,
        account: &str,
        password: &str,
    ) -> Result<AuthenticatedIdentity, ApiError> {
        let user = self
            .db
            .get_user_by_account(role, account)?
            .ok_or_else(|| ApiError::authentication("account does not exist"))?;

        let valid = bcrypt::verify(password, &user.password)
            .context("Failed to verify password")
            .map_err(ApiError::Internal)?;
        if !valid {
            warn!("❌ Failed sign-in attempt: {}", account);
            return Err(ApiError::authentication("incorrect account or password"));
        }

        let following_ids = self.db.following_ids(user.id)?;
        let follower_ids = self.db.follower_ids(user.id)?;

        info!("✅ Sign-in: {} ({})", user.account, user.role.as_str());

        Ok(AuthenticatedIdentity {
            user,
            following_ids,
            follower_ids,
            likes: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewUser, DEFAULT_AVATAR_URL, DEFAULT_COVER_URL};
    use bcrypt::{hash, DEFAULT_COST};
    use tempfile::NamedTempFile;

    fn setup() -> (LocalStrategy, Arc<Database>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(temp_file.path().to_str().unwrap()).unwrap());
        (LocalStrategy::new(db.clone()), db, temp_file)
    }

    fn make_user(db: &Database, role: Role, account: &str, password: &str) {
        db.create_user(NewUser {
            role,
            account: account.to_string(),
            name: account.to_string(),
            email: format!("{account}@example.com"),
            password_hash: hash(password, DEFAULT_COST).unwrap(),
            avatar: DEFAULT_AVATAR_URL.to_string(),
            cover: DEFAULT_COVER_URL.to_string(),
        })
        .unwrap();
    }

    #[test]
    fn test_authenticate_success_builds_identity() {
        let (strategy, db, _tmp) = setup();
        make_user(&db, Role::User, "alice", "secret1");
        make_user(&db, Role::User, "bob", "hunter2");

        let alice = db.get_user_by_account(Role::User, "alice").unwrap().unwrap();
        let bob = db.get_user_by_account(Role::User, "bob").unwrap().unwrap();
        db.add_followship(alice.id, bob.id).unwrap();
        db.add_followship(bob.id, alice.id).unwrap();

        let identity = strategy.authenticate(Role::User, "alice", "secret1").unwrap();
        assert_eq!(identity.user.id, alice.id);
        assert_eq!(identity.following_ids, vec![bob.id]);
        assert_eq!(identity.follower_ids, vec![bob.id]);
        assert!(identity.likes.is_none());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (strategy, db, _tmp) = setup();
        make_user(&db, Role::User, "alice", "secret1");

        let err = strategy
            .authenticate(Role::User, "alice", "wrong")
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[test]
    fn test_unknown_account_rejected() {
        let (strategy, _db, _tmp) = setup();

        let err = strategy
            .authenticate(Role::User, "nobody", "whatever")
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[test]
    fn test_lookup_is_role_scoped() {
        let (strategy, db, _tmp) = setup();
        make_user(&db, Role::User, "alice", "secret1");

        // Correct credentials against the wrong partition fail
        let err = strategy
            .authenticate(Role::Admin, "alice", "secret1")
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }
}
