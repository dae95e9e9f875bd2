use log::*;

use crate::{db_types::UserRecord, lpe_api::errors::IdentityError, traits::{UserApiError, UserManagement}};

/// Registration and user lookup by login. Password hashing happens at the HTTP layer; the engine only ever sees
/// (and stores) the opaque hash.
#[derive(Debug, Clone)]
pub struct IdentityApi<B> {
    db: B,
}

impl<B> IdentityApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> IdentityApi<B>
where B: UserManagement
{
    pub async fn register(&self, login: &str, password_hash: &str) -> Result<UserRecord, IdentityError> {
        match self.db.add_user(login, password_hash).await {
            Ok(user) => {
                info!("🧑️ New user registered: {login}");
                Ok(user)
            },
            Err(UserApiError::AlreadyExists) => {
                debug!("🧑️ Registration refused: login {login} is taken");
                Err(IdentityError::UserAlreadyExists)
            },
            Err(e) => Err(e.into()),
        }
    }

    pub async fn fetch_user(&self, login: &str) -> Result<UserRecord, IdentityError> {
        self.db.fetch_user_by_login(login).await?.ok_or_else(|| IdentityError::UserNotFound(login.to_string()))
    }
}
