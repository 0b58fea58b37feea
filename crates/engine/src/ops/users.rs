use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, User,
    util::{normalize_required_name, normalize_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a user account and return its id.
    pub async fn register_user(&self, username: &str, password: &str) -> ResultEngine<Uuid> {
        let username = normalize_required_name(username, "user")?;
        if password.is_empty() {
            return Err(EngineError::InvalidName(
                "password must not be empty".to_string(),
            ));
        }
        let user = User::new(username, password.to_string());

        with_tx!(self, catalog, |tx| {
            if tx.user_by_username(&user.username).await?.is_some() {
                return Err(EngineError::ExistingKey(user.username.clone()));
            }
            tx.insert_user(&user).await?;
            tracing::info!(user_id = %user.id, username = %user.username, "user registered");
            Ok(user.id)
        })
    }

    /// Check a username/password pair and return the user id.
    ///
    /// Unknown users and wrong passwords are indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Uuid> {
        let username = normalize_text(username);
        with_tx!(self, |tx| {
            match tx.user_by_username(&username).await? {
                Some(user) if user.password == password => Ok(user.id),
                _ => Err(EngineError::KeyNotFound("user not exists".to_string())),
            }
        })
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |tx| self.require_user(&mut *tx, user_id).await)
    }
}
