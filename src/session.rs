//! The signed-in user and their credentials.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::*;
use crate::store::EventStore;

/// Authentication state shared by everything built on one gateway.
///
/// Logging out clears the token and user and resets the event store, so no
/// cached data outlives the account that fetched it.
pub struct Session<G> {
    gateway: Arc<G>,
    store: Arc<EventStore<G>>,
    user: RwLock<Option<User>>,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: Arc<G>, store: Arc<EventStore<G>>) -> Self {
        Self {
            gateway,
            store,
            user: RwLock::new(None),
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Create an account. Does not sign in.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.gateway.register(request).await
    }

    /// Exchange credentials for a token, then load the profile.
    ///
    /// If loading the profile fails the token is dropped again.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login_identifier: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            login_identifier: login_identifier.to_string(),
            password: password.to_string(),
        };
        let token = self.gateway.login(&request).await?;
        self.gateway.set_token(Some(token.access_token));

        match self.gateway.me().await {
            Ok(user) => {
                debug!(user_id = %user.id, role = %user.role, "signed in");
                *self.user.write().await = Some(user.clone());
                Ok(user)
            }
            Err(err) => {
                self.gateway.set_token(None);
                Err(err)
            }
        }
    }

    /// Sign in with a token obtained earlier.
    pub async fn resume(&self, access_token: String) -> Result<User> {
        self.gateway.set_token(Some(access_token));
        match self.refresh_me().await {
            Ok(user) => Ok(user),
            Err(err) => {
                self.gateway.set_token(None);
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn refresh_me(&self) -> Result<User> {
        let user = self.gateway.me().await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let user = self.gateway.update_me(update).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.gateway
            .update_password(&PasswordUpdate {
                old_password: old_password.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn upload_avatar(&self, file: Upload) -> Result<User> {
        let user = self.gateway.upload_avatar(file).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    pub async fn logout(&self) {
        self.gateway.set_token(None);
        *self.user.write().await = None;
        self.store.reset().await;
        debug!("signed out");
    }
}
