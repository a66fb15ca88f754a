//! Maps provider identities to local users.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    error::StoreError,
    oauth::ProviderUser,
    storage::{CredentialStore, NewUser},
    utils::valid_email,
};

pub struct UserDirectory {
    store: Arc<dyn CredentialStore>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Local id for the provider user, creating the user on first login.
    ///
    /// Matching is by email only. Existing users keep their stored name and picture.
    ///
    /// # Errors
    /// `StoreError::Invalid` if the provider sent no usable email; any store error other
    /// than `NotFound` on lookup is returned as is.
    pub async fn resolve_or_create(&self, profile: &ProviderUser) -> Result<Uuid, StoreError> {
        let email = profile.email.trim();
        if !valid_email(email) {
            return Err(StoreError::Invalid(
                "provider profile has no valid email".to_string(),
            ));
        }

        match self.store.find_user_by_email(email).await {
            Ok(user) => {
                debug!("existing user signed in: {}", user.id);
                Ok(user.id)
            }
            Err(StoreError::NotFound) => {
                let id = self
                    .store
                    .create_user(&NewUser {
                        name: profile.name.clone(),
                        email: email.to_string(),
                        picture: profile.picture.clone(),
                    })
                    .await?;
                info!("created user {id}");
                Ok(id)
            }
            Err(err) => Err(err),
        }
    }
}
