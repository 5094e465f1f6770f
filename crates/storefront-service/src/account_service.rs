//! Account service: user profiles.

use crate::repository::UserRepository;
use async_trait::async_trait;
use std::sync::Arc;
use storefront_cache::{ChangeEvent, KeyParams, StorefrontCache, UserProfileParams};
use storefront_core::{Interface, ProfileUpdate, StorefrontError, StorefrontResult, UserId, UserProfile};
use tracing::{debug, info};

/// Account service trait.
#[async_trait]
pub trait AccountService: Interface + Send + Sync {
    /// Gets a user's profile.
    async fn profile(&self, user_id: UserId) -> StorefrontResult<UserProfile>;

    /// Applies a profile update.
    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> StorefrontResult<UserProfile>;
}

/// Account service over the user repository and the shared cache.
pub struct AccountServiceImpl {
    users: Arc<dyn UserRepository>,
    cache: StorefrontCache,
}

impl AccountServiceImpl {
    /// Creates a new account service.
    pub fn new(users: Arc<dyn UserRepository>, cache: StorefrontCache) -> Self {
        Self { users, cache }
    }
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    async fn profile(&self, user_id: UserId) -> StorefrontResult<UserProfile> {
        debug!("Getting profile: {}", user_id);

        self.cache
            .get_or_load(&KeyParams::UserProfile(UserProfileParams { user_id }), || async {
                self.users
                    .find_profile(user_id)
                    .await?
                    .ok_or_else(|| StorefrontError::not_found("User", user_id))
            })
            .await
    }

    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> StorefrontResult<UserProfile> {
        if update.display_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(StorefrontError::validation("Display name must not be empty"));
        }

        let mut profile = self
            .users
            .find_profile(user_id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("User", user_id))?;
        profile.apply(update);

        let saved = self.users.update_profile(&profile).await?;
        self.cache.invalidate(&ChangeEvent::UserChanged { user_id }).await;

        info!("Profile updated: {}", user_id);
        Ok(saved)
    }
}

impl std::fmt::Debug for AccountServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountServiceImpl").finish_non_exhaustive()
    }
}
