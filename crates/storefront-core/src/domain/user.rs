//! User profile entity.

use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The public profile of a storefront customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub shipping_address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub shipping_address: Option<String>,
}

impl UserProfile {
    /// Applies an update, bumping `updated_at`.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if update.shipping_address.is_some() {
            self.shipping_address = update.shipping_address;
        }
        self.updated_at = Utc::now();
    }
}
