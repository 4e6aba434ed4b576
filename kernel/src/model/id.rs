use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared::error::AppError;

macro_rules! define_id {
    ($id_type: ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $id_type(uuid::Uuid);

        impl $id_type {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            pub fn raw(self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $id_type {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $id_type {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $id_type {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }

        impl std::fmt::Display for $id_type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

define_id!(UserId);
define_id!(BookId);
define_id!(GrantId);
define_id!(OrderItemId);
define_id!(SubscriptionId);
define_id!(SubscriptionPlanId);
define_id!(TermsAcceptanceId);
