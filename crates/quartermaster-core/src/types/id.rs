//! Newtype wrappers for all backend entity identifiers.
//!
//! The backend assigns integer primary keys, while some endpoints echo them
//! back as strings. Identifiers therefore deserialize from either a JSON
//! number or a non-empty string and are held as strings. Distinct types
//! prevent passing an `ItemId` where a `RequestId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Raw wire form of an identifier.
#[doc(hidden)]
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> Result<String, String> {
        match self {
            Self::Number(n) => Ok(n.to_string()),
            Self::Text(s) if s.trim().is_empty() => Err("identifier must not be empty".to_string()),
            Self::Text(s) => Ok(s),
        }
    }
}

/// Macro to define a newtype ID wrapper around a backend key.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "RawId", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create an identifier, rejecting empty input.
            pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(AppError::validation(concat!(
                        stringify!($name),
                        " must not be empty"
                    )));
                }
                Ok(Self(value))
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value.to_string())
            }
        }

        impl TryFrom<RawId> for $name {
            type Error = String;

            fn try_from(raw: RawId) -> Result<Self, Self::Error> {
                raw.into_string().map(Self)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a backend user.
    UserId
);

define_id!(
    /// Identifier of a new-item or repair request.
    RequestId
);

define_id!(
    /// Identifier of a stock item.
    ItemId
);

define_id!(
    /// Server-assigned identifier of a notification; the deduplication key.
    NotificationId
);

define_id!(
    /// Identifier of an issued-item assignment record.
    IssuedItemId
);

define_id!(
    /// Identifier of a damaged-item record.
    DamagedItemId
);
