use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum accepted length of a user or order identifier, in characters.
pub const MAX_ID_LEN: usize = 128;

fn normalize(field: &'static str, raw: &str) -> Result<String, TypeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TypeError::EmptyId { field });
    }
    if trimmed.chars().count() > MAX_ID_LEN {
        return Err(TypeError::IdTooLong {
            field,
            max: MAX_ID_LEN,
        });
    }
    Ok(trimmed.to_string())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, trimming surrounding whitespace.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, TypeError> {
                normalize($field, raw.as_ref()).map(Self)
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a user account. Non-empty after trimming.
    UserId,
    "user_id"
);

string_id!(
    /// Identifier of an order as reported by the storefront.
    OrderId,
    "order_id"
);
