//! Strongly typed identifiers for upstream entities.
//!
//! The upstream source reports identifiers either as JSON integers or as
//! numeric strings (`"5"`). Both decode into the same newtype, and every id
//! serializes back as a plain integer so cached payloads stay canonical.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an identifier is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier '{0}'")]
pub struct InvalidId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

fn parse_raw(raw: &str) -> Result<i64, InvalidId> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| InvalidId(raw.to_string()))
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                debug_assert!(id >= 0, "identifiers should be non-negative");
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self::new(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_raw(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                match RawId::deserialize(deserializer)? {
                    RawId::Number(id) if id >= 0 => Ok(Self(id)),
                    RawId::Number(id) => Err(serde::de::Error::custom(InvalidId(id.to_string()))),
                    RawId::Text(text) => {
                        parse_raw(&text).map(Self).map_err(serde::de::Error::custom)
                    }
                }
            }
        }
    };
}

entity_id!(
    /// Identifier of an upstream user.
    ///
    /// ```rust
    /// use graphcache::domain::UserId;
    ///
    /// let id: UserId = "42".parse().unwrap();
    /// assert_eq!(id.value(), 42);
    /// assert_eq!(id.to_string(), "42");
    /// ```
    UserId
);
entity_id!(
    /// Identifier of an upstream todo.
    TodoId
);
entity_id!(
    /// Identifier of an upstream post.
    PostId
);
entity_id!(
    /// Identifier of an upstream comment.
    CommentId
);
