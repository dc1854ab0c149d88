//! Type-safe wrappers for identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::SCHEME_ID_PREFIX;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique key of an identity provider (e.g. `"acme-keycloak"`).
    ProviderKey
);

string_id!(
    /// Internal tenant user identifier allocated by provisioning.
    UserId
);

string_id!(
    /// Identifier of a federated identity row.
    IdentityId
);

impl ProviderKey {
    /// Deterministic validator scheme id for this provider (`oidc-{key}`).
    pub fn scheme_id(&self) -> String {
        format!("{}{}", SCHEME_ID_PREFIX, self.0)
    }

    /// Reverse of [`ProviderKey::scheme_id`]. Returns `None` for foreign scheme ids.
    pub fn from_scheme_id(scheme_id: &str) -> Option<Self> {
        scheme_id
            .strip_prefix(SCHEME_ID_PREFIX)
            .filter(|key| !key.is_empty())
            .map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_id_round_trip() {
        let key = ProviderKey::new("acme");
        assert_eq!(key.scheme_id(), "oidc-acme");
        assert_eq!(ProviderKey::from_scheme_id("oidc-acme"), Some(key));
    }

    #[test]
    fn test_foreign_scheme_id() {
        assert_eq!(ProviderKey::from_scheme_id("cookie"), None);
        assert_eq!(ProviderKey::from_scheme_id("oidc-"), None);
    }
}
