// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! String newtypes for store-scoped identifiers.
//!
//! Executor ids, job names, and namespaces are operator-assigned node
//! names in the coordination store, so there is no random generation —
//! only cheap, clone-friendly wrappers with a uniform string surface.

use smol_str::SmolStr;

/// Prefix marking an executor id as a container resource.
pub const CONTAINER_PREFIX: char = '@';

/// Define a newtype wrapper around [`SmolStr`] for a store identifier.
///
/// Generates `new()`, `as_str()`, `Display`, `From<&str>`, `From<String>`,
/// `Borrow<str>`, `Deref`, and `PartialEq<str>` implementations.
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(SmolStr::new(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

string_id! {
    /// Tenant-scoped root under which all jobs, executors, and
    /// coordination nodes live.
    pub struct Namespace;
}

string_id! {
    /// Identifier of a worker process that runs assigned shards.
    pub struct ExecutorId;
}

string_id! {
    /// Name of a configured job with `N` shards.
    pub struct JobName;
}

impl ExecutorId {
    /// Whether this executor id names a container resource (`@`-prefixed).
    pub fn is_container(&self) -> bool {
        self.as_str().starts_with(CONTAINER_PREFIX)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
