//! Newtype identifiers used across the host.
//!
//! Host-generated identities (editors, tabs, subscriptions) wrap a
//! [`uuid::Uuid`]. Identities chosen by someone else (node ids assigned by
//! the connection layer, plugin ids, correlation tokens picked by a sender)
//! are opaque strings. Distinct types keep a `TabId` from being passed where
//! an `EditorId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a newtype ID wrapper around `Uuid`.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner UUID value.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

/// Macro to define an opaque string identifier.
macro_rules! define_name_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier, returning the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_uuid_id!(
    /// Identifier of an editor instance created by the host.
    EditorId
);
define_uuid_id!(
    /// Identifier of a tab inside an editor.
    TabId
);
define_uuid_id!(
    /// Identifier of an observer or listener registration.
    SubscriptionId
);

define_name_id!(
    /// Identifier of a participant on the message bus: the host itself or a
    /// connected remote node.
    ///
    /// Unique only while the node is mounted; the connection layer may hand
    /// the same id to a different physical node after an unmount.
    NodeId
);
define_name_id!(
    /// Identifier of a loaded plugin.
    PluginId
);
define_name_id!(
    /// Correlation token chosen by a message sender.
    Token
);

/// Reserved node id under which host-side plugins send and receive.
pub const HOST_NODE_ID: &str = "host";

impl NodeId {
    /// The host's own endpoint id.
    pub fn host() -> Self {
        Self::new(HOST_NODE_ID)
    }

    /// Whether this id names the host endpoint.
    pub fn is_host(&self) -> bool {
        self.0 == HOST_NODE_ID
    }
}
