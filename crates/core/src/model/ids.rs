use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier as issued by the server.
///
/// Servers hand out either integer or string ids. Both are kept in their
/// original shape so they serialize back exactly as received.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(u64),
    Text(String),
}

impl RemoteId {
    /// Returns the numeric value if the id was issued as a number.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        match self {
            RemoteId::Number(n) => Some(*n),
            RemoteId::Text(_) => None,
        }
    }
}

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RemoteId);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<RemoteId>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying opaque id
            #[must_use]
            pub fn value(&self) -> &RemoteId {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(RemoteId::Number(id))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(RemoteId::Text(id.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(RemoteId::Text(id))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

remote_id!(
    /// Server-issued identifier of an assessment session
    SessionId
);
remote_id!(
    /// Identifier of a single assessment question
    QuestionId
);
remote_id!(
    /// Server-issued identifier of a story
    StoryId
);

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        RemoteId::Number(id)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        RemoteId::Text(id.to_owned())
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        RemoteId::Text(id)
    }
}

impl fmt::Debug for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Number(n) => write!(f, "{n}"),
            RemoteId::Text(s) => write!(f, "{s:?}"),
        }
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Number(n) => write!(f, "{n}"),
            RemoteId::Text(s) => f.write_str(s),
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
