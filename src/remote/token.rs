use std::fmt;

use serde::{Deserialize, Serialize};

use super::{RecordSource, SourceKind};

/// Opaque remote modification marker used for optimistic conflict checks.
///
/// Two tokens compare equal only if the remote record was not modified in
/// between. Empty tokens do not exist: [`ConcurrencyToken::parse`] maps them
/// to `None`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcurrencyToken(String);

impl ConcurrencyToken {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    /// Current token of a record: the update time of the direct-edit source
    /// if present, else of the first source.
    pub fn current(sources: &[RecordSource]) -> Option<Self> {
        sources
            .iter()
            .find(|s| s.kind == SourceKind::Contact)
            .or_else(|| sources.first())
            .and_then(|s| Self::parse(&s.update_time))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
