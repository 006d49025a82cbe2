//! Account identity
//!
//! Every ledger row, order and webhook note is keyed by the Supabase user
//! UUID carried in the access token's `sub` claim.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ParseError;

/// Supabase user ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Fresh random ID, for tests and seeding
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a `sub` claim or a `user_id` note.
    ///
    /// Surrounding whitespace is ignored. The nil UUID is refused; no
    /// Supabase account carries it.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match Uuid::parse_str(s.trim()) {
            Ok(id) if !id.is_nil() => Ok(Self(id)),
            _ => Err(ParseError::UserId(s.to_string())),
        }
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for UserId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
