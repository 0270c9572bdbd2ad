use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the person performing a mutating operation.
///
/// Every engine call takes an explicit `Actor`; there is no ambient
/// current-user state. Audit stamps and snapshot attribution all flow from
/// the actor the caller passes in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor(String);

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
