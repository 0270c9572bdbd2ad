use serde::{Deserialize, Serialize};
use std::fmt;

/// Jurisdiction a report belongs to. The district code is the prefix used
/// when minting report numbers; the region rides along for display and
/// routing. Carried by value on the report — a district change retires the
/// record and forks a successor rather than editing in place.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct District {
    pub code: String,
    pub name: String,
    pub region: String,
}

impl District {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
