// ============================================================
// Layer 3 - Author Domain Type
// ============================================================
// One author of a publication. An author is created the first
// time its id is seen during ingestion and the same value is
// then shared by every publication that lists the id, so the
// first organisation seen for an id is the one that sticks.

use serde::{Deserialize, Serialize};

use super::traits::Member;

/// A publication author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,

    /// Lower-cased name with spaces replaced by underscores
    pub name: String,

    /// Normalised organisation, empty when the source has none
    pub org: String,
}

impl Author {
    pub fn new(id: impl Into<String>, name: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            id:   id.into(),
            name: name.into(),
            org:  org.into(),
        }
    }
}

impl Member for Author {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
