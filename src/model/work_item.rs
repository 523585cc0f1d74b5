use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: u32,
    /// Work item type as reported by the tracker, e.g. "User Story" or "Bug".
    pub item_type: String,
    pub title: String,
    /// Plain-text acceptance criteria. Empty when the tracker had none.
    #[serde(default)]
    pub acceptance_criteria: String,
}

impl WorkItem {
    pub fn has_criteria(&self) -> bool {
        !self.acceptance_criteria.trim().is_empty()
    }
}
