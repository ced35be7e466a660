use serde::{Deserialize, Serialize};

/// A `Feature:` block parsed out of a Gherkin document.
///
/// `raw_content` is the block exactly as written, from the `Feature:` marker up
/// to the next marker, and is what ends up in the issue description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub raw_content: String,
    pub scenarios: Vec<Scenario>,
}

/// A `Scenario:` or `Scenario Outline:` block owned by a [`Feature`].
///
/// `raw_content` always starts with `Scenario: `, outlines included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub raw_content: String,
}

impl Feature {
    /// Number of plan slots this feature occupies: itself plus one per scenario.
    pub fn node_count(&self) -> usize {
        1 + self.scenarios.len()
    }
}
