use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one of the dashboard's visual products.
///
/// The production registry uses the three well-known names below; tests and
/// alternative deployments may register others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlotName(pub String);

impl PlotName {
    pub const NIGHT_REWARD: &'static str = "night_reward";
    pub const FOOTPRINT: &'static str = "footprint";
    pub const VISIT: &'static str = "visit";

    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn night_reward() -> Self {
        Self::new(Self::NIGHT_REWARD)
    }

    pub fn footprint() -> Self {
        Self::new(Self::FOOTPRINT)
    }

    pub fn visit() -> Self {
        Self::new(Self::VISIT)
    }

    /// The plots served by the dashboard, in page order.
    pub fn dashboard() -> [Self; 3] {
        [Self::night_reward(), Self::footprint(), Self::visit()]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlotName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlotName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifies one live plot-server document (one per client connection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
