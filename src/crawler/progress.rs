use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Stage of a crawl run, as reported to progress listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressPhase {
    Sitemap,
    StrategicLinks,
    CategoryTraversal,
    DynamicDiscovery,
    Exhaustive,
    Finished,
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sitemap => "sitemap",
            Self::StrategicLinks => "strategic-links",
            Self::CategoryTraversal => "category-traversal",
            Self::DynamicDiscovery => "dynamic-discovery",
            Self::Exhaustive => "exhaustive",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// A progress notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub message: String,
    /// Share of the page budget spent, 0 to 100
    pub percentage: f64,
}

impl ProgressEvent {
    pub fn new(
        phase: ProgressPhase,
        message: impl Into<String>,
        visited: usize,
        budget: usize,
    ) -> Self {
        let percentage = if budget == 0 {
            100.0
        } else {
            (visited as f64 / budget as f64 * 100.0).min(100.0)
        };
        Self {
            phase,
            message: message.into(),
            percentage,
        }
    }
}

/// Listener invoked synchronously by the coordinator
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
