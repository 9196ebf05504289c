// Metric exclusion policy and value-to-kind mapping

use crate::models::{MetricKind, MetricValue};

/// Substring blocklist applied to every metric key before emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFilter {
    excludes: Vec<String>,
}

impl MetricFilter {
    /// Parses a comma-separated list. Blank entries are dropped, since an empty
    /// pattern would match every key.
    pub fn from_list(list: &str) -> Self {
        let excludes = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { excludes }
    }

    /// Case-sensitive substring match, not glob or regex.
    pub fn allows(&self, key: &str) -> bool {
        !self.excludes.iter().any(|e| key.contains(e.as_str()))
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }
}

/// Maps a value to its emitted form. Numbers are gauges; booleans become
/// `"true"`/`"false"` attributes; empty strings carry no information and are
/// dropped.
pub fn emission(value: MetricValue) -> Option<(MetricValue, MetricKind)> {
    match value {
        v if v.is_numeric() => Some((v, MetricKind::Gauge)),
        MetricValue::Bool(b) => Some((MetricValue::Text(b.to_string()), MetricKind::Attribute)),
        MetricValue::Text(s) if s.is_empty() => None,
        v => Some((v, MetricKind::Attribute)),
    }
}
