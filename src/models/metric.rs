// Tagged metric values and the flat per-event record

use serde::Serialize;
use std::collections::BTreeMap;

/// How a value is reported downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Attribute,
}

/// A metric value; the producer picks the variant when it builds the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl MetricValue {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            MetricValue::Int(_) | MetricValue::Uint(_) | MetricValue::Float(_)
        )
    }
}

macro_rules! metric_value_from {
    ($variant:ident, $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for MetricValue {
                fn from(v: $source) -> Self {
                    MetricValue::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

metric_value_from!(Int, i64: i16, i32, i64);
metric_value_from!(Uint, u64: u16, u32, u64);
metric_value_from!(Float, f64: f32, f64);
metric_value_from!(Bool, bool: bool);
metric_value_from!(Text, String: String, &str);

/// Flat metric mapping for one event.
///
/// Metric keys set through [`MetricRecord::set`] always take precedence over
/// label keys merged through [`MetricRecord::merge_labels`]. Between label
/// sources, the source merged last wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    metrics: BTreeMap<String, MetricValue>,
    labels: BTreeMap<String, String>,
}

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        self.metrics.insert(key.into(), value.into());
    }

    /// Sets `key` only when `value` is present.
    pub fn set_opt<V: Into<MetricValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }

    pub fn merge_labels<'a, I>(&mut self, labels: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in labels {
            self.labels.insert(k.clone(), v.clone());
        }
    }

    /// Effective value for `key` after precedence is applied.
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.metrics
            .get(key)
            .cloned()
            .or_else(|| self.labels.get(key).map(|v| MetricValue::Text(v.clone())))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.metrics.contains_key(key) || self.labels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.labels.is_empty()
    }

    /// Metric entries first, then label entries not shadowed by a metric key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricValue)> + '_ {
        self.metrics
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .chain(
                self.labels
                    .iter()
                    .filter(|(k, _)| !self.metrics.contains_key(k.as_str()))
                    .map(|(k, v)| (k.as_str(), MetricValue::Text(v.clone()))),
            )
    }
}
