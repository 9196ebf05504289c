// Metric sink: event sets collected during a pass and published as one JSON document

use crate::filter::{MetricFilter, emission};
use crate::models::{MetricKind, MetricRecord, MetricValue};
use crate::version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

/// Event type of the diagnostic record written when a listing call fails.
pub const ERROR_EVENT: &str = "dockerIntegrationError";

/// Opaque reference to an event set opened on a [`MetricSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventSetHandle(usize);

impl EventSetHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Receives metrics; must accept writes from several tasks at once.
/// There is no rollback: whatever was emitted before a failure stays.
pub trait MetricSink: Send + Sync {
    fn begin_event_set(&self, event_type: &str) -> EventSetHandle;
    fn emit(&self, set: EventSetHandle, key: &str, value: MetricValue, kind: MetricKind);
}

/// Entity the published metrics are attached to when not merged into the local host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSet {
    pub event_type: String,
    pub metrics: BTreeMap<String, (MetricValue, MetricKind)>,
}

impl EventSet {
    pub fn value(&self, key: &str) -> Option<&MetricValue> {
        self.metrics.get(key).map(|(v, _)| v)
    }

    pub fn kind(&self, key: &str) -> Option<MetricKind> {
        self.metrics.get(key).map(|(_, k)| *k)
    }

    fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("event_type".into(), self.event_type.clone().into());
        for (k, (v, _)) in &self.metrics {
            let v = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
            obj.insert(k.clone(), v);
        }
        serde_json::Value::Object(obj)
    }
}

/// In-memory sink. Event sets accumulate until [`IntegrationSink::publish`].
#[derive(Debug, Default)]
pub struct IntegrationSink {
    entity: Option<Entity>,
    sets: Mutex<Vec<EventSet>>,
}

impl IntegrationSink {
    /// `entity = None` merges metrics into the local host entity.
    pub fn new(entity: Option<Entity>) -> Self {
        Self {
            entity,
            sets: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EventSet>> {
        // A panicking writer leaves the vector consistent; keep going.
        self.sets.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn event_sets(&self) -> Vec<EventSet> {
        self.lock().clone()
    }

    pub fn event_sets_of(&self, event_type: &str) -> Vec<EventSet> {
        self.lock()
            .iter()
            .filter(|s| s.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Removes and returns everything collected so far.
    pub fn take(&self) -> Vec<EventSet> {
        std::mem::take(&mut *self.lock())
    }

    pub fn payload(&self, sets: &[EventSet]) -> serde_json::Value {
        let mut data = serde_json::Map::new();
        if let Some(entity) = &self.entity {
            data.insert(
                "entity".into(),
                serde_json::to_value(entity).unwrap_or(serde_json::Value::Null),
            );
        }
        data.insert(
            "metrics".into(),
            serde_json::Value::Array(sets.iter().map(EventSet::to_json).collect()),
        );
        serde_json::json!({
            "name": version::INTEGRATION_NAME,
            "protocol_version": "3",
            "integration_version": version::VERSION,
            "data": [serde_json::Value::Object(data)],
        })
    }

    /// Drains collected event sets and writes them as one JSON line.
    pub fn publish<W: Write>(&self, mut out: W) -> anyhow::Result<usize> {
        let sets = self.take();
        serde_json::to_writer(&mut out, &self.payload(&sets))?;
        writeln!(out)?;
        out.flush()?;
        Ok(sets.len())
    }
}

impl MetricSink for IntegrationSink {
    fn begin_event_set(&self, event_type: &str) -> EventSetHandle {
        let mut sets = self.lock();
        sets.push(EventSet {
            event_type: event_type.to_string(),
            metrics: BTreeMap::new(),
        });
        EventSetHandle::new(sets.len() - 1)
    }

    fn emit(&self, set: EventSetHandle, key: &str, value: MetricValue, kind: MetricKind) {
        match self.lock().get_mut(set.index()) {
            Some(s) => {
                s.metrics.insert(key.to_string(), (value, kind));
            }
            None => tracing::warn!(
                event_set = set.index(),
                key,
                "emit to unknown event set ignored"
            ),
        }
    }
}

/// Writes metrics through the exclusion filter and the fixed kind mapping.
#[derive(Clone)]
pub struct Emitter {
    sink: Arc<dyn MetricSink>,
    filter: Arc<MetricFilter>,
}

impl Emitter {
    pub fn new(sink: Arc<dyn MetricSink>, filter: MetricFilter) -> Self {
        Self {
            sink,
            filter: Arc::new(filter),
        }
    }

    /// Opens an event set; every set carries `integration_version`.
    pub fn begin(&self, event_type: &str) -> EventSetHandle {
        let set = self.sink.begin_event_set(event_type);
        self.emit(set, "integration_version", version::VERSION);
        set
    }

    pub fn emit(&self, set: EventSetHandle, key: &str, value: impl Into<MetricValue>) {
        if !self.filter.allows(key) {
            return;
        }
        if let Some((value, kind)) = emission(value.into()) {
            self.sink.emit(set, key, value, kind);
        }
    }

    pub fn emit_record(&self, event_type: &str, record: &MetricRecord) -> EventSetHandle {
        let set = self.begin(event_type);
        for (key, value) in record.iter() {
            self.emit(set, key, value);
        }
        set
    }

    /// Reports a failed listing call as a diagnostic event.
    pub fn report_error(&self, error: &dyn Display, hostname: &str) {
        let set = self.begin(ERROR_EVENT);
        self.emit(set, "errorMsg", error.to_string());
        self.emit(set, "hostname", hostname);
    }
}
