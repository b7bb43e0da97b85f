//! Span recording.
//!
//! # Responsibilities
//! - Open spans as children of a [`TraceContext`]
//! - Collect attributes, events and status while the owning operation runs
//! - Close each span exactly once and hand it to the [`SpanSink`]
//!
//! # Design Decisions
//! - `Span::finish` consumes the span, so a closed span cannot be mutated
//! - A span dropped before `finish` (early return, cancelled future) is
//!   closed by `Drop` with an error status
//! - Status only moves forward: `Unset < Ok < Error`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::trace::context::{SpanId, TraceContext, TraceId};
use crate::trace::sink::SpanSink;

/// Status recorded when a span is closed by `Drop` instead of `finish`.
pub const DROPPED_DETAIL: &str = "span dropped before finish";

/// A single attribute or event field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<&String> for AttributeValue {
    fn from(v: &String) -> Self {
        AttributeValue::String(v.clone())
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<u16> for AttributeValue {
    fn from(v: u16) -> Self {
        AttributeValue::Int(i64::from(v))
    }
}

impl From<usize> for AttributeValue {
    fn from(v: usize) -> Self {
        AttributeValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// A timestamped annotation on a span.
#[derive(Debug, Clone)]
pub struct SpanEvent {
    pub name: String,
    pub at: Instant,
    pub fields: Attributes,
}

/// Outcome of a span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error(String),
}

impl SpanStatus {
    fn rank(&self) -> u8 {
        match self {
            SpanStatus::Unset => 0,
            SpanStatus::Ok => 1,
            SpanStatus::Error(_) => 2,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SpanStatus::Error(_))
    }
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanStatus::Unset => write!(f, "UNSET"),
            SpanStatus::Ok => write!(f, "OK"),
            SpanStatus::Error(detail) => write!(f, "ERROR: {}", detail),
        }
    }
}

/// Recorded state of a span. Handed to the sink once the span is closed.
#[derive(Debug, Clone)]
pub struct SpanData {
    pub name: String,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub sampled: bool,
    pub start: Instant,
    pub end: Option<Instant>,
    pub attributes: Attributes,
    pub events: Vec<SpanEvent>,
    pub status: SpanStatus,
}

impl SpanData {
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end.saturating_duration_since(self.start))
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Handle used to open spans. Cheap to clone; one per process.
#[derive(Clone)]
pub struct Tracer {
    service: Arc<str>,
    sink: Arc<dyn SpanSink>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("service", &self.service).finish()
    }
}

impl Tracer {
    pub fn new(service: impl Into<String>, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            service: Arc::from(service.into()),
            sink,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Open a span under `parent` and return it with the context of the new span.
    pub fn start_span(&self, name: impl Into<String>, parent: &TraceContext) -> (Span, TraceContext) {
        let span_id = SpanId::random();
        let mut attributes = Attributes::new();
        attributes.insert("service.name".to_string(), self.service.as_ref().into());

        let data = SpanData {
            name: name.into(),
            trace_id: parent.trace_id,
            span_id,
            parent_span_id: parent.span_id,
            sampled: parent.sampled,
            start: Instant::now(),
            end: None,
            attributes,
            events: Vec::new(),
            status: SpanStatus::Unset,
        };

        let span = Span {
            data: Some(data),
            sink: self.sink.clone(),
        };
        (span, parent.child(span_id))
    }
}

/// An open span. Mutated only by the operation that owns it.
pub struct Span {
    data: Option<SpanData>,
    sink: Arc<dyn SpanSink>,
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span").field("data", &self.data).finish()
    }
}

impl Span {
    fn data_mut(&mut self) -> Option<&mut SpanData> {
        self.data.as_mut()
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.data.as_ref().map(|d| d.trace_id)
    }

    pub fn span_id(&self) -> Option<SpanId> {
        self.data.as_ref().map(|d| d.span_id)
    }

    pub fn status(&self) -> SpanStatus {
        self.data.as_ref().map(|d| d.status.clone()).unwrap_or_default()
    }

    /// Last write wins per key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        if let Some(data) = self.data_mut() {
            data.attributes.insert(key.into(), value.into());
        }
    }

    pub fn add_event<I, K, V>(&mut self, name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        if let Some(data) = self.data_mut() {
            data.events.push(SpanEvent {
                name: name.into(),
                at: Instant::now(),
                fields: fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            });
        }
    }

    /// Move the status forward. Attempts to move it backwards are ignored.
    pub fn set_status(&mut self, status: SpanStatus) {
        if let Some(data) = self.data_mut() {
            if status.rank() >= data.status.rank() && !data.status.is_error() {
                data.status = status;
            }
        }
    }

    /// Mark the span failed and attach the error as an `exception` event.
    pub fn record_error<E>(&mut self, error: &E)
    where
        E: std::error::Error + ?Sized,
    {
        let kind = short_type_name(std::any::type_name::<E>());
        let message = error.to_string();
        self.add_event(
            "exception",
            [
                ("exception.type", AttributeValue::from(kind)),
                ("exception.message", AttributeValue::from(message.as_str())),
            ],
        );
        self.set_status(SpanStatus::Error(message));
    }

    /// Close the span and export it.
    pub fn finish(mut self) {
        if let Some(data) = self.data.take() {
            close(&self.sink, data);
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if let Some(mut data) = self.data.take() {
            if !data.status.is_error() {
                data.status = SpanStatus::Error(DROPPED_DETAIL.to_string());
            }
            data.events.push(SpanEvent {
                name: "cancelled".to_string(),
                at: Instant::now(),
                fields: Attributes::new(),
            });
            close(&self.sink, data);
        }
    }
}

fn close(sink: &Arc<dyn SpanSink>, mut data: SpanData) {
    data.end = Some(Instant::now());
    if data.sampled {
        sink.export(data);
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
