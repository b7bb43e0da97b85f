//! Destinations for finished spans.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::trace::context::TraceId;
use crate::trace::span::SpanData;

/// Receives every span once it is closed.
pub trait SpanSink: Send + Sync {
    fn export(&self, span: SpanData);
}

/// Emits one structured log event per finished span.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SpanSink for LogSink {
    fn export(&self, span: SpanData) {
        let duration_ms = span
            .duration()
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default();
        let parent = span
            .parent_span_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let attributes = span
            .attributes
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        if span.status.is_error() {
            tracing::error!(
                target: "tracelink::span",
                trace_id = %span.trace_id,
                span_id = %span.span_id,
                parent_span_id = %parent,
                name = %span.name,
                status = %span.status,
                duration_ms,
                events = span.events.len(),
                attributes = %attributes,
                "span finished"
            );
        } else {
            tracing::info!(
                target: "tracelink::span",
                trace_id = %span.trace_id,
                span_id = %span.span_id,
                parent_span_id = %parent,
                name = %span.name,
                status = %span.status,
                duration_ms,
                events = span.events.len(),
                attributes = %attributes,
                "span finished"
            );
        }
    }
}

/// In-process collector. Keeps spans in finish order.
#[derive(Debug, Default)]
pub struct MemorySink {
    spans: Mutex<Vec<SpanData>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SpanData>> {
        self.spans.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.lock().clone()
    }

    /// All spans of one trace, in finish order.
    pub fn trace(&self, trace_id: TraceId) -> Vec<SpanData> {
        self.lock()
            .iter()
            .filter(|s| s.trace_id == trace_id)
            .cloned()
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<SpanData> {
        self.lock().iter().find(|s| s.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl SpanSink for MemorySink {
    fn export(&self, span: SpanData) {
        self.lock().push(span);
    }
}

/// Forwards each span to every inner sink.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn SpanSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn SpanSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl SpanSink for FanoutSink {
    fn export(&self, span: SpanData) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.export(span.clone());
            }
            last.export(span);
        }
    }
}
