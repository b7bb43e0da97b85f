//! Trace identifiers and the immutable context carried across hops.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Baggage entries, propagated verbatim and never interpreted.
pub type Baggage = BTreeMap<String, String>;

/// Error returned when an identifier cannot be parsed from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("expected {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("identifier contains non-hex characters")]
    NotHex,
    #[error("all-zero identifier is invalid")]
    Zero,
}

/// 128-bit trace identifier shared by every span of one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceId(u128);

impl TraceId {
    /// Mint a random, non-zero trace id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id: u128 = rng.gen();
            if id != 0 {
                return Self(id);
            }
        }
    }

    pub fn from_u128(id: u128) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for TraceId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_hex(s, 32)?;
        Self::from_u128(value).ok_or(IdParseError::Zero)
    }
}

/// 64-bit span identifier, unique within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(u64);

impl SpanId {
    /// Mint a random, non-zero span id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id: u64 = rng.gen();
            if id != 0 {
                return Self(id);
            }
        }
    }

    pub fn from_u64(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for SpanId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_hex(s, 16)?;
        let value = u64::try_from(value).map_err(|_| IdParseError::NotHex)?;
        Self::from_u64(value).ok_or(IdParseError::Zero)
    }
}

macro_rules! impl_hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_hex_serde!(TraceId);
impl_hex_serde!(SpanId);

/// Lowercase hex of an exact width. Uppercase is rejected, as W3C requires.
fn parse_hex(s: &str, width: usize) -> Result<u128, IdParseError> {
    if s.len() != width {
        return Err(IdParseError::Length {
            expected: width,
            actual: s.len(),
        });
    }
    if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(IdParseError::NotHex);
    }
    u128::from_str_radix(s, 16).map_err(|_| IdParseError::NotHex)
}

/// Context propagated across a hop.
///
/// A context minted at the edge of a trace has no span id yet: the first span
/// opened from it becomes the root of the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: Option<SpanId>,
    pub sampled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub baggage: Baggage,
}

impl TraceContext {
    /// A new root context: fresh trace id, no parent span, sampled.
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: None,
            sampled: true,
            baggage: Baggage::new(),
        }
    }

    /// Context continuing a remote parent.
    pub fn remote(trace_id: TraceId, span_id: SpanId, sampled: bool) -> Self {
        Self {
            trace_id,
            span_id: Some(span_id),
            sampled,
            baggage: Baggage::new(),
        }
    }

    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }

    /// Same trace, new current span.
    pub(crate) fn child(&self, span_id: SpanId) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: Some(span_id),
            sampled: self.sampled,
            baggage: self.baggage.clone(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.span_id.is_none()
    }
}
