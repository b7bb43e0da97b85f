//! Header codec for trace context.
//!
//! # Wire format
//! ```text
//! traceparent: 00-<trace-id: 32 hex>-<parent-id: 16 hex>-<flags: 2 hex>
//! baggage:     key1=value1,key2=value2   (percent-encoded)
//! ```
//!
//! Extraction is best-effort: a missing or malformed `traceparent` yields a
//! freshly minted root context, never an error.

use axum::http::{HeaderMap, HeaderValue};
use url::form_urlencoded;

use crate::trace::context::{Baggage, SpanId, TraceContext, TraceId};

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const BAGGAGE_HEADER: &str = "baggage";

const SUPPORTED_VERSION: &str = "00";
const FLAG_SAMPLED: u8 = 0x01;

/// Write `context` into a fresh header map.
///
/// `traceparent` needs a parent span id, so a context without one (a root
/// that has not started a span yet) writes baggage only, and the receiver
/// will mint its own trace. `extract(inject(c)) == c` holds for every `c`
/// with a span id, which includes every context returned by
/// `Tracer::start_span`.
pub fn inject(context: &TraceContext) -> HeaderMap {
    let mut headers = HeaderMap::new();
    inject_into(context, &mut headers);
    headers
}

/// Write `context` into an existing header map, replacing any previous values.
pub fn inject_into(context: &TraceContext, headers: &mut HeaderMap) {
    if let Some(span_id) = context.span_id {
        let flags = if context.sampled { FLAG_SAMPLED } else { 0 };
        let value = format!(
            "{}-{}-{}-{:02x}",
            SUPPORTED_VERSION, context.trace_id, span_id, flags
        );
        // Hex and dashes only, always a valid header value.
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(TRACEPARENT_HEADER, value);
        }
    } else {
        tracing::debug!(
            trace_id = %context.trace_id,
            "Context has no span id, traceparent not written"
        );
    }

    if !context.baggage.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&encode_baggage(&context.baggage)) {
            headers.insert(BAGGAGE_HEADER, value);
        }
    }
}

/// Read a context from `headers`, minting a root context when none is usable.
pub fn extract(headers: &HeaderMap) -> TraceContext {
    let baggage = headers
        .get_all(BAGGAGE_HEADER)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(decode_baggage)
        .collect::<Baggage>();

    let parent = headers
        .get(TRACEPARENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_traceparent);

    let mut context = match parent {
        Some((trace_id, span_id, sampled)) => TraceContext::remote(trace_id, span_id, sampled),
        None => {
            if headers.contains_key(TRACEPARENT_HEADER) {
                tracing::debug!("Ignoring malformed traceparent, minting new root");
            }
            TraceContext::new_root()
        }
    };
    context.baggage = baggage;
    context
}

fn parse_traceparent(value: &str) -> Option<(TraceId, SpanId, bool)> {
    let mut parts = value.trim().split('-');
    let version = parts.next()?;
    let trace_id = parts.next()?;
    let span_id = parts.next()?;
    let flags = parts.next()?;

    if version.len() != 2 || version == "ff" || !version.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    // Version 00 has exactly four fields; later versions may append more.
    if version == SUPPORTED_VERSION && parts.next().is_some() {
        return None;
    }
    if flags.len() != 2 {
        return None;
    }
    let flags = u8::from_str_radix(flags, 16).ok()?;

    Some((trace_id.parse().ok()?, span_id.parse().ok()?, flags & FLAG_SAMPLED != 0))
}

fn encode_baggage(baggage: &Baggage) -> String {
    baggage
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                form_urlencoded::byte_serialize(key.as_bytes()).collect::<String>(),
                form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>()
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_baggage(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .filter_map(|member| {
            // Member properties (`;prop`) are not carried.
            let member = member.split(';').next()?.trim();
            if !member.contains('=') {
                return None;
            }
            form_urlencoded::parse(member.as_bytes())
                .next()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .filter(|(k, _)| !k.is_empty())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> TraceContext {
        TraceContext::remote(
            "4bf92f3577b34da6a3ce929d0e0e4736".parse().unwrap(),
            "00f067aa0ba902b7".parse().unwrap(),
            true,
        )
    }

    #[test]
    fn test_inject_writes_w3c_traceparent() {
        let headers = inject(&sample_context());
        assert_eq!(
            headers.get(TRACEPARENT_HEADER).unwrap(),
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
        );
        assert!(headers.get(BAGGAGE_HEADER).is_none());
    }

    #[test]
    fn test_round_trip_preserves_context() {
        let ctx = sample_context()
            .with_baggage("tenant", "acme corp")
            .with_baggage("region", "eu-west=1,2");
        assert_eq!(extract(&inject(&ctx)), ctx);

        let mut unsampled = sample_context();
        unsampled.sampled = false;
        assert_eq!(extract(&inject(&unsampled)), unsampled);
    }

    #[test]
    fn test_missing_headers_mint_root() {
        let a = extract(&HeaderMap::new());
        let b = extract(&HeaderMap::new());
        assert!(a.is_root());
        assert!(a.sampled);
        assert_ne!(a.trace_id, b.trace_id);
        assert!(!a.trace_id.to_string().is_empty());
    }

    #[test]
    fn test_garbage_traceparent_mints_root() {
        let cases = [
            "garbage",
            "",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-zz",
        ];
        let original: TraceId = "4bf92f3577b34da6a3ce929d0e0e4736".parse().unwrap();
        for case in cases {
            let mut headers = HeaderMap::new();
            headers.insert(TRACEPARENT_HEADER, HeaderValue::from_str(case).unwrap());
            let ctx = extract(&headers);
            assert!(ctx.is_root(), "expected root for {case:?}");
            assert_ne!(ctx.trace_id, original);
        }
    }

    #[test]
    fn test_future_version_with_extra_fields_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRACEPARENT_HEADER,
            HeaderValue::from_static("01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00-what"),
        );
        let ctx = extract(&headers);
        assert_eq!(ctx.span_id, Some("00f067aa0ba902b7".parse().unwrap()));
        assert!(!ctx.sampled);
    }

    #[test]
    fn test_baggage_survives_invalid_traceparent_and_unknown_keys_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT_HEADER, HeaderValue::from_static("nope"));
        headers.insert(BAGGAGE_HEADER, HeaderValue::from_static("user=42;prop=x, bad , =v"));
        headers.insert("x-unrelated", HeaderValue::from_static("ignored"));

        let ctx = extract(&headers);
        assert!(ctx.is_root());
        assert_eq!(ctx.baggage.len(), 1);
        assert_eq!(ctx.baggage.get("user").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_root_context_injects_baggage_only() {
        let root = TraceContext::new_root().with_baggage("k", "v");
        let headers = inject(&root);
        assert!(headers.get(TRACEPARENT_HEADER).is_none());
        assert_eq!(headers.get(BAGGAGE_HEADER).unwrap(), "k=v");
    }

    #[test]
    fn test_root_context_does_not_survive_the_wire() {
        let root = TraceContext::new_root();
        let received = extract(&inject(&root));
        assert!(received.is_root());
        assert_ne!(received.trace_id, root.trace_id);

        // Once a span is open the trace id does cross.
        let child = root.child(SpanId::random());
        assert_eq!(extract(&inject(&child)), child);
    }
}
