//! Wire types exchanged with the metrics backend.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Aggregate availability of one target over the queried range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub target: String,
    /// Fraction of successful checks, in [0, 1].
    #[serde(deserialize_with = "number_or_string")]
    pub availability: f64,
}

/// One latency measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Unix timestamp in seconds
    pub x: i64,
    /// Response time in milliseconds
    #[serde(deserialize_with = "number_or_string")]
    pub y: f64,
}

/// Latency samples per target, as returned by `/metrics/latency`.
pub type LatencyMap = BTreeMap<String, Vec<LatencySample>>;

/// Status code occurrence counts per target, as returned by `/metrics/httpstatus`.
pub type StatusCodeMap = BTreeMap<String, BTreeMap<String, u64>>;

/// Body returned by the target creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTargetResponse {
    pub status: String,
    pub message: String,
}

/// Accepts `0.95` as well as `"0.95"`; the backend formats numeric fields as strings.
/// Strings that are not numbers become NaN.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_accepts_string_values() {
        let records: Vec<TargetRecord> = serde_json::from_str(
            r#"[{"target":"https://a.com","availability":"0.95"},{"target":"https://b.com","availability":0.5}]"#,
        )
        .unwrap();
        assert_eq!(records[0].availability, 0.95);
        assert_eq!(records[1].availability, 0.5);
    }

    #[test]
    fn test_latency_sample_string_latency() {
        let map: LatencyMap =
            serde_json::from_str(r#"{"host1":[{"x":1000,"y":"40"},{"x":1001,"y":60.5}]}"#).unwrap();
        let samples = &map["host1"];
        assert_eq!(samples[0], LatencySample { x: 1000, y: 40.0 });
        assert_eq!(samples[1].y, 60.5);
    }

    #[test]
    fn test_garbage_latency_is_nan() {
        let sample: LatencySample = serde_json::from_str(r#"{"x":1,"y":"fast"}"#).unwrap();
        assert!(sample.y.is_nan());
    }
}
