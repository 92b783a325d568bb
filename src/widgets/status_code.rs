//! HTTP status code breakdown across all targets.

use serde::Serialize;

use super::{ChartConfig, ChartData, Widget};
use crate::api::{StatusCodeMap, HTTP_STATUS_ENDPOINT};

pub const CLASS_LABELS: [&str; 4] = ["2xx", "4xx", "5xx", "Other"];

const CLASS_COLORS: [&str; 4] = [
    "rgb(54, 162, 235)",
    "rgb(255, 205, 86)",
    "rgb(255, 99, 132)",
    "rgb(255, 159, 64)",
];

/// Occurrences per status class, in [`CLASS_LABELS`] order.
pub type StatusCounts = [u64; 4];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughnutDataset {
    pub label: &'static str,
    pub data: StatusCounts,
    pub background_color: [&'static str; 4],
    pub hover_offset: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCodeChart {
    #[serde(flatten)]
    config: ChartConfig<[DoughnutDataset; 1]>,
}

impl StatusCodeChart {
    pub fn new() -> Self {
        Self {
            config: ChartConfig {
                kind: "doughnut",
                data: ChartData {
                    labels: CLASS_LABELS.to_vec(),
                    datasets: [DoughnutDataset {
                        label: "HTTP Errors",
                        data: [0; 4],
                        background_color: CLASS_COLORS,
                        hover_offset: 4,
                    }],
                },
                options: serde_json::json!({ "responsive": true }),
            },
        }
    }

    pub fn counts(&self) -> StatusCounts {
        self.config.data.datasets[0].data
    }
}

impl Default for StatusCodeChart {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusCodeChart {
    type Payload = StatusCodeMap;

    const ELEMENT_ID: &'static str = "status-code-chart";
    const ENDPOINT: &'static str = HTTP_STATUS_ENDPOINT;

    fn apply(&mut self, payload: StatusCodeMap) {
        self.config.data.datasets[0].data = group_status_codes(&payload);
    }
}

/// Class index of a status code key: 2xx, 4xx, 5xx, then everything else,
/// including 3xx and keys that are not numbers.
pub fn status_class(code: &str) -> usize {
    match code.trim().parse::<f64>() {
        Ok(c) if (200.0..300.0).contains(&c) => 0,
        Ok(c) if (400.0..500.0).contains(&c) => 1,
        Ok(c) if (500.0..600.0).contains(&c) => 2,
        _ => 3,
    }
}

/// Sum the counts of every target into status classes.
pub fn group_status_codes(map: &StatusCodeMap) -> StatusCounts {
    let mut counts = [0; 4];
    for codes in map.values() {
        for (code, count) in codes {
            counts[status_class(code)] += count;
        }
    }
    counts
}
