//! Latency scatter plot, one line per target.

use chrono::DateTime;
use serde::Serialize;

use super::{ChartConfig, ChartData, Dataset, Datasets, Widget};
use crate::api::{LatencyMap, LatencySample, LATENCY_ENDPOINT};

/// Border colors handed out to new targets, in order.
pub const LINE_PALETTE: [&str; 8] = [
    "rgb(255, 99, 132)",
    "rgb(255, 159, 64)",
    "rgb(255, 205, 86)",
    "rgb(75, 192, 192)",
    "rgb(54, 162, 235)",
    "rgb(153, 102, 255)",
    "rgb(179, 157, 207)",
    "rgb(201, 203, 207)",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterDataset {
    pub label: String,
    pub data: Vec<LatencySample>,
    pub show_line: bool,
    pub border_color: &'static str,
}

impl Dataset for ScatterDataset {
    type Data = Vec<LatencySample>;

    fn label(&self) -> &str {
        &self.label
    }

    fn set_data(&mut self, data: Self::Data) {
        self.data = data;
    }
}

/// Most recent sample of a target, formatted like the chart axes.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRow {
    pub label: String,
    pub time: String,
    pub latency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyChart {
    #[serde(flatten)]
    config: ChartConfig<Datasets<ScatterDataset>>,
    #[serde(skip)]
    color_index: usize,
}

impl LatencyChart {
    pub fn new(evict_after: u32) -> Self {
        Self {
            config: ChartConfig {
                kind: "scatter",
                data: ChartData {
                    labels: Vec::new(),
                    datasets: Datasets::new(evict_after),
                },
                options: serde_json::json!({ "responsive": true }),
            },
            color_index: 0,
        }
    }

    pub fn datasets(&self) -> &Datasets<ScatterDataset> {
        &self.config.data.datasets
    }

    /// Latest sample of every plotted target.
    pub fn latest_rows(&self) -> Vec<LatencyRow> {
        self.datasets()
            .iter()
            .filter_map(|d| {
                d.data.last().map(|s| LatencyRow {
                    label: d.label.clone(),
                    time: format_time_tick(s.x),
                    latency: format_latency_tick(s.y),
                })
            })
            .collect()
    }
}

impl Widget for LatencyChart {
    type Payload = LatencyMap;

    const ELEMENT_ID: &'static str = "latency-chart";
    const ENDPOINT: &'static str = LATENCY_ENDPOINT;

    fn apply(&mut self, payload: LatencyMap) {
        let color_index = &mut self.color_index;
        self.config.data.datasets.update(payload, |label, data| {
            let border_color = LINE_PALETTE[*color_index % LINE_PALETTE.len()];
            *color_index += 1;
            ScatterDataset {
                label: label.to_string(),
                data,
                show_line: true,
                border_color,
            }
        });
    }
}

/// X axis label: UTC time of day with its leading character dropped
/// (00:16:40 renders as "0:16:40").
pub fn format_time_tick(unix_secs: i64) -> String {
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(time) => {
            let full = time.format("%H:%M:%S").to_string();
            full[1..].to_string()
        }
        None => unix_secs.to_string(),
    }
}

/// Y axis label: milliseconds shown as seconds.
pub fn format_latency_tick(millis: f64) -> String {
    format!("{} s", millis / 1000.0)
}
