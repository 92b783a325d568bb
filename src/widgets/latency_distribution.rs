//! Latency histogram over fixed bands, one bar group per target.

use serde::Serialize;

use super::{ChartConfig, ChartData, Dataset, Datasets, Widget};
use crate::api::{LatencyMap, LatencySample, LATENCY_ENDPOINT};

/// Exclusive upper bounds of the first ten bands, in milliseconds.
/// Anything at or above the last bound lands in the eleventh band.
pub const BAND_UPPER_BOUNDS_MS: [f64; 10] =
    [50.0, 100.0, 200.0, 300.0, 500.0, 700.0, 1000.0, 2000.0, 3000.0, 5000.0];

pub const BAND_COUNT: usize = BAND_UPPER_BOUNDS_MS.len() + 1;

pub const BAND_LABELS: [&str; BAND_COUNT] = [
    "<50ms", "50-100ms", "100-200ms", "200-300ms", "300-500ms", "500-700ms", "0.7-1s", "1-2s",
    "2-3s", "3-5s", ">5s",
];

const BAND_BACKGROUNDS: [&str; BAND_COUNT] = [
    "rgba(255, 99, 132, 0.2)",
    "rgba(255, 159, 64, 0.2)",
    "rgba(255, 205, 86, 0.2)",
    "rgba(75, 192, 192, 0.2)",
    "rgba(54, 162, 235, 0.2)",
    "rgba(153, 102, 255, 0.2)",
    "rgba(179, 157, 207, 0.2)",
    "rgba(201, 203, 207, 0.2)",
    "rgba(53, 203, 64, 0.2)",
    "rgba(153, 64, 86, 0.2)",
    "rgba(179, 99, 86, 0.2)",
];

const BAND_BORDERS: [&str; BAND_COUNT] = [
    "rgb(255, 99, 132)",
    "rgb(255, 159, 64)",
    "rgb(255, 205, 86)",
    "rgb(75, 192, 192)",
    "rgb(54, 162, 235)",
    "rgb(153, 102, 255)",
    "rgb(179, 157, 207)",
    "rgb(201, 203, 207)",
    "rgb(53, 203, 64)",
    "rgb(153, 64, 86)",
    "rgb(179, 99, 86)",
];

pub type Histogram = [u64; BAND_COUNT];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDataset {
    pub label: String,
    pub data: Histogram,
    pub background_color: [&'static str; BAND_COUNT],
    pub border_color: [&'static str; BAND_COUNT],
    pub border_width: u32,
}

impl Dataset for BarDataset {
    type Data = Histogram;

    fn label(&self) -> &str {
        &self.label
    }

    fn set_data(&mut self, data: Histogram) {
        self.data = data;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyDistributionChart {
    #[serde(flatten)]
    config: ChartConfig<Datasets<BarDataset>>,
}

impl LatencyDistributionChart {
    pub fn new(evict_after: u32) -> Self {
        Self {
            config: ChartConfig {
                kind: "bar",
                data: ChartData {
                    labels: BAND_LABELS.to_vec(),
                    datasets: Datasets::new(evict_after),
                },
                options: serde_json::json!({
                    "scales": { "y": { "beginAtZero": true } },
                    "responsive": true,
                }),
            },
        }
    }

    pub fn datasets(&self) -> &Datasets<BarDataset> {
        &self.config.data.datasets
    }
}

impl Widget for LatencyDistributionChart {
    type Payload = LatencyMap;

    const ELEMENT_ID: &'static str = "latency-distribution-chart";
    const ENDPOINT: &'static str = LATENCY_ENDPOINT;

    fn apply(&mut self, payload: LatencyMap) {
        let histograms = payload
            .into_iter()
            .map(|(target, samples)| (target, histogram(&samples)));

        self.config.data.datasets.update(histograms, |label, data| BarDataset {
            label: label.to_string(),
            data,
            background_color: BAND_BACKGROUNDS,
            border_color: BAND_BORDERS,
            border_width: 1,
        });
    }
}

/// Band of a latency in milliseconds. NaN falls in the last band.
pub fn band_index(latency_ms: f64) -> usize {
    BAND_UPPER_BOUNDS_MS
        .iter()
        .position(|&bound| latency_ms < bound)
        .unwrap_or(BAND_UPPER_BOUNDS_MS.len())
}

/// Count samples per band.
pub fn histogram(samples: &[LatencySample]) -> Histogram {
    let mut counts = [0; BAND_COUNT];
    for sample in samples {
        counts[band_index(sample.y)] += 1;
    }
    counts
}
