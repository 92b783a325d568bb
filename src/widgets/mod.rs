//! Dashboard widgets.
//!
//! Every polling widget owns a model that the poller refreshes in place and the
//! web layer serializes. Chart models serialize as Chart.js configurations.

mod availability;
mod latency;
mod latency_distribution;
mod message;
mod status_code;
mod target_form;

pub use availability::*;
pub use latency::*;
pub use latency_distribution::*;
pub use message::*;
pub use status_code::*;
pub use target_form::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::MetricsClient;
use crate::config::DashboardConfig;

/// A widget fed by one metrics endpoint.
pub trait Widget: Serialize + Send + Sync + 'static {
    /// Decoded response body of [`Widget::ENDPOINT`].
    type Payload: DeserializeOwned + Send + 'static;

    /// Id of the page element the widget renders into.
    const ELEMENT_ID: &'static str;

    /// Backend endpoint polled for this widget.
    const ENDPOINT: &'static str;

    /// Fold a fresh response into the model.
    fn apply(&mut self, payload: Self::Payload);
}

/// A chart dataset addressed by its label.
pub trait Dataset {
    type Data;

    fn label(&self) -> &str;
    fn set_data(&mut self, data: Self::Data);
}

/// Ordered datasets of a chart, keyed by label.
///
/// Labels are only ever added, unless `evict_after` is non-zero: then a dataset
/// missing from that many consecutive updates is dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Datasets<D> {
    entries: Vec<D>,
    #[serde(skip)]
    misses: Vec<u32>,
    #[serde(skip)]
    evict_after: u32,
}

impl<D: Dataset> Datasets<D> {
    pub fn new(evict_after: u32) -> Self {
        Self {
            entries: Vec::new(),
            misses: Vec::new(),
            evict_after,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.entries.iter()
    }

    pub fn get(&self, label: &str) -> Option<&D> {
        self.entries.iter().find(|d| d.label() == label)
    }

    /// Replace the data of known labels and append a dataset built by `create`
    /// for every unknown one.
    pub fn update<I>(&mut self, incoming: I, mut create: impl FnMut(&str, D::Data) -> D)
    where
        I: IntoIterator<Item = (String, D::Data)>,
    {
        let mut seen = vec![false; self.entries.len()];

        for (label, data) in incoming {
            match self.entries.iter().position(|d| d.label() == label) {
                Some(idx) => {
                    self.entries[idx].set_data(data);
                    self.misses[idx] = 0;
                    if let Some(flag) = seen.get_mut(idx) {
                        *flag = true;
                    }
                }
                None => {
                    self.entries.push(create(&label, data));
                    self.misses.push(0);
                    seen.push(true);
                }
            }
        }

        if self.evict_after == 0 {
            return;
        }

        for (misses, seen) in self.misses.iter_mut().zip(&seen) {
            if !seen {
                *misses += 1;
            }
        }

        let limit = self.evict_after;
        let mut idx = 0;
        while idx < self.entries.len() {
            if self.misses[idx] >= limit {
                let evicted = self.entries.remove(idx);
                self.misses.remove(idx);
                tracing::debug!("Evicting stale dataset {}", evicted.label());
            } else {
                idx += 1;
            }
        }
    }
}

/// Chart.js configuration skeleton shared by the chart widgets.
#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig<D> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData<D>,
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData<D> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<&'static str>,
    pub datasets: D,
}

/// All widget models of one page, shared between the poller and the web layer.
#[derive(Clone)]
pub struct Dashboard {
    pub availability: Arc<RwLock<AvailabilityTable>>,
    pub latency: Arc<RwLock<LatencyChart>>,
    pub latency_distribution: Arc<RwLock<LatencyDistributionChart>>,
    pub status_codes: Arc<RwLock<StatusCodeChart>>,
    pub form: Arc<TargetForm>,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, client: MetricsClient) -> Self {
        let messages = MessageArea::new(config.message_clear_delay);

        Self {
            availability: Arc::new(RwLock::new(AvailabilityTable::default())),
            latency: Arc::new(RwLock::new(LatencyChart::new(config.evict_after))),
            latency_distribution: Arc::new(RwLock::new(LatencyDistributionChart::new(
                config.evict_after,
            ))),
            status_codes: Arc::new(RwLock::new(StatusCodeChart::new())),
            form: Arc::new(TargetForm::new(client, config.target_url.clone(), messages)),
        }
    }

    /// JSON model of the widget bound to `element_id`.
    pub async fn widget_json(&self, element_id: &str) -> Option<serde_json::Value> {
        let value = if element_id == AvailabilityTable::ELEMENT_ID {
            serde_json::to_value(&*self.availability.read().await)
        } else if element_id == LatencyChart::ELEMENT_ID {
            serde_json::to_value(&*self.latency.read().await)
        } else if element_id == LatencyDistributionChart::ELEMENT_ID {
            serde_json::to_value(&*self.latency_distribution.read().await)
        } else if element_id == StatusCodeChart::ELEMENT_ID {
            serde_json::to_value(&*self.status_codes.read().await)
        } else if element_id == MessageArea::ELEMENT_ID {
            serde_json::to_value(self.form.messages().snapshot().await)
        } else {
            return None;
        };

        match value {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Failed to serialize widget {}: {}", element_id, e);
                None
            }
        }
    }
}
