//! Availability table: one score, bar and hostname per target.

use serde::Serialize;
use std::cmp::Ordering;

use super::Widget;
use crate::api::{TargetRecord, AVAILABILITY_ENDPOINT};

/// Color of an availability bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarColor {
    Green,
    Yellow,
    Red,
}

impl BarColor {
    /// Green from 0.8 up, yellow from 0.5 up, red below.
    pub fn for_availability(availability: f64) -> Self {
        if availability >= 0.8 {
            BarColor::Green
        } else if availability >= 0.5 {
            BarColor::Yellow
        } else {
            BarColor::Red
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            BarColor::Green => "progress-bar progress-bar-green",
            BarColor::Yellow => "progress-bar progress-bar-yellow",
            BarColor::Red => "progress-bar progress-bar-red",
        }
    }
}

/// A rendered page element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: &'static str,
    pub class: String,
    pub text: String,
    pub width: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(tag: &'static str, class: &str) -> Self {
        Self {
            tag,
            class: class.to_string(),
            text: String::new(),
            width: String::new(),
            children: Vec::new(),
        }
    }

    fn with_text(mut self, text: String) -> Self {
        self.text = text;
        self
    }
}

/// Body of the availability widget.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AvailabilityTable {
    pub elements: Vec<Element>,
}

impl AvailabilityTable {
    /// Clear the body and render `records` best first.
    pub fn render(&mut self, mut records: Vec<TargetRecord>) {
        sort_by_availability(&mut records);

        self.elements.clear();
        for record in &records {
            self.elements.push(score_element(record));
            self.elements.push(bar_element(record));
            self.elements.push(hostname_element(record));
        }
    }
}

impl Widget for AvailabilityTable {
    type Payload = Option<Vec<TargetRecord>>;

    const ELEMENT_ID: &'static str = "availability-widget-body";
    const ENDPOINT: &'static str = AVAILABILITY_ENDPOINT;

    fn apply(&mut self, payload: Self::Payload) {
        self.render(payload.unwrap_or_default());
    }
}

/// Stable sort, highest availability first. Unparsable (NaN) scores go last.
pub fn sort_by_availability(records: &mut [TargetRecord]) {
    records.sort_by(|a, b| by_availability_desc(a.availability, b.availability));
}

fn by_availability_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    }
}

/// Availability with exactly two decimals, exact halves rounded away from zero.
pub fn format_score(availability: f64) -> String {
    // An exact tie at the third decimal is a multiple of 1/8.
    let scaled = availability * 100.0;
    if (availability * 8.0).fract() == 0.0 && scaled.fract().abs() == 0.5 {
        return format!("{:.2}", scaled.round() / 100.0);
    }
    format!("{:.2}", availability)
}

fn score_element(record: &TargetRecord) -> Element {
    Element::new("div", "availability-item").with_text(format_score(record.availability))
}

fn bar_element(record: &TargetRecord) -> Element {
    let mut content = Element::new("span", BarColor::for_availability(record.availability).class());
    content.width = format!("{}%", record.availability * 100.0);

    let mut bar = Element::new("div", "availability-bar-item");
    bar.children.push(content);
    bar
}

fn hostname_element(record: &TargetRecord) -> Element {
    Element::new("div", "availability-hostname").with_text(record.target.clone())
}
