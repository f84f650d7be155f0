use crate::common::types::string_or_number;
use serde::Deserialize;
use std::collections::HashMap;

pub const TITLE_TAG: &str = "com.nike.name";

/// The metric types the converter understands. Everything else in an
/// activity's metric list is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Latitude,
    Longitude,
    Elevation,
    HeartRate,
}

impl MetricKind {
    pub fn from_type(metric_type: &str) -> Option<Self> {
        match metric_type {
            "latitude" => Some(MetricKind::Latitude),
            "longitude" => Some(MetricKind::Longitude),
            "ascent" => Some(MetricKind::Elevation),
            "heart_rate" => Some(MetricKind::HeartRate),
            _ => None,
        }
    }
}

/// One sample covering `[start_epoch_ms, end_epoch_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Sample {
    #[serde(rename = "start_epoch_ms")]
    pub interval_start_ms: i64,
    #[serde(rename = "end_epoch_ms")]
    pub interval_end_ms: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricStream {
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

impl MetricStream {
    pub fn new(kind: MetricKind, samples: Vec<Sample>) -> Self {
        Self { kind, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first sample whose interval start goes backwards, if any.
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.samples
            .windows(2)
            .position(|pair| pair[1].interval_start_ms < pair[0].interval_start_ms)
            .map(|i| i + 1)
    }
}

/// Samples stay untyped until the metric type is recognised.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMetric {
    #[serde(rename = "type")]
    pub metric_type: String,
    #[serde(default)]
    pub values: serde_json::Value,
}

impl RawMetric {
    fn samples(&self) -> Result<Vec<Sample>, serde_json::Error> {
        if self.values.is_null() {
            return Ok(Vec::new());
        }
        Vec::<Sample>::deserialize(&self.values)
    }
}

/// Activity detail payload. Only the fields the converter reads are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub tags: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub metrics: Option<Vec<RawMetric>>,
}

/// The streams of one activity the aligner consumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityStreams {
    pub latitude: Option<MetricStream>,
    pub longitude: Option<MetricStream>,
    pub elevation: Option<MetricStream>,
    pub heart_rate: Option<MetricStream>,
}

impl ActivityRecord {
    pub fn title(&self) -> &str {
        self.tags
            .as_ref()
            .and_then(|tags| tags.get(TITLE_TAG))
            .and_then(|value| value.as_str())
            .unwrap_or("")
    }

    /// Split the metric list into typed streams. Returns `Ok(None)` when the
    /// payload has no metric list at all. A type listed twice keeps its last
    /// occurrence. Only the samples of recognised types are decoded.
    pub fn streams(&self) -> Result<Option<ActivityStreams>, serde_json::Error> {
        let Some(metrics) = self.metrics.as_ref() else {
            return Ok(None);
        };
        let mut streams = ActivityStreams::default();

        for metric in metrics {
            let Some(kind) = MetricKind::from_type(&metric.metric_type) else {
                continue;
            };
            let stream = Some(MetricStream::new(kind, metric.samples()?));
            match kind {
                MetricKind::Latitude => streams.latitude = stream,
                MetricKind::Longitude => streams.longitude = stream,
                MetricKind::Elevation => streams.elevation = stream,
                MetricKind::HeartRate => streams.heart_rate = stream,
            }
        }

        Ok(Some(streams))
    }
}
