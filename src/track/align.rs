use super::metric::{ActivityStreams, MetricStream};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Interval start of the latitude sample this point came from.
    pub timestamp_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub heart_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignError {
    /// Latitude or longitude stream absent; the activity has no route.
    MissingGeodata,
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::MissingGeodata => write!(f, "no latitude/longitude information"),
        }
    }
}

impl std::error::Error for AlignError {}

pub fn align_streams(streams: &ActivityStreams) -> Result<Vec<TrackPoint>, AlignError> {
    align(
        streams.latitude.as_ref(),
        streams.longitude.as_ref(),
        streams.elevation.as_ref(),
        streams.heart_rate.as_ref(),
    )
}

/// Merge the position streams and the optional auxiliary streams into one
/// ordered sequence of track points.
///
/// Latitude sample `i` pairs with longitude sample `i`; the latitude
/// timestamp wins when they disagree. Each auxiliary stream is swept once in
/// lockstep with the points and its latest applicable value is carried
/// forward, including past its last sample.
///
/// All streams must be non-decreasing in interval start. Out-of-order input
/// is reported but not re-sorted, and the affected points get undefined
/// auxiliary values.
pub fn align(
    latitude: Option<&MetricStream>,
    longitude: Option<&MetricStream>,
    elevation: Option<&MetricStream>,
    heart_rate: Option<&MetricStream>,
) -> Result<Vec<TrackPoint>, AlignError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(AlignError::MissingGeodata);
    };

    for stream in [Some(latitude), Some(longitude), elevation, heart_rate]
        .into_iter()
        .flatten()
    {
        if let Some(index) = stream.first_out_of_order() {
            warn!(
                "The {:?} data is out of order at sample {}; aligned values may be wrong",
                stream.kind, index
            );
        }
    }

    if latitude.len() != longitude.len() {
        warn!(
            "The latitude and longitude data differ in length ({} vs {}); extra samples are dropped",
            latitude.len(),
            longitude.len()
        );
    }

    let mut points: Vec<TrackPoint> = latitude
        .samples
        .iter()
        .zip(&longitude.samples)
        .map(|(lat, lon)| {
            if lat.interval_start_ms != lon.interval_start_ms {
                warn!(
                    "The latitude and longitude data is out of order! ({} vs {})",
                    lat.interval_start_ms, lon.interval_start_ms
                );
            }
            TrackPoint {
                timestamp_ms: lat.interval_start_ms,
                latitude: lat.value,
                longitude: lon.value,
                elevation: None,
                heart_rate: None,
            }
        })
        .collect();

    if let Some(stream) = elevation {
        forward_fill(&mut points, stream, |point, value| point.elevation = Some(value));
    }
    if let Some(stream) = heart_rate {
        forward_fill(&mut points, stream, |point, value| point.heart_rate = Some(value));
    }

    Ok(points)
}

fn forward_fill<F>(points: &mut [TrackPoint], stream: &MetricStream, mut assign: F)
where
    F: FnMut(&mut TrackPoint, f64),
{
    let Some(last) = stream.samples.len().checked_sub(1) else {
        return;
    };

    let mut cursor = 0;
    for point in points.iter_mut() {
        while cursor < last && point.timestamp_ms >= stream.samples[cursor].interval_end_ms {
            cursor += 1;
        }
        assign(point, stream.samples[cursor].value);
    }
}
