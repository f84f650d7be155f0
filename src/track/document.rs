use super::align::TrackPoint;

/// One track with one segment, the shape the GPX encoder writes.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDocument {
    pub title: String,
    pub track: Track,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub segments: Vec<TrackSegment>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackSegment {
    pub points: Vec<Waypoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub time_ms: i64,
    /// Only set for points that carried a heart-rate value.
    pub extensions: Option<TrackPointExtension>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPointExtension {
    pub heart_rate: f64,
}

impl From<TrackPoint> for Waypoint {
    fn from(point: TrackPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            elevation: point.elevation,
            time_ms: point.timestamp_ms,
            extensions: point
                .heart_rate
                .map(|heart_rate| TrackPointExtension { heart_rate }),
        }
    }
}

impl TrackDocument {
    pub fn build(title: &str, points: Vec<TrackPoint>) -> Self {
        let segment = TrackSegment {
            points: points.into_iter().map(Waypoint::from).collect(),
        };

        Self {
            title: title.to_string(),
            track: Track {
                name: title.to_string(),
                segments: vec![segment],
            },
        }
    }

    pub fn point_count(&self) -> usize {
        self.track.segments.iter().map(|s| s.points.len()).sum()
    }
}
