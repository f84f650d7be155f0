pub mod align;
pub mod document;
pub mod gpx;
pub mod metric;

pub use align::{AlignError, TrackPoint, align, align_streams};
pub use document::TrackDocument;
pub use metric::{ActivityRecord, ActivityStreams, MetricKind, MetricStream, Sample};
