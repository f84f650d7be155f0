use metrics::{counter, gauge};

/// Error/Reliability Metrics - Success/Failure pairs
pub fn increment_nrc_api_success() {
    counter!("nrc_api_total", "result" => "success").increment(1);
}

pub fn increment_nrc_api_failure() {
    counter!("nrc_api_total", "result" => "failure").increment(1);
}

/// Business Logic Metrics
pub fn increment_activities_listed(count: u64) {
    counter!("activities_listed").increment(count);
}

pub fn increment_activities_fetched(count: u64) {
    counter!("activities_fetched").increment(count);
}

pub fn increment_activities_fetch_skipped(count: u64) {
    counter!("activities_fetch_skipped").increment(count);
}

pub fn increment_activities_converted(count: u64) {
    counter!("activities_converted").increment(count);
}

pub fn increment_activities_skipped(count: u64) {
    counter!("activities_skipped").increment(count);
}

pub fn set_track_points_last(count: u64) {
    gauge!("track_points_last").set(count as f64);
}
