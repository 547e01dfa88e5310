use itertools::Itertools;
use serde::Serialize;

use crate::api::PitStop;

use super::{group_by, lap_times::parse_lap_time};

/// Stops under this many seconds count as fast
const FAST_STOP_S: f64 = 3.0;
const GOOD_STOP_S: f64 = 4.0;
const SLOW_STOP_S: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PitStopRating {
    Fast,
    Good,
    Slow,
    VerySlow,
}

impl PitStopRating {
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds < FAST_STOP_S {
            Self::Fast
        } else if seconds < GOOD_STOP_S {
            Self::Good
        } else if seconds < SLOW_STOP_S {
            Self::Slow
        } else {
            Self::VerySlow
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DriverPitStopStats {
    pub driver_id: String,
    pub total_stops: usize,
    pub total_time: f64,
    pub average_duration: f64,
    pub fastest_stop: f64,
    pub slowest_stop: f64,
    pub stops: Vec<PitStop>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PitStopAnalytics {
    /// Sorted by average stop duration, quickest crew first.
    pub driver_stats: Vec<DriverPitStopStats>,
    pub fastest_stop: PitStop,
    pub fastest_stop_duration: f64,
    pub total_stops: usize,
    pub average_stop_time: f64,
}

/// Stop duration in seconds. Long stops come as `M:SS.mmm`.
pub fn stop_duration(stop: &PitStop) -> Option<f64> {
    parse_lap_time(&stop.duration)
}

/// Aggregates a race's pit stops per driver. Stops without a readable duration
/// are left out; `None` when nothing is left.
pub fn analyze(stops: &[PitStop]) -> Option<PitStopAnalytics> {
    let timed = stops
        .iter()
        .filter_map(|stop| stop_duration(stop).map(|duration| (stop, duration)))
        .collect_vec();
    if timed.is_empty() {
        return None;
    }

    let driver_stats = group_by(timed.iter().copied(), |(stop, _)| stop.driver_id.clone())
        .into_iter()
        .map(|(driver_id, stops)| {
            let total_time: f64 = stops.iter().map(|(_, duration)| duration).sum();
            DriverPitStopStats {
                driver_id,
                total_stops: stops.len(),
                total_time,
                average_duration: total_time / stops.len() as f64,
                fastest_stop: stops.iter().map(|(_, d)| *d).fold(f64::INFINITY, f64::min),
                slowest_stop: stops.iter().map(|(_, d)| *d).fold(0., f64::max),
                stops: stops.into_iter().map(|(stop, _)| stop.clone()).collect(),
            }
        })
        .sorted_by(|a, b| {
            a.average_duration
                .total_cmp(&b.average_duration)
                .then_with(|| a.driver_id.cmp(&b.driver_id))
        })
        .collect_vec();

    // earliest stop wins a tie
    let (fastest_stop, fastest_stop_duration) = timed
        .iter()
        .copied()
        .reduce(|fastest, candidate| if candidate.1 < fastest.1 { candidate } else { fastest })?;
    let total_time: f64 = timed.iter().map(|(_, duration)| duration).sum();

    Some(PitStopAnalytics {
        driver_stats,
        fastest_stop: fastest_stop.clone(),
        fastest_stop_duration,
        total_stops: timed.len(),
        average_stop_time: total_time / timed.len() as f64,
    })
}

impl PitStopAnalytics {
    pub fn driver(&self, driver_id: &str) -> Option<&DriverPitStopStats> {
        self.driver_stats.iter().find(|stats| stats.driver_id == driver_id)
    }
}
