// In-memory analytics over fetched championship data

pub mod lap_times;
pub mod pit_stops;
pub mod season;

use std::{collections::HashMap, hash::Hash};

use itertools::Itertools;

use crate::api::{ConstructorStanding, DriverStanding, QualifyingResult, RaceResult, Timing};

pub use lap_times::{
    DriverLapAnalysis, LapPosition, LapTime, LapTimeAnalytics, format_lap_time, lap_leaderboard,
    parse_lap_time,
};
pub use pit_stops::{DriverPitStopStats, PitStopAnalytics, PitStopRating};
pub use season::SeasonStatistics;

/// Buckets `items` by the key `key_of` extracts, keeping each bucket in input
/// order.
pub fn group_by<T, K, F>(items: impl IntoIterator<Item = T>, key_of: F) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    items.into_iter().into_group_map_by(key_of)
}

/// Records the API ranks with a textual position.
pub trait Positioned {
    fn position(&self) -> &str;

    fn position_number(&self) -> Option<u32> {
        self.position().trim().parse().ok()
    }
}

macro_rules! positioned {
    ($($record:ty),*) => {
        $(impl Positioned for $record {
            fn position(&self) -> &str {
                &self.position
            }
        })*
    };
}

positioned!(DriverStanding, ConstructorStanding, RaceResult, QualifyingResult, Timing);

/// Sorts by numeric position; records without a readable position go last in
/// their original order.
pub fn sort_by_position<T: Positioned + Clone>(items: &[T]) -> Vec<T> {
    items
        .iter()
        .cloned()
        .sorted_by_key(|item| item.position_number().unwrap_or(u32::MAX))
        .collect()
}

/// `1` → `1st`, `12` → `12th`, `22` → `22nd`.
pub fn position_ordinal(position: u32) -> String {
    let suffix = match (position % 10, position % 100) {
        (1, last_two) if last_two != 11 => "st",
        (2, last_two) if last_two != 12 => "nd",
        (3, last_two) if last_two != 13 => "rd",
        _ => "th",
    };
    format!("{}{}", position, suffix)
}

/// Numeric value of a field the API sends as text. Empty or malformed values
/// count as zero.
pub(crate) fn numeric(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.)
}
