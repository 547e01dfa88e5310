// Race calendar helpers

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::api::Race;

/// Scheduled start of a race. A missing or unreadable time means midnight UTC;
/// an unreadable date means the race cannot be placed on the calendar.
pub fn race_start(race: &Race) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(race.date.trim(), "%Y-%m-%d").ok()?;
    let time = race
        .time
        .as_deref()
        .and_then(|t| NaiveTime::parse_from_str(t.trim().trim_end_matches('Z'), "%H:%M:%S").ok())
        .unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

/// Races that have not started yet, in calendar order.
pub fn upcoming_races(races: &[Race], now: DateTime<Utc>) -> Vec<&Race> {
    races
        .iter()
        .filter(|race| race_start(race).is_some_and(|start| start >= now))
        .collect()
}

/// Races that have already started, in calendar order.
pub fn completed_races(races: &[Race], now: DateTime<Utc>) -> Vec<&Race> {
    races
        .iter()
        .filter(|race| race_start(race).is_some_and(|start| start < now))
        .collect()
}

pub fn next_race(races: &[Race], now: DateTime<Utc>) -> Option<&Race> {
    upcoming_races(races, now).into_iter().next()
}

/// Latest race that has already been run, the default selection for result
/// and analytics views.
pub fn most_recent_race(races: &[Race], now: DateTime<Utc>) -> Option<&Race> {
    completed_races(races, now).into_iter().last()
}
