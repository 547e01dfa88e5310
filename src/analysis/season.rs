use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    api::{ConstructorStanding, DriverStanding, Race},
    calendar,
};

use super::numeric;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RaceProgress {
    pub total: usize,
    pub completed: usize,
    pub upcoming: usize,
    /// Percentage of the calendar already run
    pub progress: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DriverSummary {
    pub total: usize,
    pub with_points: usize,
    pub with_wins: usize,
    pub total_points: f64,
    pub total_wins: u32,
    pub average_points: f64,
    pub leader: Option<DriverStanding>,
    pub most_wins: Option<DriverStanding>,
    /// Points between first and second place
    pub leader_gap: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConstructorSummary {
    pub total: usize,
    pub with_points: usize,
    pub with_wins: usize,
    pub total_points: f64,
    pub leader: Option<ConstructorStanding>,
    pub most_wins: Option<ConstructorStanding>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeasonStatistics {
    pub races: RaceProgress,
    pub drivers: DriverSummary,
    pub constructors: ConstructorSummary,
}

fn wins(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

/// First entry with the highest win count.
fn most_wins<'s, T>(standings: &'s [T], wins_of: impl Fn(&T) -> u32) -> Option<&'s T> {
    standings
        .iter()
        .reduce(|best, candidate| if wins_of(candidate) > wins_of(best) { candidate } else { best })
}

impl SeasonStatistics {
    /// Standings are expected in championship order, as the API returns them.
    pub fn compute(
        races: &[Race],
        driver_standings: &[DriverStanding],
        constructor_standings: &[ConstructorStanding],
        now: DateTime<Utc>,
    ) -> Self {
        let completed = calendar::completed_races(races, now).len();
        let upcoming = calendar::upcoming_races(races, now).len();
        let races = RaceProgress {
            total: races.len(),
            completed,
            upcoming,
            progress: if races.is_empty() {
                0.
            } else {
                completed as f64 / races.len() as f64 * 100.
            },
        };

        let total_points: f64 = driver_standings.iter().map(|d| numeric(&d.points)).sum();
        let drivers = DriverSummary {
            total: driver_standings.len(),
            with_points: driver_standings
                .iter()
                .filter(|d| numeric(&d.points) > 0.)
                .count(),
            with_wins: driver_standings.iter().filter(|d| wins(&d.wins) > 0).count(),
            total_points,
            total_wins: driver_standings.iter().map(|d| wins(&d.wins)).sum(),
            average_points: if driver_standings.is_empty() {
                0.
            } else {
                total_points / driver_standings.len() as f64
            },
            leader: driver_standings.first().cloned(),
            most_wins: most_wins(driver_standings, |d| wins(&d.wins)).cloned(),
            leader_gap: match driver_standings {
                [first, second, ..] => numeric(&first.points) - numeric(&second.points),
                _ => 0.,
            },
        };

        let constructors = ConstructorSummary {
            total: constructor_standings.len(),
            with_points: constructor_standings
                .iter()
                .filter(|c| numeric(&c.points) > 0.)
                .count(),
            with_wins: constructor_standings
                .iter()
                .filter(|c| wins(&c.wins) > 0)
                .count(),
            total_points: constructor_standings.iter().map(|c| numeric(&c.points)).sum(),
            leader: constructor_standings.first().cloned(),
            most_wins: most_wins(constructor_standings, |c| wins(&c.wins)).cloned(),
        };

        Self {
            races,
            drivers,
            constructors,
        }
    }
}
