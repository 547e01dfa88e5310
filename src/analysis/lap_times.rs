use itertools::Itertools;
use serde::Serialize;

use crate::api::{Lap, Timing};

use super::group_by;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DriverLapAnalysis {
    pub driver_id: String,
    pub total_laps: usize,
    pub average_lap_time: f64,
    pub fastest_lap: f64,
    pub slowest_lap: f64,
    /// Population standard deviation of the lap times; lower is steadier.
    pub consistency: f64,
    /// In the order the laps were run
    pub lap_times: Vec<LapTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LapTime {
    /// `None` when the lap number could not be read
    pub lap: Option<u32>,
    pub seconds: f64,
}

/// One row of a single lap's classification.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LapPosition {
    pub timing: Timing,
    pub seconds: f64,
    /// Seconds behind the fastest time of the lap; zero for the fastest.
    pub gap_to_fastest: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LapTimeAnalytics {
    /// Sorted by fastest lap.
    pub driver_stats: Vec<DriverLapAnalysis>,
    /// Highest lap number seen.
    pub total_laps: u32,
    pub overall_fastest: f64,
    pub overall_average: f64,
    pub total_drivers: usize,
}

/// Seconds in a `M:SS.mmm` (or plain `SS.mmm`) time.
pub fn parse_lap_time(time: &str) -> Option<f64> {
    let time = time.trim();
    let seconds = match time.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            if seconds >= 60. {
                return None;
            }
            minutes as f64 * 60. + seconds
        }
        None => time.parse().ok()?,
    };
    (seconds.is_finite() && seconds >= 0.).then_some(seconds)
}

/// Renders seconds as `M:SS.mmm`.
pub fn format_lap_time(seconds: f64) -> String {
    let millis = (seconds.max(0.) * 1000.).round() as u64;
    format!(
        "{}:{:02}.{:03}",
        millis / 60_000,
        (millis % 60_000) / 1000,
        millis % 1000
    )
}

fn lap_number(lap: &Lap) -> Option<u32> {
    lap.number.trim().parse().ok()
}

fn summarize(driver_id: String, timings: Vec<(&Timing, LapTime)>) -> DriverLapAnalysis {
    let lap_times = timings.into_iter().map(|(_, time)| time).collect_vec();
    let total_laps = lap_times.len();
    let seconds = || lap_times.iter().map(|time| time.seconds);
    let average_lap_time = seconds().sum::<f64>() / total_laps as f64;
    let variance = seconds()
        .map(|time| (time - average_lap_time).powi(2))
        .sum::<f64>()
        / total_laps as f64;
    DriverLapAnalysis {
        driver_id,
        total_laps,
        average_lap_time,
        fastest_lap: seconds().fold(f64::INFINITY, f64::min),
        slowest_lap: seconds().fold(0., f64::max),
        consistency: variance.sqrt(),
        lap_times,
    }
}

/// Per-driver lap statistics over every timing in `laps`. Timings without a
/// readable time are left out; `None` when nothing is left.
pub fn analyze(laps: &[Lap]) -> Option<LapTimeAnalytics> {
    let total_laps = laps.iter().filter_map(lap_number).max().unwrap_or(0);
    let timed = laps
        .iter()
        .flat_map(|lap| {
            let number = lap_number(lap);
            lap.timings.iter().filter_map(move |timing| {
                parse_lap_time(&timing.time).map(|seconds| {
                    (timing, LapTime { lap: number, seconds })
                })
            })
        })
        .collect_vec();
    if timed.is_empty() {
        return None;
    }

    let overall_fastest = timed
        .iter()
        .map(|(_, time)| time.seconds)
        .fold(f64::INFINITY, f64::min);
    let overall_average =
        timed.iter().map(|(_, time)| time.seconds).sum::<f64>() / timed.len() as f64;

    let driver_stats = group_by(timed, |(timing, _)| timing.driver_id.clone())
        .into_iter()
        .map(|(driver_id, timings)| summarize(driver_id, timings))
        .sorted_by(|a, b| {
            a.fastest_lap
                .total_cmp(&b.fastest_lap)
                .then_with(|| a.driver_id.cmp(&b.driver_id))
        })
        .collect_vec();

    Some(LapTimeAnalytics {
        total_drivers: driver_stats.len(),
        driver_stats,
        total_laps,
        overall_fastest,
        overall_average,
    })
}

/// Timings of a single lap, quickest first, with each gap to the quickest.
/// Timings without a readable time are left out.
pub fn lap_leaderboard(lap: &Lap) -> Vec<LapPosition> {
    let timed = lap
        .timings
        .iter()
        .filter_map(|timing| parse_lap_time(&timing.time).map(|seconds| (timing, seconds)))
        .sorted_by(|a, b| a.1.total_cmp(&b.1))
        .collect_vec();
    let Some(&(_, fastest)) = timed.first() else {
        return Vec::new();
    };
    timed
        .into_iter()
        .map(|(timing, seconds)| LapPosition {
            timing: timing.clone(),
            seconds,
            gap_to_fastest: seconds - fastest,
        })
        .collect()
}

impl LapTimeAnalytics {
    pub fn driver(&self, driver_id: &str) -> Option<&DriverLapAnalysis> {
        self.driver_stats.iter().find(|stats| stats.driver_id == driver_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    fn lap(number: u32, timings: &[(&str, &str)]) -> Lap {
        Lap {
            number: number.to_string(),
            timings: timings
                .iter()
                .enumerate()
                .map(|(position, (driver, time))| Timing {
                    driver_id: driver.to_string(),
                    position: (position + 1).to_string(),
                    time: time.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_lap_time() {
        assert!((parse_lap_time("1:23.456").unwrap() - 83.456).abs() < EPSILON);
        assert_eq!(parse_lap_time("59.5"), Some(59.5));
        assert_eq!(parse_lap_time(" 2:00.000 "), Some(120.));
        assert_eq!(parse_lap_time(""), None);
        assert_eq!(parse_lap_time("1:75.000"), None);
        assert_eq!(parse_lap_time("-3"), None);
        assert_eq!(parse_lap_time("x:12.0"), None);
    }

    #[test]
    fn test_format_lap_time() {
        assert_eq!(format_lap_time(83.456), "1:23.456");
        assert_eq!(format_lap_time(9.5), "0:09.500");
        assert_eq!(format_lap_time(59.9996), "1:00.000");
    }

    #[test]
    fn test_per_driver_statistics() {
        let laps = vec![
            lap(1, &[("VER", "1:30.000"), ("HAM", "1:31.000")]),
            lap(2, &[("VER", "1:32.000"), ("HAM", "1:29.500")]),
            lap(3, &[("VER", "1:31.000"), ("HAM", "")]),
        ];
        let analytics = analyze(&laps).unwrap();

        assert_eq!(analytics.total_laps, 3);
        assert_eq!(analytics.total_drivers, 2);
        assert!((analytics.overall_fastest - 89.5).abs() < EPSILON);
        assert!((analytics.overall_average - (90. + 92. + 91. + 91. + 89.5) / 5.).abs() < EPSILON);

        let ver = analytics.driver("VER").unwrap();
        assert_eq!(ver.total_laps, 3);
        assert!((ver.average_lap_time - 91.).abs() < EPSILON);
        assert!((ver.fastest_lap - 90.).abs() < EPSILON);
        assert!((ver.slowest_lap - 92.).abs() < EPSILON);
        assert!((ver.consistency - (2f64 / 3.).sqrt()).abs() < EPSILON);
        let seconds: Vec<f64> = ver.lap_times.iter().map(|t| t.seconds).collect();
        assert_eq!(seconds, vec![90., 92., 91.]);

        assert_eq!(analytics.driver_stats[0].driver_id, "HAM");
        assert_eq!(analytics.driver("HAM").unwrap().total_laps, 2);
    }

    #[test]
    fn test_lap_numbers_kept() {
        let analytics = analyze(&[lap(30, &[("HAM", "1:31.000")])]).unwrap();
        let ham = analytics.driver("HAM").unwrap();
        assert_eq!(ham.lap_times, vec![LapTime { lap: Some(30), seconds: 91. }]);
        assert_eq!(analytics.total_laps, 30);
    }

    #[test]
    fn test_unreadable_lap_does_not_shift_numbers() {
        let laps = vec![
            lap(1, &[("HAM", "1:31.000")]),
            lap(2, &[("HAM", "")]),
            lap(3, &[("HAM", "1:30.000")]),
        ];
        let analytics = analyze(&laps).unwrap();
        let numbers: Vec<Option<u32>> = analytics
            .driver("HAM")
            .unwrap()
            .lap_times
            .iter()
            .map(|t| t.lap)
            .collect();
        assert_eq!(numbers, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_lap_leaderboard_orders_and_gaps() {
        let lap = lap(
            12,
            &[("VER", "1:32.250"), ("NOR", "1:31.900"), ("HAM", "n/a"), ("LEC", "1:33.000")],
        );
        let board = lap_leaderboard(&lap);

        let order: Vec<&str> = board.iter().map(|p| p.timing.driver_id.as_str()).collect();
        assert_eq!(order, ["NOR", "VER", "LEC"]);
        assert_eq!(board[0].gap_to_fastest, 0.);
        assert!((board[1].gap_to_fastest - 0.35).abs() < 1e-6);
        assert!((board[2].gap_to_fastest - 1.1).abs() < 1e-6);
        assert!((board[2].seconds - 93.).abs() < EPSILON);
    }

    #[test]
    fn test_lap_leaderboard_empty_without_times() {
        assert!(lap_leaderboard(&lap(1, &[("HAM", "")])).is_empty());
        assert!(lap_leaderboard(&lap(1, &[])).is_empty());
    }

    #[test]
    fn test_no_timings_no_analytics() {
        assert!(analyze(&[]).is_none());
        assert!(analyze(&[lap(1, &[])]).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_identical_laps_are_perfectly_consistent(
            millis in 60_000u64..150_000u64,
            laps in 1usize..30,
        ) {
            let time = format_lap_time(millis as f64 / 1000.);
            let laps: Vec<Lap> = (1..=laps as u32).map(|n| lap(n, &[("LEC", time.as_str())])).collect();
            let analytics = analyze(&laps).unwrap();
            let lec = analytics.driver("LEC").unwrap();
            prop_assert!(lec.consistency.abs() < 1e-6);
            prop_assert!((lec.fastest_lap - lec.slowest_lap).abs() < EPSILON);
        }

        #[test]
        fn prop_format_then_parse_preserves_millis(millis in 0u64..10_000_000u64) {
            let parsed = parse_lap_time(&format_lap_time(millis as f64 / 1000.)).unwrap();
            prop_assert_eq!((parsed * 1000.).round() as u64, millis);
        }
    }
}
