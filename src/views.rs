// Plain text rendering for the CLI

use chrono::{DateTime, NaiveDate, Utc};
use paddock::{
    AppConfig,
    analysis::{
        LapPosition, LapTimeAnalytics, PitStopAnalytics, PitStopRating, SeasonStatistics, format_lap_time,
        pit_stops::stop_duration, position_ordinal, sort_by_position,
    },
    api::{
        Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, Race, RaceResult,
        Status,
    },
    calendar,
    countdown::Countdown,
    fetch::FetchFailure,
};

const UNKNOWN: &str = "-";

fn ordinal(position: &str) -> String {
    position
        .trim()
        .parse()
        .map(position_ordinal)
        .unwrap_or_else(|_| position.to_string())
}

fn driver_name(driver: Option<&Driver>) -> String {
    driver.map(Driver::full_name).unwrap_or_else(|| UNKNOWN.to_string())
}

fn constructor_name(constructor: Option<&Constructor>) -> &str {
    constructor.map(|c| c.name.as_str()).unwrap_or(UNKNOWN)
}

fn race_heading(race: &Race) -> String {
    format!("Round {} - {} ({})", race.round, race.race_name, race.date)
}

pub fn loading(stale: bool) {
    if stale {
        println!("Refreshing...");
    } else {
        println!("Loading...");
    }
}

pub fn failure(error: &FetchFailure) {
    println!("Error: {}", error);
    println!("Press Enter to retry");
}

pub fn races(races: &[Race], now: DateTime<Utc>) {
    if races.is_empty() {
        println!("No races scheduled");
        return;
    }
    for race in races {
        let circuit = race.circuit.as_ref().map(|c| c.circuit_name.as_str());
        let run = calendar::race_start(race).is_some_and(|start| start < now);
        println!(
            "{:>2}  {}  {:<28} {:<36} {:<14}{}{}",
            race.round,
            race.date,
            race.race_name,
            circuit.unwrap_or(UNKNOWN),
            race.country().unwrap_or(UNKNOWN),
            if race.has_sprint() { " [sprint]" } else { "" },
            if run { " [done]" } else { "" },
        );
    }
}

pub fn next_race(current: Option<&Race>, upcoming: &[Race], now: DateTime<Utc>) {
    let Some(race) = current else {
        println!("No races scheduled this season");
        return;
    };
    println!("{}", race_heading(race));
    if let Some(start) = calendar::race_start(race) {
        let countdown = Countdown::until(start, now);
        if countdown.is_elapsed() {
            println!("  Lights out already happened");
        } else {
            println!("  Starts in {}", countdown);
        }
    }
    let later: Vec<&Race> = upcoming.iter().filter(|r| r.round != race.round).collect();
    if !later.is_empty() {
        println!("Coming up:");
        for race in later {
            println!("  {}", race_heading(race));
        }
    }
}

pub fn driver_standings(standings: &[DriverStanding]) {
    if standings.is_empty() {
        println!("No standings available");
        return;
    }
    for standing in sort_by_position(standings) {
        let team = standing
            .constructors
            .last()
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN);
        println!(
            "{:>5}  {:<26} {:<22} {:>6} pts  {:>2} wins",
            ordinal(&standing.position),
            driver_name(standing.driver.as_ref()),
            team,
            standing.points,
            standing.wins
        );
    }
}

pub fn constructor_standings(standings: &[ConstructorStanding]) {
    if standings.is_empty() {
        println!("No standings available");
        return;
    }
    for standing in sort_by_position(standings) {
        println!(
            "{:>5}  {:<26} {:>6} pts  {:>2} wins",
            ordinal(&standing.position),
            constructor_name(standing.constructor.as_ref()),
            standing.points,
            standing.wins
        );
    }
}

fn classification(results: &[RaceResult]) {
    for result in sort_by_position(results) {
        let time = result
            .time
            .as_ref()
            .map(|t| t.time.as_str())
            .unwrap_or(result.status.as_str());
        println!(
            "  {:>5}  {:<26} {:<22} {:>4} pts  {}",
            ordinal(&result.position),
            driver_name(result.driver.as_ref()),
            constructor_name(result.constructor.as_ref()),
            result.points,
            time
        );
    }
}

pub fn race_results(races: &[Race]) {
    if races.is_empty() {
        println!("No results yet");
    }
    for race in races {
        println!("{}", race_heading(race));
        classification(race.results.as_deref().unwrap_or_default());
    }
}

pub fn sprint_results(races: &[Race]) {
    if races.is_empty() {
        println!("No sprint results");
    }
    for race in races {
        println!("{}", race_heading(race));
        classification(race.sprint_results.as_deref().unwrap_or_default());
    }
}

pub fn qualifying(races: &[Race]) {
    if races.is_empty() {
        println!("No qualifying results yet");
    }
    for race in races {
        println!("{}", race_heading(race));
        let results = race.qualifying_results.as_deref().unwrap_or_default();
        for result in sort_by_position(results) {
            println!(
                "  {:>5}  {:<26} {:<22} {}",
                ordinal(&result.position),
                driver_name(result.driver.as_ref()),
                constructor_name(result.constructor.as_ref()),
                result.best_time().unwrap_or(UNKNOWN)
            );
        }
    }
}

fn rating_label(rating: PitStopRating) -> &'static str {
    match rating {
        PitStopRating::Fast => "fast",
        PitStopRating::Good => "good",
        PitStopRating::Slow => "slow",
        PitStopRating::VerySlow => "very slow",
    }
}

pub fn pit_stops(race: &str, analytics: Option<&PitStopAnalytics>) {
    println!("{}", race);
    let Some(analytics) = analytics else {
        println!("  No pit stop data");
        return;
    };
    println!(
        "  {} stops, average {:.3}s, fastest {:.3}s by {} on lap {}",
        analytics.total_stops,
        analytics.average_stop_time,
        analytics.fastest_stop_duration,
        analytics.fastest_stop.driver_id,
        analytics.fastest_stop.lap
    );
    for stats in &analytics.driver_stats {
        println!(
            "  {:<20} {} stops  avg {:.3}s  best {:.3}s  worst {:.3}s",
            stats.driver_id,
            stats.total_stops,
            stats.average_duration,
            stats.fastest_stop,
            stats.slowest_stop
        );
        for stop in &stats.stops {
            let rating = stop_duration(stop)
                .map(PitStopRating::from_seconds)
                .map(rating_label)
                .unwrap_or(UNKNOWN);
            println!(
                "      stop {} lap {:>3}  {:>8}s  {}",
                stop.stop, stop.lap, stop.duration, rating
            );
        }
    }
}

pub fn lap_times(race: &str, analytics: Option<&LapTimeAnalytics>, driver: Option<&str>) {
    println!("{}", race);
    let Some(analytics) = analytics else {
        println!("  No lap time data");
        return;
    };
    println!(
        "  {} laps, {} drivers, fastest {}, average {}",
        analytics.total_laps,
        analytics.total_drivers,
        format_lap_time(analytics.overall_fastest),
        format_lap_time(analytics.overall_average)
    );
    for stats in analytics
        .driver_stats
        .iter()
        .filter(|stats| driver.is_none_or(|d| stats.driver_id == d))
    {
        println!(
            "  {:<20} {:>3} laps  best {}  avg {}  worst {}  stdev {:.3}s",
            stats.driver_id,
            stats.total_laps,
            format_lap_time(stats.fastest_lap),
            format_lap_time(stats.average_lap_time),
            format_lap_time(stats.slowest_lap),
            stats.consistency
        );
        if driver.is_some() {
            for time in &stats.lap_times {
                let lap = time.lap.map_or_else(|| UNKNOWN.to_string(), |n| n.to_string());
                println!("      lap {:>3}  {}", lap, format_lap_time(time.seconds));
            }
        }
    }
}

pub fn lap_leaderboard(lap: &str, board: &[LapPosition]) {
    println!("  Lap {}", lap);
    if board.is_empty() {
        println!("    No timings for this lap");
        return;
    }
    for position in board {
        let gap = if position.gap_to_fastest > 0. {
            format!("+{:.3}s", position.gap_to_fastest)
        } else {
            UNKNOWN.to_string()
        };
        println!(
            "    P{:<3} {:<20} {}  {}",
            position.timing.position,
            position.timing.driver_id,
            format_lap_time(position.seconds),
            gap
        );
    }
}

pub fn circuits(circuits: &[Circuit]) {
    for circuit in circuits {
        let (locality, country) = circuit
            .location
            .as_ref()
            .map(|l| (l.locality.as_str(), l.country.as_str()))
            .unwrap_or((UNKNOWN, UNKNOWN));
        println!(
            "{:<20} {:<40} {}, {}",
            circuit.circuit_id, circuit.circuit_name, locality, country
        );
    }
}

pub fn drivers(drivers: &[Driver], today: NaiveDate) {
    for driver in drivers {
        let age = driver
            .age(today)
            .map_or_else(|| UNKNOWN.to_string(), |age| age.to_string());
        println!(
            "{:>3}  {:<4} {:<26} {:<14} {:>3}",
            driver.permanent_number.as_deref().unwrap_or(UNKNOWN),
            driver.code.as_deref().unwrap_or(UNKNOWN),
            driver.full_name(),
            driver.nationality,
            age
        );
    }
}

pub fn constructors(constructors: &[Constructor]) {
    for constructor in constructors {
        println!(
            "{:<20} {:<26} {}",
            constructor.constructor_id, constructor.name, constructor.nationality
        );
    }
}

pub fn config(config: &AppConfig) {
    println!("base_url                {}", config.base_url);
    println!(
        "season                  {}",
        config.season.as_deref().unwrap_or("current year")
    );
    println!("refresh_interval_s      {}", config.refresh_interval_s);
    println!("revalidate_on_focus     {}", config.revalidate_on_focus);
    println!("revalidate_on_reconnect {}", config.revalidate_on_reconnect);
    match config.request_timeout_ms {
        Some(timeout) => println!("request_timeout_ms      {}", timeout),
        None => println!("request_timeout_ms      none"),
    }
    println!("upcoming_limit          {}", config.upcoming_limit);
}

pub fn statuses(statuses: &[Status]) {
    for status in statuses {
        println!("{:>4}  {:<24} {:>6}", status.status_id, status.status, status.count);
    }
}

pub fn season_statistics(season: &str, stats: &SeasonStatistics) {
    println!("Season {}", season);
    println!(
        "  Races: {} of {} run ({:.0}%), {} to go",
        stats.races.completed, stats.races.total, stats.races.progress, stats.races.upcoming
    );

    let drivers = &stats.drivers;
    println!(
        "  Drivers: {} ({} scored, {} won), {} points, {:.1} on average",
        drivers.total, drivers.with_points, drivers.with_wins, drivers.total_points, drivers.average_points
    );
    if let Some(leader) = &drivers.leader {
        println!(
            "  Leader: {} on {} pts, {} ahead",
            driver_name(leader.driver.as_ref()),
            leader.points,
            drivers.leader_gap
        );
    }
    if let Some(winner) = &drivers.most_wins {
        println!(
            "  Most wins: {} ({})",
            driver_name(winner.driver.as_ref()),
            winner.wins
        );
    }

    let constructors = &stats.constructors;
    println!(
        "  Constructors: {} ({} scored, {} won), {} points",
        constructors.total, constructors.with_points, constructors.with_wins, constructors.total_points
    );
    if let Some(leader) = &constructors.leader {
        println!(
            "  Leader: {} on {} pts",
            constructor_name(leader.constructor.as_ref()),
            leader.points
        );
    }
    if let Some(winner) = &constructors.most_wins {
        println!(
            "  Most wins: {} ({})",
            constructor_name(winner.constructor.as_ref()),
            winner.wins
        );
    }
}

pub fn race_label(race: Option<&Race>, season: &str, round: &str) -> String {
    match race {
        Some(race) => race_heading(race),
        None => format!("{} round {}", season, round),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_label_uses_known_race() {
        let race = Race {
            season: "2024".to_string(),
            round: "5".to_string(),
            race_name: "Chinese Grand Prix".to_string(),
            date: "2024-04-21".to_string(),
            ..Default::default()
        };
        assert_eq!(
            race_label(Some(&race), "2024", "5"),
            "Round 5 - Chinese Grand Prix (2024-04-21)"
        );
    }

    #[test]
    fn test_race_label_without_calendar() {
        assert_eq!(race_label(None, "2024", "5"), "2024 round 5");
    }
}
