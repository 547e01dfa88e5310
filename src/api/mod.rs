pub mod envelope;
pub mod source;
pub mod types;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Datelike, Utc};
use serde::de::DeserializeOwned;

use crate::{PaddockError, calendar};

pub use envelope::{Resource, ResourceQuery};
pub use source::{HttpSource, JsonSource};
pub use types::*;

/// Base URL compiled into the binary, overridable at build time.
pub const DEFAULT_BASE_URL: &str = match option_env!("PADDOCK_BASE_URL") {
    Some(url) => url,
    None => "https://api.jolpi.ca/ergast/f1",
};

pub const DEFAULT_UPCOMING_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    /// No timeout by default: a request waits until it completes or is
    /// superseded.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// Read-only client for the championship statistics API. Every call is an
/// independent GET; nothing is cached or retried.
#[derive(Debug)]
pub struct ErgastClient<S = HttpSource> {
    source: Arc<S>,
    base_url: String,
}

impl<S> Clone for ErgastClient<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            base_url: self.base_url.clone(),
        }
    }
}

impl ErgastClient<HttpSource> {
    pub fn new(config: &ClientConfig) -> Result<Self, PaddockError> {
        Ok(Self::with_source(
            HttpSource::new(config.timeout)?,
            &config.base_url,
        ))
    }
}

impl<S: JsonSource> ErgastClient<S> {
    pub fn with_source(source: S, base_url: &str) -> Self {
        Self {
            source: Arc::new(source),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, resource: Resource, query: &ResourceQuery) -> Result<String, PaddockError> {
        Ok(format!("{}{}", self.base_url, resource.path(query)?))
    }

    /// GETs the resource and returns the items found in its envelope.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ResourceQuery,
    ) -> Result<Vec<T>, PaddockError> {
        let url = self.url(resource, query)?;
        let body = self.source.get_json(&url).await?;
        envelope::items(body, resource.items_path(), &url)
    }

    pub async fn races_by_year(&self, season: &str) -> Result<Vec<Race>, PaddockError> {
        self.fetch(Resource::Races, &ResourceQuery::season(season))
            .await
    }

    /// First race of `now`'s season that has not started yet, falling back to
    /// the season opener once the calendar is exhausted.
    pub async fn current_race(&self, now: DateTime<Utc>) -> Result<Option<Race>, PaddockError> {
        let races = self.races_by_year(&now.year().to_string()).await?;
        Ok(calendar::next_race(&races, now)
            .or(races.first())
            .cloned())
    }

    pub async fn upcoming_races(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Race>, PaddockError> {
        let races = self.races_by_year(&now.year().to_string()).await?;
        Ok(calendar::upcoming_races(&races, now)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    pub async fn driver_standings(
        &self,
        season: &str,
    ) -> Result<Vec<DriverStanding>, PaddockError> {
        self.fetch(Resource::DriverStandings, &ResourceQuery::season(season))
            .await
    }

    pub async fn constructor_standings(
        &self,
        season: &str,
    ) -> Result<Vec<ConstructorStanding>, PaddockError> {
        self.fetch(
            Resource::ConstructorStandings,
            &ResourceQuery::season(season),
        )
        .await
    }

    pub async fn qualifying_results(
        &self,
        season: &str,
        round: Option<&str>,
    ) -> Result<Vec<Race>, PaddockError> {
        self.fetch(
            Resource::Qualifying,
            &ResourceQuery::season(season).with_round(round),
        )
        .await
    }

    pub async fn sprint_results(
        &self,
        season: &str,
        round: Option<&str>,
    ) -> Result<Vec<Race>, PaddockError> {
        self.fetch(
            Resource::Sprint,
            &ResourceQuery::season(season).with_round(round),
        )
        .await
    }

    pub async fn race_results(
        &self,
        season: &str,
        round: Option<&str>,
    ) -> Result<Vec<Race>, PaddockError> {
        self.fetch(
            Resource::Results,
            &ResourceQuery::season(season).with_round(round),
        )
        .await
    }

    pub async fn pit_stops(&self, season: &str, round: &str) -> Result<Vec<PitStop>, PaddockError> {
        self.fetch(
            Resource::PitStops,
            &ResourceQuery::season(season).with_round(Some(round)),
        )
        .await
    }

    pub async fn lap_times(
        &self,
        season: &str,
        round: &str,
        lap: Option<&str>,
    ) -> Result<Vec<Lap>, PaddockError> {
        self.fetch(
            Resource::Laps,
            &ResourceQuery::season(season)
                .with_round(Some(round))
                .with_lap(lap),
        )
        .await
    }

    pub async fn circuits(&self) -> Result<Vec<Circuit>, PaddockError> {
        self.fetch(Resource::Circuits, &ResourceQuery::default())
            .await
    }

    pub async fn drivers(&self, season: &str) -> Result<Vec<Driver>, PaddockError> {
        self.fetch(Resource::Drivers, &ResourceQuery::season(season))
            .await
    }

    pub async fn constructors(&self, season: &str) -> Result<Vec<Constructor>, PaddockError> {
        self.fetch(Resource::Constructors, &ResourceQuery::season(season))
            .await
    }

    pub async fn status(&self) -> Result<Vec<Status>, PaddockError> {
        self.fetch(Resource::Status, &ResourceQuery::default())
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticSource;
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const BASE: &str = "https://stats.test/f1";

    fn client() -> (ErgastClient<StaticSource>, StaticSource) {
        let source = StaticSource::default();
        (
            ErgastClient::with_source(source.clone(), &format!("{}/", BASE)),
            source,
        )
    }

    fn season_2024() -> serde_json::Value {
        json!({"MRData": {"RaceTable": {"season": "2024", "Races": [
            {"season": "2024", "round": "1", "raceName": "Bahrain Grand Prix", "date": "2024-03-02", "time": "15:00:00Z"},
            {"season": "2024", "round": "2", "raceName": "Saudi Arabian Grand Prix", "date": "2024-03-09", "time": "17:00:00Z"},
            {"season": "2024", "round": "3", "raceName": "Australian Grand Prix", "date": "2024-03-24", "time": "04:00:00Z"},
            {"season": "2024", "round": "4", "raceName": "Japanese Grand Prix", "date": "2024-04-07", "time": "05:00:00Z"}
        ]}}})
    }

    #[tokio::test]
    async fn test_races_by_year_unwraps_envelope() {
        let (client, source) = client();
        source.respond(&format!("{}/2024/races", BASE), season_2024());

        let races = client.races_by_year("2024").await.unwrap();
        assert_eq!(races.len(), 4);
        assert_eq!(races[0].race_name, "Bahrain Grand Prix");
        assert_eq!(
            source.requests.lock().unwrap().as_slice(),
            &[format!("{}/2024/races", BASE)]
        );
    }

    #[tokio::test]
    async fn test_missing_envelope_key_is_empty_not_error() {
        let (client, source) = client();
        source.respond(
            &format!("{}/2024/driverstandings", BASE),
            json!({"MRData": {"StandingsTable": {"StandingsLists": []}}}),
        );
        source.respond(&format!("{}/2024/5/pitstops", BASE), json!({"MRData": {}}));

        assert!(client.driver_standings("2024").await.unwrap().is_empty());
        assert!(client.pit_stops("2024", "5").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_failure_surfaces_status() {
        let (client, source) = client();
        source.fail(&format!("{}/2024/constructorstandings", BASE), 500);

        let err = client.constructor_standings("2024").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn test_lap_times_path_includes_lap() {
        let (client, source) = client();
        source.respond(
            &format!("{}/2024/5/laps/3", BASE),
            json!({"MRData": {"RaceTable": {"Races": [{"Laps": [
                {"number": "3", "Timings": [{"driverId": "verstappen", "position": "1", "time": "1:35.123"}]}
            ]}]}}}),
        );

        let laps = client.lap_times("2024", "5", Some("3")).await.unwrap();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].timings[0].driver_id, "verstappen");
    }

    #[tokio::test]
    async fn test_invalid_parameters_never_hit_the_network() {
        let (client, source) = client();
        assert!(client.pit_stops("2024", "").await.is_err());
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_current_and_upcoming_races() {
        let (client, source) = client();
        source.respond(&format!("{}/2024/races", BASE), season_2024());

        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let current = client.current_race(now).await.unwrap().unwrap();
        assert_eq!(current.round, "3");

        let upcoming = client.upcoming_races(now, 1).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].round, "3");

        let after_season = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let current = client.current_race(after_season).await.unwrap().unwrap();
        assert_eq!(current.round, "1");
        assert!(
            client
                .upcoming_races(after_season, 3)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
