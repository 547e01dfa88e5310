// Resource paths and response envelope navigation

use serde::de::DeserializeOwned;
use serde_json::Value;
use snafu::ResultExt;

use crate::errors::{DecodeSnafu, PaddockError};

/// One step of the descent from the envelope root to the item array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Key(&'static str),
    Index(usize),
}

use Step::{Index, Key};

/// Resource kinds exposed by the upstream API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Races,
    DriverStandings,
    ConstructorStandings,
    Qualifying,
    Sprint,
    Results,
    PitStops,
    Laps,
    Circuits,
    Drivers,
    Constructors,
    Status,
}

/// Parameters that select a resource. Absent values are left out of the path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceQuery {
    pub season: Option<String>,
    pub round: Option<String>,
    pub lap: Option<String>,
}

impl ResourceQuery {
    pub fn season(season: impl Into<String>) -> Self {
        Self {
            season: Some(season.into()),
            ..Default::default()
        }
    }

    pub fn with_round(mut self, round: Option<impl Into<String>>) -> Self {
        self.round = round.map(Into::into);
        self
    }

    pub fn with_lap(mut self, lap: Option<impl Into<String>>) -> Self {
        self.lap = lap.map(Into::into);
        self
    }
}

impl Resource {
    /// Trailing path segment naming the resource.
    fn segment(&self) -> &'static str {
        match self {
            Resource::Races => "races",
            Resource::DriverStandings => "driverstandings",
            Resource::ConstructorStandings => "constructorstandings",
            Resource::Qualifying => "qualifying",
            Resource::Sprint => "sprint",
            Resource::Results => "results",
            Resource::PitStops => "pitstops",
            Resource::Laps => "laps",
            Resource::Circuits => "circuits",
            Resource::Drivers => "drivers",
            Resource::Constructors => "constructors",
            Resource::Status => "status",
        }
    }

    fn needs_season(&self) -> bool {
        !matches!(self, Resource::Circuits | Resource::Status)
    }

    fn needs_round(&self) -> bool {
        matches!(self, Resource::PitStops | Resource::Laps)
    }

    fn accepts_round(&self) -> bool {
        matches!(
            self,
            Resource::Qualifying
                | Resource::Sprint
                | Resource::Results
                | Resource::PitStops
                | Resource::Laps
        )
    }

    /// Where the item array lives inside the response envelope.
    pub fn items_path(&self) -> &'static [Step] {
        match self {
            Resource::Races | Resource::Qualifying | Resource::Sprint | Resource::Results => {
                &[Key("MRData"), Key("RaceTable"), Key("Races")]
            }
            Resource::DriverStandings => &[
                Key("MRData"),
                Key("StandingsTable"),
                Key("StandingsLists"),
                Index(0),
                Key("DriverStandings"),
            ],
            Resource::ConstructorStandings => &[
                Key("MRData"),
                Key("StandingsTable"),
                Key("StandingsLists"),
                Index(0),
                Key("ConstructorStandings"),
            ],
            Resource::PitStops => &[
                Key("MRData"),
                Key("RaceTable"),
                Key("Races"),
                Index(0),
                Key("PitStops"),
            ],
            Resource::Laps => &[
                Key("MRData"),
                Key("RaceTable"),
                Key("Races"),
                Index(0),
                Key("Laps"),
            ],
            Resource::Circuits => &[Key("MRData"), Key("CircuitTable"), Key("Circuits")],
            Resource::Drivers => &[Key("MRData"), Key("DriverTable"), Key("Drivers")],
            Resource::Constructors => &[
                Key("MRData"),
                Key("ConstructorTable"),
                Key("Constructors"),
            ],
            Resource::Status => &[Key("MRData"), Key("StatusTable"), Key("Status")],
        }
    }

    /// Builds the path below the base URL, e.g. `/2024/5/laps/12`.
    pub fn path(&self, query: &ResourceQuery) -> Result<String, PaddockError> {
        let mut path = String::new();
        if self.needs_season() {
            let season = required(query.season.as_deref(), "season")?;
            path.push('/');
            path.push_str(season);
        }
        if self.accepts_round() {
            match query.round.as_deref() {
                Some(round) => {
                    path.push('/');
                    path.push_str(validated(round, "round")?);
                }
                None if self.needs_round() => {
                    required(None, "round")?;
                }
                None => {}
            }
        }
        path.push('/');
        path.push_str(self.segment());
        if *self == Resource::Laps
            && let Some(lap) = query.lap.as_deref()
        {
            path.push('/');
            path.push_str(validated(lap, "lap")?);
        }
        Ok(path)
    }
}

fn required<'q>(value: Option<&'q str>, field: &str) -> Result<&'q str, PaddockError> {
    match value {
        Some(value) => validated(value, field),
        None => Err(PaddockError::InvalidUserInput {
            field: field.to_string(),
            reason: "value is required for this resource".to_string(),
        }),
    }
}

fn validated<'q>(value: &'q str, field: &str) -> Result<&'q str, PaddockError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PaddockError::InvalidUserInput {
            field: field.to_string(),
            reason: format!("'{}' is not a valid path segment", value),
        });
    }
    Ok(value)
}

/// Walks `path` into `body`, returning the array found at the end. Any missing
/// key, missing index, or non-array leaf yields `None`.
pub fn descend(mut body: Value, path: &[Step]) -> Option<Vec<Value>> {
    for step in path {
        body = match (step, body) {
            (Key(key), Value::Object(mut map)) => map.remove(*key)?,
            (Index(index), Value::Array(mut items)) if *index < items.len() => {
                items.swap_remove(*index)
            }
            _ => return None,
        };
    }
    match body {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Decodes the item array of a response body, defaulting to empty when the
/// envelope does not contain it.
pub fn items<T: DeserializeOwned>(
    body: Value,
    path: &[Step],
    url: &str,
) -> Result<Vec<T>, PaddockError> {
    match descend(body, path) {
        Some(items) => serde_json::from_value(Value::Array(items)).context(DecodeSnafu { url }),
        None => {
            log::debug!("No items at {:?} in response from {}", path, url);
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DriverStanding, PitStop};
    use serde_json::json;

    #[test]
    fn test_paths_omit_absent_parameters() {
        let season = ResourceQuery::season("2024");
        assert_eq!(Resource::Races.path(&season).unwrap(), "/2024/races");
        assert_eq!(
            Resource::Qualifying.path(&season).unwrap(),
            "/2024/qualifying"
        );
        assert_eq!(
            Resource::Results
                .path(&season.clone().with_round(Some("5")))
                .unwrap(),
            "/2024/5/results"
        );
        assert_eq!(
            Resource::Laps
                .path(&season.clone().with_round(Some("5")).with_lap(Some("12")))
                .unwrap(),
            "/2024/5/laps/12"
        );
        assert_eq!(
            Resource::Laps
                .path(&season.clone().with_round(Some("5")))
                .unwrap(),
            "/2024/5/laps"
        );
        assert_eq!(
            Resource::Circuits.path(&ResourceQuery::default()).unwrap(),
            "/circuits"
        );
        assert_eq!(
            Resource::Status.path(&ResourceQuery::default()).unwrap(),
            "/status"
        );
    }

    #[test]
    fn test_round_ignored_for_season_resources() {
        let query = ResourceQuery::season("2023").with_round(Some("3"));
        assert_eq!(
            Resource::DriverStandings.path(&query).unwrap(),
            "/2023/driverstandings"
        );
    }

    #[test]
    fn test_missing_required_parameters_rejected() {
        let err = Resource::PitStops
            .path(&ResourceQuery::season("2024"))
            .unwrap_err();
        assert!(matches!(err, PaddockError::InvalidUserInput { ref field, .. } if field == "round"));

        let err = Resource::Races.path(&ResourceQuery::default()).unwrap_err();
        assert!(matches!(err, PaddockError::InvalidUserInput { ref field, .. } if field == "season"));
    }

    #[test]
    fn test_path_segments_validated() {
        let query = ResourceQuery::season("2024/../x");
        assert!(Resource::Races.path(&query).is_err());
        assert!(
            Resource::Races
                .path(&ResourceQuery::season("current"))
                .is_ok()
        );
    }

    #[test]
    fn test_descend_through_index() {
        let body = json!({
            "MRData": {"RaceTable": {"Races": [
                {"PitStops": [{"driverId": "hamilton", "duration": "2.3"}]}
            ]}}
        });
        let stops: Vec<PitStop> = items(body, Resource::PitStops.items_path(), "test").unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].driver_id, "hamilton");
    }

    #[test]
    fn test_missing_keys_yield_empty() {
        let path = Resource::DriverStandings.items_path();
        let bodies = [
            json!({}),
            json!({"MRData": {}}),
            json!({"MRData": {"StandingsTable": {}}}),
            json!({"MRData": {"StandingsTable": {"StandingsLists": []}}}),
            json!({"MRData": {"StandingsTable": {"StandingsLists": [{}]}}}),
            json!({"MRData": {"StandingsTable": {"StandingsLists": [{"DriverStandings": null}]}}}),
            json!({"MRData": "unexpected"}),
            json!([]),
        ];
        for body in bodies {
            let standings: Vec<DriverStanding> = items(body.clone(), path, "test").unwrap();
            assert!(standings.is_empty(), "expected empty for {}", body);
        }
    }

    #[test]
    fn test_mistyped_items_are_decode_errors() {
        let body = json!({"MRData": {"StatusTable": {"Status": [42]}}});
        let result: Result<Vec<crate::api::types::Status>, _> =
            items(body, Resource::Status.items_path(), "test");
        assert!(matches!(result, Err(PaddockError::Decode { .. })));
    }
}
