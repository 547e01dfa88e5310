// Record types for the championship statistics API.
//
// The upstream API sends every number as a string and omits fields freely, so
// every record defaults missing fields instead of failing to decode.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Race {
    #[serde(deserialize_with = "null_as_default")]
    pub season: String,
    #[serde(deserialize_with = "null_as_default")]
    pub round: String,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Option<Circuit>,
    /// ISO date, `YYYY-MM-DD`
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    /// UTC time, `HH:MM:SSZ`
    pub time: Option<String>,
    #[serde(rename = "FirstPractice")]
    pub first_practice: Option<Session>,
    #[serde(rename = "SecondPractice")]
    pub second_practice: Option<Session>,
    #[serde(rename = "ThirdPractice")]
    pub third_practice: Option<Session>,
    #[serde(rename = "Qualifying")]
    pub qualifying: Option<Session>,
    #[serde(rename = "SprintQualifying")]
    pub sprint_qualifying: Option<Session>,
    #[serde(rename = "Sprint")]
    pub sprint: Option<Session>,
    #[serde(rename = "Results")]
    pub results: Option<Vec<RaceResult>>,
    #[serde(rename = "QualifyingResults")]
    pub qualifying_results: Option<Vec<QualifyingResult>>,
    #[serde(rename = "SprintResults")]
    pub sprint_results: Option<Vec<SprintResult>>,
}

impl Race {
    pub fn has_sprint(&self) -> bool {
        self.sprint.is_some()
    }

    pub fn country(&self) -> Option<&str> {
        self.circuit
            .as_ref()
            .and_then(|c| c.location.as_ref())
            .map(|l| l.country.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    pub time: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Circuit {
    #[serde(deserialize_with = "null_as_default")]
    pub circuit_id: String,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub circuit_name: String,
    #[serde(rename = "Location")]
    pub location: Option<Location>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "null_as_default")]
    pub lat: String,
    #[serde(deserialize_with = "null_as_default")]
    pub long: String,
    #[serde(deserialize_with = "null_as_default")]
    pub locality: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Driver {
    #[serde(deserialize_with = "null_as_default")]
    pub driver_id: String,
    pub permanent_number: Option<String>,
    pub code: Option<String>,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub given_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub family_name: String,
    pub date_of_birth: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub nationality: String,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_string()
    }

    /// Age in whole years on `today`, when the birth date is known.
    pub fn age(&self, today: NaiveDate) -> Option<u32> {
        let born = NaiveDate::parse_from_str(self.date_of_birth.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        today.years_since(born)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constructor {
    #[serde(deserialize_with = "null_as_default")]
    pub constructor_id: String,
    pub url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nationality: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RaceResult {
    #[serde(deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub points: String,
    #[serde(rename = "Driver")]
    pub driver: Option<Driver>,
    #[serde(rename = "Constructor")]
    pub constructor: Option<Constructor>,
    #[serde(deserialize_with = "null_as_default")]
    pub grid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub laps: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(rename = "Time")]
    pub time: Option<ResultTime>,
    #[serde(rename = "FastestLap")]
    pub fastest_lap: Option<FastestLap>,
}

/// Sprint classifications share the race result layout.
pub type SprintResult = RaceResult;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifyingResult {
    #[serde(deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(rename = "Driver")]
    pub driver: Option<Driver>,
    #[serde(rename = "Constructor")]
    pub constructor: Option<Constructor>,
    #[serde(rename = "Q1")]
    pub q1: Option<String>,
    #[serde(rename = "Q2")]
    pub q2: Option<String>,
    #[serde(rename = "Q3")]
    pub q3: Option<String>,
}

impl QualifyingResult {
    /// Best lap from the latest session the driver took part in.
    pub fn best_time(&self) -> Option<&str> {
        [self.q3.as_deref(), self.q2.as_deref(), self.q1.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultTime {
    pub millis: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastestLap {
    pub rank: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub lap: String,
    #[serde(rename = "Time")]
    pub time: Option<ResultTime>,
    #[serde(rename = "AverageSpeed")]
    pub average_speed: Option<AverageSpeed>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AverageSpeed {
    #[serde(deserialize_with = "null_as_default")]
    pub units: String,
    #[serde(deserialize_with = "null_as_default")]
    pub speed: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PitStop {
    #[serde(deserialize_with = "null_as_default")]
    pub driver_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lap: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stop: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    /// Seconds, e.g. `"23.456"`
    #[serde(deserialize_with = "null_as_default")]
    pub duration: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lap {
    #[serde(deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(rename = "Timings")]
    #[serde(deserialize_with = "null_as_default")]
    pub timings: Vec<Timing>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timing {
    #[serde(deserialize_with = "null_as_default")]
    pub driver_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    /// `M:SS.mmm`
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverStanding {
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub points: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wins: String,
    #[serde(rename = "Driver")]
    pub driver: Option<Driver>,
    #[serde(rename = "Constructors")]
    #[serde(deserialize_with = "null_as_default")]
    pub constructors: Vec<Constructor>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstructorStanding {
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub points: String,
    #[serde(deserialize_with = "null_as_default")]
    pub wins: String,
    #[serde(rename = "Constructor")]
    pub constructor: Option<Constructor>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Status {
    #[serde(deserialize_with = "null_as_default")]
    pub status_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub count: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}
