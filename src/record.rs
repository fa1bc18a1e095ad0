//! Parsed station feeds.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::FailureKind;

/// A scalar reading as the service reported it.
///
/// Most readings are numbers, but the service uses text such as `"-"` when a
/// station has no current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            other => Some(FieldValue::Text(other.to_string())),
        }
    }

    /// Numeric view of the value, parsing text when it looks like a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Individual pollutant and weather readings, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    CarbonMonoxide,
    NitrogenDioxide,
    Ozone,
    Pm10,
    Pm25,
    SulphurDioxide,
    Wind,
    Temperature,
    Rain,
    Humidity,
    Dew,
    Pressure,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::CarbonMonoxide,
        Metric::NitrogenDioxide,
        Metric::Ozone,
        Metric::Pm10,
        Metric::Pm25,
        Metric::SulphurDioxide,
        Metric::Wind,
        Metric::Temperature,
        Metric::Rain,
        Metric::Humidity,
        Metric::Dew,
        Metric::Pressure,
    ];

    /// Key of the reading under `data.iaqi` in a feed response.
    pub fn code(self) -> &'static str {
        match self {
            Metric::CarbonMonoxide => "co",
            Metric::NitrogenDioxide => "no2",
            Metric::Ozone => "o3",
            Metric::Pm10 => "pm10",
            Metric::Pm25 => "pm25",
            Metric::SulphurDioxide => "so2",
            Metric::Wind => "w",
            Metric::Temperature => "t",
            Metric::Rain => "r",
            Metric::Humidity => "h",
            Metric::Dew => "d",
            Metric::Pressure => "p",
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub metric: Metric,
    pub value: FieldValue,
}

/// A successfully parsed feed for one monitoring station.
///
/// Only the station name and aggregate index are mandatory; every other
/// reading is included when the response carries it and omitted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i64>,
    pub station: String,
    pub aqi: FieldValue,
    pub readings: Vec<Reading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl StationRecord {
    /// Builds a record from the `data` payload of a successful feed envelope.
    pub fn from_feed_data(data: &Value) -> Result<Self, FailureKind> {
        let station = FieldValue::from_json(&data["city"]["name"])
            .map(|v| v.to_string())
            .ok_or_else(|| FailureKind::MalformedEnvelope("missing station name".into()))?;

        let aqi = FieldValue::from_json(&data["aqi"])
            .ok_or_else(|| FailureKind::MalformedEnvelope("missing aqi".into()))?;

        let readings = Metric::ALL
            .iter()
            .filter_map(|&metric| {
                FieldValue::from_json(&data["iaqi"][metric.code()]["v"])
                    .map(|value| Reading { metric, value })
            })
            .collect();

        let time = FieldValue::from_json(&data["time"]["s"]).map(|v| v.to_string());

        Ok(Self {
            station_id: data["idx"].as_i64(),
            station,
            aqi,
            readings,
            time,
        })
    }

    pub fn reading(&self, metric: Metric) -> Option<&FieldValue> {
        self.readings
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| &r.value)
    }
}
