//! Reading and Summary types exposed to readers

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

/// One decoded sensor event
///
/// `extra` carries every payload field other than the two metrics so the
/// latest reading can be echoed back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Latest reading plus rolling averages at one point in time
///
/// `window_len == 0` means nothing has been appended yet; all numeric
/// fields are zero in that state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub latest: Reading,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub window_len: usize,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.window_len == 0
    }
}

impl Serialize for Summary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The pre-data body is flat; once readings arrive it nests `latest`
        let mut map = serializer.serialize_map(Some(if self.is_empty() { 4 } else { 3 }))?;
        if self.is_empty() {
            map.serialize_entry("temperature", &0)?;
            map.serialize_entry("humidity", &0)?;
            map.serialize_entry("avg_temp", &0)?;
            map.serialize_entry("avg_hum", &0)?;
        } else {
            map.serialize_entry("latest", &self.latest)?;
            map.serialize_entry("avg_temp", &self.avg_temperature)?;
            map.serialize_entry("avg_hum", &self.avg_humidity)?;
        }
        map.end()
    }
}

/// Round to two decimal places, ties to even.
///
/// The tie is judged on `value * 100.0`, so means such as 0.125 or 0.375
/// that are exact in binary round to 0.12 and 0.38. Values too large to
/// scale have no fractional part and are returned unchanged.
pub fn round_half_even(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / 100.0
}
