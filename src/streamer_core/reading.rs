//! Decoding of event payloads into readings

use crate::aggregator_core::Reading;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Malformed(String),
    NotAnObject,
    MissingField(&'static str),
    NotNumeric { field: &'static str, value: String },
    NotFinite { field: &'static str },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Malformed(msg) => write!(f, "Malformed payload: {}", msg),
            DecodeError::NotAnObject => write!(f, "Payload is not a JSON object"),
            DecodeError::MissingField(field) => write!(f, "Missing field: {}", field),
            DecodeError::NotNumeric { field, value } => {
                write!(f, "Field {} is not numeric: {}", field, value)
            }
            DecodeError::NotFinite { field } => write!(f, "Field {} is not finite", field),
        }
    }
}

impl std::error::Error for DecodeError {}

impl Reading {
    /// Decode one event's data payload.
    ///
    /// `temperature` and `humidity` may be JSON numbers or numeric strings
    /// (the upstream formats them with `toFixed`). Every other field is kept
    /// in `extra`.
    pub fn decode(data: &str) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let mut fields = match value {
            Value::Object(fields) => fields,
            _ => return Err(DecodeError::NotAnObject),
        };

        let temperature = take_metric(&mut fields, "temperature")?;
        let humidity = take_metric(&mut fields, "humidity")?;

        Ok(Reading {
            temperature,
            humidity,
            extra: fields,
        })
    }
}

fn take_metric(fields: &mut Map<String, Value>, field: &'static str) -> Result<f64, DecodeError> {
    let raw = fields.remove(field).ok_or(DecodeError::MissingField(field))?;

    let number = match &raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| DecodeError::NotNumeric {
        field,
        value: raw.to_string(),
    })?;

    if !number.is_finite() {
        return Err(DecodeError::NotFinite { field });
    }

    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_upstream_payload() {
        let data = r#"{"id":3,"timestamp":"2024-05-01T10:00:00.000Z","temperature":"23.45","humidity":"41.07"}"#;

        let reading = Reading::decode(data).unwrap();

        assert_eq!(reading.temperature, 23.45);
        assert_eq!(reading.humidity, 41.07);
        assert_eq!(reading.extra.get("id"), Some(&json!(3)));
        assert_eq!(
            reading.extra.get("timestamp"),
            Some(&json!("2024-05-01T10:00:00.000Z"))
        );
        assert!(!reading.extra.contains_key("temperature"));
    }

    #[test]
    fn test_decode_plain_numbers() {
        let reading = Reading::decode(r#"{"temperature":20,"humidity":50.5}"#).unwrap();

        assert_eq!(reading, Reading::new(20.0, 50.5));
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        let err = Reading::decode(r#"{"temperature":"abc","humidity":50}"#).unwrap_err();

        assert_eq!(
            err,
            DecodeError::NotNumeric {
                field: "temperature",
                value: "\"abc\"".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        assert_eq!(
            Reading::decode(r#"{"temperature":21}"#).unwrap_err(),
            DecodeError::MissingField("humidity")
        );
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(matches!(
            Reading::decode("{not json"),
            Err(DecodeError::Malformed(_))
        ));
        assert_eq!(Reading::decode("[1,2]").unwrap_err(), DecodeError::NotAnObject);
        assert!(matches!(
            Reading::decode(r#"{"temperature":null,"humidity":1}"#),
            Err(DecodeError::NotNumeric { .. })
        ));
        assert!(matches!(
            Reading::decode(r#"{"temperature":true,"humidity":1}"#),
            Err(DecodeError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_non_finite_strings() {
        assert_eq!(
            Reading::decode(r#"{"temperature":"NaN","humidity":1}"#).unwrap_err(),
            DecodeError::NotFinite { field: "temperature" }
        );
        assert_eq!(
            Reading::decode(r#"{"temperature":1,"humidity":"inf"}"#).unwrap_err(),
            DecodeError::NotFinite { field: "humidity" }
        );
    }
}
