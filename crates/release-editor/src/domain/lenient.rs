//! Shape-tolerant field decoders for the typed release views.
//!
//! The release document takes arbitrary path writes, so a field may hold
//! anything by the time a view is decoded. A value of the wrong shape reads
//! as the field's empty value and is left for field validation to report.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        _ => None,
    }
}

/// Text field; `null` and containers read as empty.
pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text(Value::deserialize(d)?).unwrap_or_default())
}

pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text(Value::deserialize(d)?))
}

/// List of text; anything but an array reads as empty.
pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().filter_map(text).collect(),
        _ => Vec::new(),
    })
}

pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(d)?.as_bool().unwrap_or(false))
}

/// Calendar date in `YYYY-MM-DD` form, `None` for anything else.
pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    Ok(Value::deserialize(d)?.as_str().and_then(parse_date))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Any nested value; falls back to `T::default()` when it does not decode.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

/// List whose entries decode one by one; an entry that does not decode
/// reads as `T::default()` so positions stay aligned with the document.
pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "string")]
        name: String,
        #[serde(deserialize_with = "strings")]
        tags: Vec<String>,
        #[serde(deserialize_with = "flag")]
        live: bool,
        #[serde(deserialize_with = "date")]
        on: Option<NaiveDate>,
        #[serde(deserialize_with = "list")]
        counts: Vec<u32>,
    }

    #[test]
    fn wrong_shapes_read_as_empty() {
        let sample: Sample = serde_json::from_value(json!({
            "name": null,
            "tags": "not a list",
            "live": "yes",
            "on": "next tuesday",
            "counts": [1, "two", 3]
        }))
        .unwrap();
        assert_eq!(sample.name, "");
        assert!(sample.tags.is_empty());
        assert!(!sample.live);
        assert_eq!(sample.on, None);
        assert_eq!(sample.counts, vec![1, 0, 3]);
    }

    #[test]
    fn well_formed_values_pass_through() {
        let sample: Sample = serde_json::from_value(json!({
            "name": "Wolf Sheep",
            "tags": ["abm", 7],
            "live": true,
            "on": "2030-05-01"
        }))
        .unwrap();
        assert_eq!(sample.name, "Wolf Sheep");
        assert_eq!(sample.tags, vec!["abm".to_string(), "7".to_string()]);
        assert!(sample.live);
        assert_eq!(sample.on, NaiveDate::from_ymd_opt(2030, 5, 1));
    }
}
