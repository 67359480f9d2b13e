use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// All backend primary keys are integer serials.
pub type DbId = i64;

/// Wire format for dates sent to the backend.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Lenient decoding
// ---------------------------------------------------------------------------
//
// Aggregates computed by the backend's SQL layer arrive either as JSON numbers
// or as numeric strings (bigint/numeric columns), and date columns arrive
// either as `YYYY-MM-DD` or as a full ISO-8601 timestamp.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Decode an integer counter from a number, a numeric string, or `null` (0).
pub fn de_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(NumberOrString::Int(n)) => Ok(n),
        Some(NumberOrString::Float(f)) => Ok(f.round() as i64),
        Some(NumberOrString::Str(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f.round() as i64))
                .map_err(|_| D::Error::custom(format!("invalid counter value '{s}'")))
        }
    }
}

/// Decode a ratio/percentage from a number, a numeric string, or `null` (0.0).
pub fn de_ratio<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrString::Int(n)) => Ok(n as f64),
        Some(NumberOrString::Float(f)) => Ok(f),
        Some(NumberOrString::Str(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .map_err(|_| D::Error::custom(format!("invalid numeric value '{s}'")))
        }
    }
}

/// Parse a calendar date from `YYYY-MM-DD` or an ISO-8601 timestamp
/// (`2025-03-02T00:00:00.000Z`). Only the date part is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Serde adapter for [`parse_date`].
pub fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
}
