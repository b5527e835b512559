use crate::model::{LogFilter, NewLogEntry, DEFAULT_LIMIT, MAX_LIMIT};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// First rule a request broke, with the path of the offending field
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

type Outcome<T> = std::result::Result<T, ValidationError>;

/// Validates a `POST /logs` body and computes the duration of every entry
pub fn validate_batch(body: &Value) -> Outcome<Vec<NewLogEntry>> {
    let items = body
        .as_array()
        .ok_or_else(|| ValidationError::new("body", "logs must be an array"))?;

    if items.is_empty() {
        return Err(ValidationError::new("body", "No logs provided"));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_entry(index, item))
        .collect()
}

fn validate_entry(index: usize, item: &Value) -> Outcome<NewLogEntry> {
    let object = item.as_object().ok_or_else(|| {
        ValidationError::new(format!("[{}]", index), "log entry must be an object")
    })?;

    let robot = required_string(object, index, "robot")?;
    let device_generation = required_string(object, index, "deviceGeneration")?;
    let start_time = required_date(object, index, "startTime")?;
    let end_time = required_date(object, index, "endTime")?;
    let lat = required_number(object, index, "lat")?;
    let lng = required_number(object, index, "lng")?;

    Ok(NewLogEntry::new(
        robot,
        device_generation,
        start_time,
        end_time,
        lat,
        lng,
    ))
}

/// Looks a field up, treating `null` and blank strings as missing
fn present<'a>(object: &'a Map<String, Value>, index: usize, name: &str) -> Outcome<&'a Value> {
    match object.get(name) {
        None | Some(Value::Null) => Err(missing(index, name)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing(index, name)),
        Some(value) => Ok(value),
    }
}

fn missing(index: usize, name: &str) -> ValidationError {
    ValidationError::new(path(index, name), format!("No {} provided", name))
}

fn path(index: usize, name: &str) -> String {
    format!("[{}].{}", index, name)
}

fn required_string(object: &Map<String, Value>, index: usize, name: &str) -> Outcome<String> {
    match present(object, index, name)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(ValidationError::new(
            path(index, name),
            format!("{} must be a string", name),
        )),
    }
}

fn required_date(
    object: &Map<String, Value>,
    index: usize,
    name: &str,
) -> Outcome<DateTime<Utc>> {
    let parsed = match present(object, index, name)? {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .and_then(storable),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ValidationError::new(path(index, name), format!("{} must be a valid date", name))
    })
}

fn required_number(object: &Map<String, Value>, index: usize, name: &str) -> Outcome<f64> {
    let parsed = match present(object, index, name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ValidationError::new(path(index, name), format!("{} must be a number", name))
    })
}

/// Accepts RFC 3339, naive date-times and plain dates; the last two are read as UTC
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        Some(dt.with_timezone(&Utc))
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Some(naive.and_utc())
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    };

    parsed.and_then(storable)
}

/// Keeps dates Postgres `timestamptz` can hold. Its upper bound (294276 AD)
/// lies past chrono's maximum, so only the lower one (4713 BC) is checked.
fn storable(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let earliest = NaiveDate::from_ymd_opt(-4712, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    (dt >= earliest).then_some(dt)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Validates the query string of `GET /logs`
pub fn validate_query(params: &HashMap<String, String>) -> Outcome<LogFilter> {
    // Blank values behave as if the parameter was not sent; others pass through untrimmed
    let param = |name: &str| {
        params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    };

    let min_duration = param("minDuration")
        .map(|raw| {
            parse_number(raw)
                .ok_or_else(|| ValidationError::new("minDuration", "minDuration must be a number"))
        })
        .transpose()?;

    let device_generation = param("deviceGeneration").map(str::to_string);

    let from = param("from")
        .map(|raw| {
            parse_date(raw).ok_or_else(|| ValidationError::new("from", "from must be a valid date"))
        })
        .transpose()?;

    let to = param("to")
        .map(|raw| {
            parse_date(raw).ok_or_else(|| ValidationError::new("to", "to must be a valid date"))
        })
        .transpose()?;

    let limit = match param("limit") {
        Some(raw) => parse_integer("limit", raw)?,
        None => DEFAULT_LIMIT,
    };
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::new(
            "limit",
            format!("limit must be between 1 and {}", MAX_LIMIT),
        ));
    }

    let offset = match param("offset") {
        Some(raw) => parse_integer("offset", raw)?,
        None => 0,
    };
    if offset < 0 {
        return Err(ValidationError::new(
            "offset",
            "offset must be greater than or equal to 0",
        ));
    }

    Ok(LogFilter {
        min_duration,
        device_generation,
        from,
        to,
        limit,
        offset,
    })
}

fn parse_integer(name: &str, raw: &str) -> Outcome<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new(name, format!("{} must be an integer", name)))
}
