//! Itinerary completeness rules
//!
//! A pure predicate over the structured record. Every required field must
//! satisfy its own rule; absent fields are incomplete, never an error.

use crate::conversation::Record;
use serde_json::Value;

/// Fields the oracle must fill before the itinerary is considered complete
pub const REQUIRED_FIELDS: [&str; 10] = [
    "Origin_city",
    "budget",
    "destination",
    "firstDestination",
    "food",
    "optimizeType",
    "time_schedule",
    "traveller_type",
    "trip_direction",
    "trip_theme",
];

const DESTINATION_FIELD: &str = "destination";
const SCHEDULE_FIELD: &str = "time_schedule";
const SCHEDULE_PARTS: [&str; 3] = ["duration", "onward_trip", "return_trip"];

/// True iff every required field is complete
pub fn is_complete(record: &Record) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|field| field_is_complete(field, record.get(*field)))
}

/// Required fields that are not yet complete, in declaration order
pub fn missing_fields(record: &Record) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !field_is_complete(field, record.get(*field)))
        .collect()
}

fn field_is_complete(field: &str, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return false;
    };

    match (field, value) {
        (DESTINATION_FIELD, Value::Array(items)) => !items.is_empty(),
        (SCHEDULE_FIELD, schedule) => {
            truthy(schedule)
                && SCHEDULE_PARTS
                    .iter()
                    .all(|part| schedule.get(*part).is_some_and(truthy))
        }
        (_, other) => has_content(other),
    }
}

/// Loose truthiness used for the schedule's sub-attributes: any object or
/// array counts, even an empty one.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
