//! Built-in dynamic variables
//!
//! `{{$uuid}}`, `{{$timestamp}}` and friends generate a fresh value when
//! first referenced; the store caches the value so repeated references in
//! one request resolve identically.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

/// Generates the value for a built-in dynamic variable, or `None` when the
/// name is not a known built-in.
#[must_use]
pub fn generate(name: &str) -> Option<String> {
    match name {
        "$uuid" | "$randomUuid" | "$guid" => Some(Uuid::new_v4().to_string()),
        "$timestamp" => Some(Utc::now().timestamp().to_string()),
        "$isoTimestamp" => Some(Utc::now().to_rfc3339()),
        "$randomInt" => Some(rand::rng().random_range(0..=1000).to_string()),
        "$date" => Some(Utc::now().format("%Y-%m-%d").to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_is_valid() {
        let value = generate("$uuid").unwrap();
        assert!(Uuid::parse_str(&value).is_ok());
    }

    #[test]
    fn test_guid_alias() {
        assert!(generate("$guid").is_some());
    }

    #[test]
    fn test_timestamp_is_numeric() {
        let value = generate("$timestamp").unwrap();
        assert!(value.parse::<i64>().is_ok());
    }

    #[test]
    fn test_random_int_in_range() {
        let value: u32 = generate("$randomInt").unwrap().parse().unwrap();
        assert!(value <= 1000);
    }

    #[test]
    fn test_unknown_builtin() {
        assert_eq!(generate("$nope"), None);
        assert_eq!(generate("uuid"), None);
    }
}
