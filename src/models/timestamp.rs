// ============================================================================
// Module : timestamp (serde helper)
// ============================================================================
// Le backend n'est pas constant sur le format des dates :
// - RFC 3339 avec offset ("2024-01-15T10:00:00+00:00")
// - ISO naïf sans offset ("2024-01-15T10:00:00.123456"), en UTC
// - epoch en millisecondes (1705316400000)
//
// On accepte les trois en lecture, on écrit toujours du RFC 3339.
// Usage : #[serde(with = "crate::models::timestamp")]
// ============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Représentations brutes possibles d'une date sur le fil
///
/// CONCEPT SERDE : #[serde(untagged)]
/// - Serde essaie chaque variant dans l'ordre
/// - Un entier JSON tombe dans Millis, une chaîne dans Text
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

/// Parse une date texte (RFC 3339 ou ISO naïf interprété en UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
        RawTimestamp::FractionalMillis(ms) => DateTime::from_timestamp_millis(ms as i64)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", ms))),
        RawTimestamp::Text(text) => parse_timestamp(&text).map_err(D::Error::custom),
    }
}
