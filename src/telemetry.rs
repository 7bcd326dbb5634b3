// src/telemetry.rs
//
// Lenient schema for the raw telemetry record sent by the bridge.
//
// Every leaf is optional and parsed through a helper that captures the
// JSON value first and converts second, so a missing or wrong-typed
// field degrades to `None` instead of failing the whole record. The
// normalizer (src/observation.rs) owns the defaults-on-absence policy;
// this module only gets the payload into typed form without ever
// raising on peer data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Deserialize a field as `Some(T)` when it is present and well-typed,
/// `None` otherwise. Never errors on a decodable JSON document.
fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = JsonValue::deserialize(de)?;
    Ok(serde_json::from_value(value).ok())
}

/// A world coordinate as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default, deserialize_with = "lenient")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub plane: Option<f64>,
}

/// One nearby NPC as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNpc {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub animation: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
}

/// One inventory item as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<i64>,
}

/// One ground item stack as sent on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGroundItem {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<RawLocation>,
}

/// The full telemetry record.
///
/// `status`/`message` double as the error channel: the transport client
/// synthesises `{status: "error", message}` records for timeouts and
/// channel failures, and the plugin itself may reply with one.
///
/// List fields stay as raw JSON values here; the normalizer converts
/// them element by element so one malformed element skips only its own
/// slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTelemetry {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub player_current_health: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_max_health: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_current_prayer: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_max_prayer: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_run_energy_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_animation: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub player_location: Option<RawLocation>,

    #[serde(default, deserialize_with = "lenient")]
    pub nearby_npcs: Option<Vec<JsonValue>>,
    #[serde(default, deserialize_with = "lenient")]
    pub inventory: Option<Vec<JsonValue>>,
    #[serde(default, deserialize_with = "lenient")]
    pub nearby_ground_items: Option<Vec<JsonValue>>,
}

impl RawTelemetry {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

/// A parsed telemetry record together with the untouched payload.
///
/// The raw value rides along into the step info for diagnostics; the
/// control path only ever reads the parsed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub record: RawTelemetry,
    pub raw: JsonValue,
}

impl TelemetryFrame {
    /// Parse a decoded JSON reply. A non-object payload yields an
    /// error-status record; the raw value is preserved either way.
    pub fn from_value(value: JsonValue) -> Self {
        match serde_json::from_value::<RawTelemetry>(value.clone()) {
            Ok(record) => Self { record, raw: value },
            Err(err) => Self {
                record: RawTelemetry {
                    status: Some("error".to_string()),
                    message: Some(format!("telemetry payload is not a record: {err}")),
                    ..RawTelemetry::default()
                },
                raw: value,
            },
        }
    }

    /// Synthesise an error frame for a transport-level failure.
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            record: RawTelemetry {
                status: Some("error".to_string()),
                message: Some(message.into()),
                ..RawTelemetry::default()
            },
            raw: JsonValue::Null,
        }
    }

    /// Synthesise an error frame for an undecodable reply, keeping the
    /// raw text for diagnostics.
    pub fn malformed(message: impl Into<String>, raw_text: &str) -> Self {
        Self {
            record: RawTelemetry {
                status: Some("error".to_string()),
                message: Some(message.into()),
                ..RawTelemetry::default()
            },
            raw: JsonValue::String(raw_text.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.record.is_error()
    }
}
