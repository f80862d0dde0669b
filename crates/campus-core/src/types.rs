//! Wire types shared between the chat client and the campus backend.

use serde::{Deserialize, Serialize};

use crate::error::{CampusError, Result};

// =============================================================================
// Coordinates
// =============================================================================

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// =============================================================================
// Query request
// =============================================================================

/// Body of `POST /api/query`.
///
/// Construct through [`QueryRequest::new`], which rejects empty input so that
/// a request with blank text can never be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_3d: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl QueryRequest {
    /// Trim the input and build a request, or `None` if nothing is left.
    pub fn new(text: &str, is_3d: bool) -> Option<Self> {
        let query = text.trim();
        if query.is_empty() {
            return None;
        }
        Some(Self {
            query: query.to_string(),
            is_3d,
        })
    }
}

// =============================================================================
// Query response
// =============================================================================

/// A named point as it appears in route responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Payload of a `location` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl Location {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of a `route` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub from: Place,
    pub to: Place,
}

/// The discriminated union returned by `POST /api/query`, keyed by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueryResponse {
    Location(Location),
    Route(Route),
    Greeting { message: String },
    Answer { message: String },
    Message { message: String },
    Error { message: String },
}

impl QueryResponse {
    /// Every `type` tag the client understands.
    pub const KNOWN_TYPES: [&'static str; 6] =
        ["location", "route", "greeting", "answer", "message", "error"];

    /// Decode a response body.
    ///
    /// Malformed JSON is a `Serialization` error. A missing or unrecognized
    /// `type`, or a payload that does not match its tag, is a `Protocol` error.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let kind = match value.get("type") {
            Some(serde_json::Value::String(kind)) => kind.clone(),
            Some(other) => {
                return Err(CampusError::Protocol(format!(
                    "response type must be a string, got {}",
                    other
                )))
            }
            None => {
                return Err(CampusError::Protocol(
                    "response is missing a type field".to_string(),
                ))
            }
        };

        if !Self::KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(CampusError::Protocol(format!(
                "unknown response type: {}",
                kind
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| CampusError::Protocol(format!("invalid {} response: {}", kind, e)))
    }

    /// The wire `type` tag of this response.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResponse::Location(_) => "location",
            QueryResponse::Route(_) => "route",
            QueryResponse::Greeting { .. } => "greeting",
            QueryResponse::Answer { .. } => "answer",
            QueryResponse::Message { .. } => "message",
            QueryResponse::Error { .. } => "error",
        }
    }

    /// Whether this response carries a spatial payload for the map surfaces.
    pub fn is_spatial(&self) -> bool {
        matches!(self, QueryResponse::Location(_) | QueryResponse::Route(_))
    }

    /// The conversational text, for responses that carry one.
    pub fn message(&self) -> Option<&str> {
        match self {
            QueryResponse::Greeting { message }
            | QueryResponse::Answer { message }
            | QueryResponse::Message { message }
            | QueryResponse::Error { message } => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Config response
// =============================================================================

/// Bootstrap configuration served by `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Map provider key used only to bootstrap the 2D map surface.
    pub api_key: String,
}

impl ServerConfig {
    /// Extract the API key stored under `key_field`.
    ///
    /// A missing, null, non-string or blank key is a configuration error.
    pub fn from_value(value: &serde_json::Value, key_field: &str) -> Result<Self> {
        match value.get(key_field) {
            Some(serde_json::Value::String(key)) if !key.trim().is_empty() => Ok(Self {
                api_key: key.clone(),
            }),
            _ => Err(CampusError::Config(format!(
                "map API key not found in server configuration (field {})",
                key_field
            ))),
        }
    }
}
