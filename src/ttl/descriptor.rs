//! Posts and their `props.ttl` metadata.
//!
//! The host stores post props as loose JSON. [`TtlDescriptor::from_props`]
//! resolves the `ttl` entry once, at the boundary, so the rest of the crate
//! works with a typed `Option<TtlDescriptor>`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which the descriptor lives in post props.
pub const TTL_PROP: &str = "ttl";

/// Post type the server stamps on posts with an active TTL.
pub const EXPIRING_POST_TYPE: &str = "custom_expiring";

/// Host post identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A chat message as the host hands it to the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default, rename = "type")]
    pub post_type: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl Post {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: PostId(id.into()),
            user_id: String::new(),
            channel_id: String::new(),
            message: message.into(),
            create_at: 0,
            post_type: String::new(),
            props: Map::new(),
        }
    }

    /// Resolved TTL descriptor, if the props carry a well-formed one.
    pub fn ttl(&self) -> Option<TtlDescriptor> {
        TtlDescriptor::from_props(&self.props)
    }

    /// Whether the props contain a `ttl` entry at all, well-formed or not.
    pub fn has_ttl_prop(&self) -> bool {
        self.props.contains_key(TTL_PROP)
    }

    pub fn set_ttl(&mut self, ttl: &TtlDescriptor) {
        self.props.insert(TTL_PROP.to_string(), ttl.to_value());
    }

    pub fn remove_ttl(&mut self) -> Option<Value> {
        self.props.remove(TTL_PROP)
    }
}

/// Per-message self-destruct metadata (`props.ttl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlDescriptor {
    pub enabled: bool,
    #[serde(default)]
    pub duration: String,
    /// Absolute expiry in milliseconds since the epoch, stamped by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl TtlDescriptor {
    /// Descriptor attached at send time: intent only, no absolute expiry.
    pub fn requested(duration: impl Into<String>) -> Self {
        Self {
            enabled: true,
            duration: duration.into(),
            expires_at: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            duration: String::new(),
            expires_at: None,
        }
    }

    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Resolve `props.ttl` leniently.
    ///
    /// `enabled` must be a JSON bool; a missing or non-string `duration`
    /// becomes empty. `expires_at` accepts integers and finite floats
    /// (truncated), anything else is treated as absent.
    pub fn from_props(props: &Map<String, Value>) -> Option<Self> {
        let ttl = props.get(TTL_PROP)?.as_object()?;

        let enabled = ttl.get("enabled").and_then(Value::as_bool).unwrap_or(false);
        let duration = ttl
            .get("duration")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let expires_at = ttl.get("expires_at").and_then(millis_from_json);

        Some(Self {
            enabled,
            duration,
            expires_at,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut ttl = Map::new();
        ttl.insert("enabled".to_string(), Value::Bool(self.enabled));
        ttl.insert("duration".to_string(), Value::String(self.duration.clone()));
        if let Some(expires_at) = self.expires_at {
            ttl.insert("expires_at".to_string(), Value::from(expires_at));
        }
        Value::Object(ttl)
    }
}

fn millis_from_json(value: &Value) -> Option<i64> {
    if let Some(ms) = value.as_i64() {
        return Some(ms);
    }
    let ms = value.as_f64()?;
    if ms.is_finite() {
        Some(ms as i64)
    } else {
        None
    }
}
