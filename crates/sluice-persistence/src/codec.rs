//! Type-preserving payload codec
//!
//! Opaque domain payloads are persisted as self-describing JSON envelopes:
//! the originating type name travels with the field data, so a blob can be
//! decoded back into the same runtime shape without the decoder knowing
//! the type statically. Decoding resolves the recorded name against a
//! registry of concrete types built once at process start.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sluice_core::{Payload, PayloadData};

use crate::error::PersistenceError;

/// Blob form of the absent payload
const ABSENT_BLOB: &str = "null";

/// An encoded payload blob, as written by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// The blob encoding the absent payload
    pub fn absent() -> Self {
        Self(ABSENT_BLOB.to_string())
    }

    /// Wrap a raw blob read back from storage
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw blob text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the raw blob text
    pub fn into_string(self) -> String {
        self.0
    }
}

type DecodeFn = fn(serde_json::Value) -> Result<serde_json::Value, serde_json::Error>;

/// Rebuild a JSON value through a concrete type, recovering its canonical
/// shape
fn rebuild_as<T: PayloadData>(value: serde_json::Value) -> Result<serde_json::Value, serde_json::Error> {
    let typed: T = serde_json::from_value(value)?;
    serde_json::to_value(&typed)
}

/// Registry of payload types known to the process
///
/// Populated once at startup and immutable afterwards; the codec holding
/// it is safe to share across threads.
#[derive(Debug, Default)]
pub struct PayloadRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl PayloadRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload type under its stable name
    pub fn register<T: PayloadData>(&mut self) -> &mut Self {
        self.decoders.insert(T::TYPE_NAME.to_string(), rebuild_as::<T>);
        self
    }

    /// Whether a type name is known to this registry
    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    fn decoder(&self, type_name: &str) -> Option<DecodeFn> {
        self.decoders.get(type_name).copied()
    }
}

/// Persisted form of a present payload
#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "$type")]
    type_name: String,

    #[serde(rename = "$value")]
    value: serde_json::Value,
}

/// Encodes and decodes opaque payloads for persistence
#[derive(Debug, Default)]
pub struct PayloadCodec {
    registry: PayloadRegistry,
}

impl PayloadCodec {
    /// Create a codec over the given type registry
    pub fn new(registry: PayloadRegistry) -> Self {
        Self { registry }
    }

    /// Encode a payload into its blob form
    ///
    /// The absent payload encodes to a null blob. Encoding does not
    /// consult the registry; any payload value already in memory is
    /// representable unless serialization itself fails.
    pub fn encode(&self, payload: &Payload) -> Result<EncodedPayload, PersistenceError> {
        let (Some(type_name), Some(value)) = (payload.type_name(), payload.value()) else {
            return Ok(EncodedPayload::absent());
        };

        let envelope = Envelope {
            type_name: type_name.to_string(),
            value: value.clone(),
        };
        let raw = serde_json::to_string(&envelope)
            .map_err(|e| PersistenceError::PayloadEncode(e.to_string()))?;
        Ok(EncodedPayload(raw))
    }

    /// Decode a blob back into a live payload
    ///
    /// Fails when the blob is malformed, when the recorded type is not
    /// registered in this process, or when the registered type rejects
    /// the recorded field data. The failure is scoped to the field being
    /// decoded; callers decide what it means for the surrounding record.
    pub fn decode(&self, blob: &EncodedPayload) -> Result<Payload, PersistenceError> {
        let raw: serde_json::Value = serde_json::from_str(blob.as_str())
            .map_err(|e| PersistenceError::PayloadDecode(format!("malformed payload blob: {}", e)))?;

        if raw.is_null() {
            return Ok(Payload::none());
        }

        let envelope: Envelope = serde_json::from_value(raw).map_err(|e| {
            PersistenceError::PayloadDecode(format!("payload blob is not a typed envelope: {}", e))
        })?;

        let decoder = self.registry.decoder(&envelope.type_name).ok_or_else(|| {
            PersistenceError::PayloadDecode(format!(
                "payload type '{}' is not registered",
                envelope.type_name
            ))
        })?;

        let value = decoder(envelope.value).map_err(|e| {
            PersistenceError::PayloadDecode(format!(
                "payload of type '{}' failed to rebuild: {}",
                envelope.type_name, e
            ))
        })?;

        Ok(Payload::from_parts(envelope.type_name, value))
    }
}
