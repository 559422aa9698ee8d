use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::CoreError;

/// A value that may be carried inside a [`Payload`]
///
/// Implementors pick a stable, process-independent type name. The name is
/// recorded alongside the value whenever the payload is persisted, so a
/// reader that has registered the same type can rebuild the exact runtime
/// shape without knowing it statically.
pub trait PayloadData: Serialize + DeserializeOwned {
    /// Stable name identifying this type in persisted form
    const TYPE_NAME: &'static str;
}

/// An opaque, dynamically typed value attached to workflow state
///
/// Workflow data, step persistence state and event payloads are all
/// caller-defined types the engine knows nothing about. A `Payload` keeps
/// the value as JSON together with the type name it was built from, so the
/// original type can be recovered later. The absent payload is a first-class
/// state and round-trips as such.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    slot: Option<TypedValue>,
}

/// A JSON value tagged with the name of the type it was serialized from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    /// Name the value's type was registered under
    pub type_name: String,

    /// The serialized field data
    pub value: serde_json::Value,
}

impl Payload {
    /// The absent payload
    #[inline]
    pub fn none() -> Self {
        Self { slot: None }
    }

    /// Wrap a typed value, recording its type name
    pub fn of<T: PayloadData>(value: &T) -> Result<Self, CoreError> {
        let value = serde_json::to_value(value)?;
        Ok(Self::from_parts(T::TYPE_NAME, value))
    }

    /// Build a payload from an already-tagged value
    pub fn from_parts(type_name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            slot: Some(TypedValue {
                type_name: type_name.into(),
                value,
            }),
        }
    }

    /// Check whether the payload is absent
    #[inline]
    pub fn is_none(&self) -> bool {
        self.slot.is_none()
    }

    /// The recorded type name, if a value is present
    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.slot.as_ref().map(|t| t.type_name.as_str())
    }

    /// The serialized field data, if a value is present
    #[inline]
    pub fn value(&self) -> Option<&serde_json::Value> {
        self.slot.as_ref().map(|t| &t.value)
    }

    /// Recover the original typed value
    ///
    /// Returns `Ok(None)` for the absent payload, and an error when the
    /// payload holds a different type than the one requested.
    pub fn extract<T: PayloadData>(&self) -> Result<Option<T>, CoreError> {
        let Some(typed) = &self.slot else {
            return Ok(None);
        };

        if typed.type_name != T::TYPE_NAME {
            return Err(CoreError::Serialization(format!(
                "payload holds type '{}', requested '{}'",
                typed.type_name,
                T::TYPE_NAME
            )));
        }

        let value: T = serde_json::from_value(typed.value.clone())?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct CounterState {
        count: u32,
        label: String,
    }

    impl PayloadData for CounterState {
        const TYPE_NAME: &'static str = "tests.CounterState";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct OtherState {
        flag: bool,
    }

    impl PayloadData for OtherState {
        const TYPE_NAME: &'static str = "tests.OtherState";
    }

    #[test]
    fn test_none_payload() {
        let payload = Payload::none();
        assert!(payload.is_none());
        assert_eq!(payload.type_name(), None);
        assert_eq!(payload.value(), None);
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(Payload::default(), Payload::none());
    }

    #[test]
    fn test_wrap_records_type_name() {
        let state = CounterState {
            count: 3,
            label: "retries".to_string(),
        };
        let payload = Payload::of(&state).unwrap();

        assert_eq!(payload.type_name(), Some("tests.CounterState"));
        assert_eq!(payload.value().unwrap()["count"], 3);
    }

    #[test]
    fn test_extract_round_trip() {
        let state = CounterState {
            count: 7,
            label: "attempts".to_string(),
        };
        let payload = Payload::of(&state).unwrap();

        let recovered: CounterState = payload.extract().unwrap().unwrap();
        assert_eq!(recovered, state);
    }

    #[test]
    fn test_extract_none() {
        let payload = Payload::none();
        let recovered: Option<CounterState> = payload.extract().unwrap();
        assert!(recovered.is_none());
    }

    #[test]
    fn test_extract_wrong_type() {
        let state = CounterState {
            count: 1,
            label: "x".to_string(),
        };
        let payload = Payload::of(&state).unwrap();

        let result: Result<Option<OtherState>, _> = payload.extract();
        match result {
            Err(CoreError::Serialization(msg)) => {
                assert!(msg.contains("tests.CounterState"));
                assert!(msg.contains("tests.OtherState"));
            }
            other => panic!("Expected Serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parts() {
        let payload = Payload::from_parts("tests.CounterState", json!({"count": 2, "label": "l"}));
        let recovered: CounterState = payload.extract().unwrap().unwrap();
        assert_eq!(recovered.count, 2);
    }

    #[test]
    fn test_payload_equality() {
        let a = Payload::from_parts("t", json!({"k": 1}));
        let b = Payload::from_parts("t", json!({"k": 1}));
        let c = Payload::from_parts("t", json!({"k": 2}));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
