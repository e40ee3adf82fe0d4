//! Explicit mapping from logical document names to their JSON codecs.
//!
//! Every document type that is read from or written to disk is registered
//! here under the logical name that forms its file name (`ModGroup` →
//! `ModGroup.json`). Loaders look the name up by Rust type, so renaming a
//! struct never silently renames a file on disk.

use crate::models::{ArenaMod, ModDescriptor, ModGroup, PostProcessingMod, TunnelMod};
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use thiserror::Error;

/// Logical name of the group pointer document.
pub const MOD_GROUP: &str = "ModGroup";
/// Logical name of the per-mod metadata document.
pub const MOD: &str = "Mod";
/// Logical name of the arena override payload.
pub const ARENA_MOD: &str = "ArenaMod";
/// Logical name of the tunnel visual payload.
pub const TUNNEL_MOD: &str = "TunnelMod";
/// Logical name of the post-processing payload.
pub const POST_PROCESSING_MOD: &str = "PostProcessingMod";

/// Anything that can live in a mod document file.
pub trait Document: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

impl<T> Document for T where T: Serialize + DeserializeOwned + Default + Send + Sync + 'static {}

type DecodeFn = fn(&[u8]) -> Result<Box<dyn Any + Send>, serde_json::Error>;
type EncodeFn = fn(&dyn Any) -> Option<Result<String, serde_json::Error>>;

/// Errors raised by registry lookups and codec calls.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No schema registered for type {0}")]
    Unregistered(&'static str),

    #[error("No schema registered under the name '{0}'")]
    UnknownName(String),

    #[error("Failed to decode '{name}': {source}")]
    Decode {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode '{name}': {source}")]
    Encode {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema '{0}' produced a value of an unexpected type")]
    TypeMismatch(&'static str),
}

/// Decode/encode function pair for one logical name.
#[derive(Debug, Clone, Copy)]
pub struct SchemaCodec {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl SchemaCodec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

fn decode_as<T: Document>(bytes: &[u8]) -> Result<Box<dyn Any + Send>, serde_json::Error> {
    serde_json::from_slice::<T>(bytes).map(|value| Box::new(value) as Box<dyn Any + Send>)
}

fn encode_as<T: Document>(value: &dyn Any) -> Option<Result<String, serde_json::Error>> {
    value.downcast_ref::<T>().map(serde_json::to_string_pretty)
}

/// Registry of every document schema the host knows about.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    by_name: IndexMap<&'static str, SchemaCodec>,
    by_type: HashMap<TypeId, &'static str>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the mod documents this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register::<ModGroup>(MOD_GROUP)
            .register::<ModDescriptor>(MOD)
            .register::<ArenaMod>(ARENA_MOD)
            .register::<TunnelMod>(TUNNEL_MOD)
            .register::<PostProcessingMod>(POST_PROCESSING_MOD);
        registry
    }

    /// Register `T` under `name`, replacing any earlier mapping for either.
    pub fn register<T: Document>(&mut self, name: &'static str) -> &mut Self {
        let type_id = TypeId::of::<T>();

        if let Some(previous) = self.by_type.insert(type_id, name) {
            if previous != name {
                self.by_name.shift_remove(previous);
            }
        }
        if let Some(replaced) = self.by_name.insert(
            name,
            SchemaCodec {
                name,
                type_id,
                type_name: std::any::type_name::<T>(),
                decode: decode_as::<T>,
                encode: encode_as::<T>,
            },
        ) {
            if replaced.type_id != type_id {
                self.by_type.remove(&replaced.type_id);
            }
        }

        tracing::debug!("Registered schema '{}' for {}", name, std::any::type_name::<T>());
        self
    }

    /// Logical name registered for `T`.
    pub fn name_of<T: Document>(&self) -> Result<&'static str, SchemaError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(SchemaError::Unregistered(std::any::type_name::<T>()))
    }

    pub fn codec(&self, name: &str) -> Option<&SchemaCodec> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }

    /// Decode `bytes` as `T` through its registered codec.
    pub fn decode<T: Document>(&self, bytes: &[u8]) -> Result<T, SchemaError> {
        let name = self.name_of::<T>()?;
        let codec = self
            .by_name
            .get(name)
            .ok_or(SchemaError::Unregistered(std::any::type_name::<T>()))?;

        let boxed = (codec.decode)(bytes).map_err(|source| SchemaError::Decode { name, source })?;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| SchemaError::TypeMismatch(name))
    }

    /// Encode `value` as pretty-printed JSON through its registered codec.
    pub fn encode<T: Document>(&self, value: &T) -> Result<String, SchemaError> {
        let name = self.name_of::<T>()?;
        let codec = self
            .by_name
            .get(name)
            .ok_or(SchemaError::Unregistered(std::any::type_name::<T>()))?;

        match (codec.encode)(value as &dyn Any) {
            Some(result) => result.map_err(|source| SchemaError::Encode { name, source }),
            None => Err(SchemaError::TypeMismatch(name)),
        }
    }

    /// Check that `bytes` decode under the schema registered as `name`.
    pub fn validate(&self, name: &str, bytes: &[u8]) -> Result<(), SchemaError> {
        let codec = self
            .by_name
            .get(name)
            .ok_or_else(|| SchemaError::UnknownName(name.to_string()))?;

        (codec.decode)(bytes)
            .map(|_| ())
            .map_err(|source| SchemaError::Decode {
                name: codec.name,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_builtin_names() {
        let registry = SchemaRegistry::with_builtin();
        assert_eq!(registry.name_of::<ModGroup>().unwrap(), "ModGroup");
        assert_eq!(registry.name_of::<ModDescriptor>().unwrap(), "Mod");
        assert_eq!(registry.name_of::<ArenaMod>().unwrap(), "ArenaMod");
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["ModGroup", "Mod", "ArenaMod", "TunnelMod", "PostProcessingMod"]
        );
    }

    #[test]
    fn test_unregistered_type() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.name_of::<Sample>(),
            Err(SchemaError::Unregistered(_))
        ));
        assert!(registry.decode::<Sample>(b"{}").is_err());
    }

    #[test]
    fn test_decode_and_encode() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Sample>("Sample");

        let decoded: Sample = registry.decode(br#"{"value": 7}"#).unwrap();
        assert_eq!(decoded, Sample { value: 7 });

        let encoded = registry.encode(&decoded).unwrap();
        assert!(encoded.contains("\"value\": 7"));
    }

    #[test]
    fn test_decode_error_names_schema() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Sample>("Sample");

        let err = registry.decode::<Sample>(b"{ not json").unwrap_err();
        assert!(matches!(err, SchemaError::Decode { name: "Sample", .. }));
    }

    #[test]
    fn test_reregister_replaces_name() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Sample>("Old");
        registry.register::<Sample>("New");

        assert_eq!(registry.name_of::<Sample>().unwrap(), "New");
        assert!(!registry.contains("Old"));
    }

    #[test]
    fn test_validate_by_name() {
        let registry = SchemaRegistry::with_builtin();
        assert!(registry.validate("ModGroup", br#"{"groupKey":"Arena-Test"}"#).is_ok());
        assert!(registry.validate("ModGroup", b"[").is_err());
        assert!(matches!(
            registry.validate("Nope", b"{}"),
            Err(SchemaError::UnknownName(_))
        ));
    }
}
