//! # Document & Scene Model
//!
//! Plain data shared by every stage: the parsed document tree
//! ([`ConfigNode`]), resolved values ([`Value`]) and scene entities.
//!
//! This module is pure data: no I/O, no registry access, no randomness.

pub mod node;
pub mod value;
pub mod entity;
pub mod attribute_map;
pub mod path;

pub use node::{ConfigNode, ConfigMap, PROVIDER_KEY, config_map};
pub use value::{FromValue, Value, ValueMap};
pub use entity::{Entity, EntityId};
pub use attribute_map::{AttributeMap, attr, attributes};
pub use path::{KeyPath, Segment};
