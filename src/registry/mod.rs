//! # Entity Registry
//!
//! The run-scoped store of scene entities. Loader-class modules populate
//! it, manipulators mutate it, selector providers query it.
//!
//! ## Semantics
//!
//! - **Run-scoped**: a registry is created at pipeline start and handed
//!   back in the run report; nothing about it is process-global.
//! - **Stable IDs**: IDs are allocated monotonically from 1 and never reused.
//! - **Ordered**: iteration and selection follow registration order, so
//!   selector results are reproducible.
//! - **No isolation**: an attribute update is visible to the very next
//!   `select`. Modules run strictly one after another, so there is no
//!   locking.

pub mod condition;

use crate::model::*;
use crate::{Error, Result};

pub use condition::{Conditions, Matcher, WILDCARD};

// ============================================================================
// EntityRegistry
// ============================================================================

/// In-memory entity store.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: indexmap::IndexMap<EntityId, Entity>,
    next_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Register a new entity with the given attributes.
    ///
    /// `id` is not a valid attribute name: it would shadow the registry ID
    /// when entities are exported.
    pub fn register(&mut self, attributes: AttributeMap) -> Result<EntityId> {
        if attributes.contains_key(attr::ID) {
            return Err(reserved_key());
        }
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(id, Entity { id, attributes });
        Ok(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Entity {id}")))
    }

    /// Set an attribute on an entity (upsert).
    pub fn set_attribute(&mut self, id: EntityId, key: &str, value: Value) -> Result<()> {
        if key == attr::ID {
            return Err(reserved_key());
        }
        self.get_mut(id)?.set(key, value);
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Entity {id}")))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// All entities in registration order. Calling again restarts the walk.
    pub fn all(&self) -> impl Iterator<Item = &Entity> + Clone + '_ {
        self.entities.values()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities satisfying every condition, in registration order.
    /// An empty result is a normal outcome, not an error.
    pub fn select(&self, conditions: &Conditions) -> Vec<&Entity> {
        self.all().filter(|e| conditions.matches(e)).collect()
    }

    /// Entities whose `type` attribute equals `kind`.
    pub fn by_kind(&self, kind: &str) -> Vec<&Entity> {
        self.all().filter(|e| e.is_kind(kind)).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.all().find(|e| e.name() == Some(name))
    }
}

fn reserved_key() -> Error {
    Error::ConfigError {
        key: attr::ID.into(),
        message: "'id' is reserved for the entity ID assigned by the registry".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scene() -> EntityRegistry {
        let mut reg = EntityRegistry::new();
        reg.register(attributes([("name", "Suzanne"), ("type", "MESH")])).unwrap();
        reg.register(attributes([("name", "Camera"), ("type", "CAMERA")])).unwrap();
        reg
    }

    fn ids(found: Vec<&Entity>) -> Vec<EntityId> {
        found.into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_register_and_get() {
        let mut reg = EntityRegistry::new();
        let a = reg.register(attributes([("name", "A")])).unwrap();
        let b = reg.register(attributes([("name", "B")])).unwrap();
        assert_eq!((a, b), (EntityId(1), EntityId(2)));
        assert_eq!(reg.get(b).unwrap().name(), Some("B"));
        assert!(reg.get(EntityId(99)).is_err());
    }

    #[test]
    fn test_select_name_and_type() {
        let reg = scene();
        let c = Conditions::new()
            .with("name", "Suzanne").unwrap()
            .with("type", "MESH").unwrap();
        assert_eq!(ids(reg.select(&c)), vec![EntityId(1)]);
    }

    #[test]
    fn test_empty_selection_is_not_error() {
        let reg = scene();
        let c = Conditions::new().with("type", "LIGHT").unwrap();
        assert!(reg.select(&c).is_empty());
    }

    #[test]
    fn test_mutation_visible_to_next_select() {
        let mut reg = scene();
        let c = Conditions::new().with("cp_hidden", true).unwrap();
        assert!(reg.select(&c).is_empty());
        reg.set_attribute(EntityId(2), "cp_hidden", Value::Bool(true)).unwrap();
        assert_eq!(ids(reg.select(&c)), vec![EntityId(2)]);
    }

    #[test]
    fn test_all_is_restartable() {
        let reg = scene();
        let walk = reg.all();
        assert_eq!(walk.clone().count(), 2);
        assert_eq!(walk.count(), 2);
    }

    #[test]
    fn test_id_attribute_is_reserved() {
        let mut reg = scene();
        assert!(matches!(
            reg.register(attributes([("name", Value::from("A")), ("id", Value::from(99))])),
            Err(Error::ConfigError { .. }),
        ));
        assert!(reg.set_attribute(EntityId(1), "id", Value::from(7)).is_err());
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(EntityId(1)).unwrap().get("id"), None);
    }

    #[test]
    fn test_set_attribute_unknown_entity() {
        let mut reg = scene();
        assert!(matches!(
            reg.set_attribute(EntityId(42), "x", Value::Null),
            Err(Error::NotFound(_)),
        ));
    }

    fn arb_registry() -> impl Strategy<Value = EntityRegistry> {
        let names = prop::sample::select(vec!["Suzanne", "Cube", "Sphere"]);
        let kinds = prop::sample::select(vec!["MESH", "LIGHT", "CAMERA"]);
        prop::collection::vec((names, kinds, 0i64..3), 0..12).prop_map(|rows| {
            let mut reg = EntityRegistry::new();
            for (name, kind, room) in rows {
                reg.register(attributes([
                    ("name", Value::from(name)),
                    ("type", Value::from(kind)),
                    ("room", Value::from(room)),
                ])).unwrap();
            }
            reg
        })
    }

    proptest! {
        /// select({a, b}) == select({a}) ∩ select({b})
        #[test]
        fn prop_selector_conjunction_law(
            reg in arb_registry(),
            name in prop::sample::select(vec!["Suzanne", "Cube", "Su*", "*e"]),
            room in 0i64..3,
        ) {
            let a = Conditions::new().with("name", name).unwrap();
            let b = Conditions::new().with("room", room).unwrap();
            let both = Conditions::new()
                .with("name", name).unwrap()
                .with("room", room).unwrap();

            let left = ids(reg.select(&a));
            let right = ids(reg.select(&b));
            let expected: Vec<EntityId> =
                left.iter().copied().filter(|id| right.contains(id)).collect();
            prop_assert_eq!(ids(reg.select(&both)), expected);
        }
    }
}
