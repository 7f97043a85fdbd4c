use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::object::{ContextId, ObjectId};
use crate::state::PersistenceState;
use crate::value::{FieldAccess, Value};

/// Shared handle to a persistent object.
///
/// Cloning the handle is cheap and yields the same object: two handles are
/// "the same object" when [`Persistent::ptr_eq`] holds. The object carries
/// its entity name (the type tag used for descriptor lookup), its identity,
/// its persistence state, the id of the owning context, and a property map.
///
/// Relationships that have not been loaded are tracked as *faults*: a
/// faulted property reads as `Null` through the direct accessors until the
/// owning context resolves it. A HOLLOW object has every property faulted.
#[derive(Clone)]
pub struct Persistent(Arc<Inner>);

struct Inner {
    entity_name: String,
    data: RwLock<ObjectData>,
}

struct ObjectData {
    object_id: Option<ObjectId>,
    state: PersistenceState,
    context: Option<ContextId>,
    values: BTreeMap<String, Value>,
    faults: BTreeSet<String>,
}

impl Persistent {
    /// Create a transient object with no identity.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self(Arc::new(Inner {
            entity_name: entity_name.into(),
            data: RwLock::new(ObjectData {
                object_id: None,
                state: PersistenceState::Transient,
                context: None,
                values: BTreeMap::new(),
                faults: BTreeSet::new(),
            }),
        }))
    }

    /// Create a transient object that already has an id.
    pub fn with_id(object_id: ObjectId) -> Self {
        let object = Self::new(object_id.entity_name().to_string());
        object.set_object_id(Some(object_id));
        object
    }

    /// Returns `true` if both handles point at the same object.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Address of the shared state. Equal for handles to the same object.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Entity name of this object. Doubles as the runtime type tag.
    pub fn entity_name(&self) -> &str {
        &self.0.entity_name
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        self.0.data.read().expect("lock poisoned").object_id.clone()
    }

    pub fn set_object_id(&self, id: Option<ObjectId>) {
        self.0.data.write().expect("lock poisoned").object_id = id;
    }

    pub fn persistence_state(&self) -> PersistenceState {
        self.0.data.read().expect("lock poisoned").state
    }

    pub fn set_persistence_state(&self, state: PersistenceState) {
        self.0.data.write().expect("lock poisoned").state = state;
    }

    /// The context that owns this object, if any.
    pub fn context_id(&self) -> Option<ContextId> {
        self.0.data.read().expect("lock poisoned").context
    }

    /// Attach the object to a context with the given state.
    pub fn register(&self, context: ContextId, state: PersistenceState) {
        let mut data = self.0.data.write().expect("lock poisoned");
        data.context = Some(context);
        data.state = state;
    }

    /// Detach from the owning context and drop all property values.
    ///
    /// Clearing the values also releases reference cycles between objects
    /// of the same context.
    pub fn detach(&self) {
        let mut data = self.0.data.write().expect("lock poisoned");
        data.context = None;
        data.state = PersistenceState::Transient;
        data.values.clear();
        data.faults.clear();
    }

    /// Read a property without triggering fault resolution.
    ///
    /// Returns `Null` for unknown and faulted properties.
    pub fn read_property_directly(&self, name: &str) -> Value {
        let data = self.0.data.read().expect("lock poisoned");
        if data.faults.contains(name) {
            return Value::Null;
        }
        data.values.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Write a property without any side effects beyond storing it.
    ///
    /// Clears a pending fault for the property and returns the previous value.
    pub fn write_property_directly(&self, name: &str, value: Value) -> Value {
        let mut data = self.0.data.write().expect("lock poisoned");
        data.faults.remove(name);
        data.values
            .insert(name.to_string(), value)
            .unwrap_or(Value::Null)
    }

    /// Returns `true` if the object holds a value (possibly `Null`) for `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.0
            .data
            .read()
            .expect("lock poisoned")
            .values
            .contains_key(name)
    }

    /// Mark a property as not loaded, dropping any value it had.
    pub fn set_fault(&self, name: &str) {
        let mut data = self.0.data.write().expect("lock poisoned");
        data.values.remove(name);
        data.faults.insert(name.to_string());
    }

    /// Returns `true` if reading `name` requires a fetch.
    pub fn is_fault(&self, name: &str) -> bool {
        let data = self.0.data.read().expect("lock poisoned");
        data.state.is_hollow() || data.faults.contains(name)
    }

    /// Names of all properties currently holding a value.
    pub fn property_names(&self) -> Vec<String> {
        self.0
            .data
            .read()
            .expect("lock poisoned")
            .values
            .keys()
            .cloned()
            .collect()
    }
}

impl FieldAccess for Persistent {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "objectId" => Some(
                self.object_id()
                    .map(|id| Value::String(id.to_string()))
                    .unwrap_or(Value::Null),
            ),
            "entityName" => Some(Value::String(self.entity_name().to_string())),
            "persistenceState" => Some(Value::String(self.persistence_state().name().to_string())),
            _ => None,
        }
    }

    fn type_name(&self) -> &str {
        self.entity_name()
    }
}

impl fmt::Debug for Persistent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.data.read().expect("lock poisoned");
        match &data.object_id {
            Some(id) => write!(f, "Persistent({id}, {})", data.state),
            None => write!(f, "Persistent({}, {})", self.0.entity_name, data.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_object_is_transient() {
        let o = Persistent::new("Artist");
        assert_eq!(o.persistence_state(), PersistenceState::Transient);
        assert!(o.object_id().is_none());
        assert!(o.context_id().is_none());
    }

    #[test]
    fn clones_share_identity() {
        let a = Persistent::new("Artist");
        let b = a.clone();
        assert!(Persistent::ptr_eq(&a, &b));
        b.write_property_directly("name", Value::from("Monet"));
        assert_eq!(a.read_property_directly("name"), Value::from("Monet"));
    }

    #[test]
    fn write_returns_previous_value() {
        let o = Persistent::new("Artist");
        assert_eq!(o.write_property_directly("name", Value::from("a")), Value::Null);
        assert_eq!(o.write_property_directly("name", Value::from("b")), Value::from("a"));
    }

    #[test]
    fn faults_hide_values_until_written() {
        let o = Persistent::new("Artist");
        o.write_property_directly("paintings", Value::List(vec![]));
        o.set_fault("paintings");
        assert!(o.is_fault("paintings"));
        assert!(!o.has_property("paintings"));
        assert_eq!(o.read_property_directly("paintings"), Value::Null);

        o.write_property_directly("paintings", Value::List(vec![]));
        assert!(!o.is_fault("paintings"));
    }

    #[test]
    fn hollow_object_faults_everything() {
        let o = Persistent::with_id(ObjectId::new("Artist", "ID", 1));
        o.register(ContextId::new(), PersistenceState::Hollow);
        assert!(o.is_fault("anything"));
    }

    #[test]
    fn detach_clears_state() {
        let o = Persistent::with_id(ObjectId::new("Artist", "ID", 1));
        let ctx = ContextId::new();
        o.register(ctx, PersistenceState::Committed);
        o.write_property_directly("self", Value::Object(o.clone()));
        assert_eq!(o.context_id(), Some(ctx));

        o.detach();
        assert_eq!(o.persistence_state(), PersistenceState::Transient);
        assert!(o.context_id().is_none());
        assert!(o.property_names().is_empty());
    }

    #[test]
    fn intrinsic_fields() {
        let o = Persistent::with_id(ObjectId::new("Artist", "ID", 2));
        assert_eq!(o.field("entityName"), Some(Value::from("Artist")));
        assert_eq!(o.field("persistenceState"), Some(Value::from("transient")));
        assert_eq!(
            o.field("objectId"),
            Some(Value::from("<ObjectId:Artist, ID=2>"))
        );
        assert_eq!(o.field("nope"), None);
    }
}
