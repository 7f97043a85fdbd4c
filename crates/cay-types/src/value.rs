use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::object::Key;
use crate::persistent::Persistent;

/// Read access to named fields of a value that is not a mapped entity.
///
/// This is the last resort when a property path segment can't be resolved
/// through a class descriptor or an object's own property map. Types that
/// want to be navigable by path (DTOs, embeddables, computed views)
/// implement it and travel inside [`Value::Bean`].
pub trait FieldAccess: Send + Sync {
    /// Returns the field value, or `None` if there is no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// A short type label used in error messages.
    fn type_name(&self) -> &str {
        "bean"
    }
}

/// A property value in the object graph.
///
/// Scalars, related persistent objects, and the three to-many container
/// shapes. `Set` never holds two equal elements; use [`Value::set`] or
/// [`Value::insert_unique`] to build one.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Object(Persistent),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Bean(Arc<dyn FieldAccess>),
}

impl Value {
    /// Build a set, dropping duplicates while keeping first-seen order.
    ///
    /// Objects are deduplicated by handle address in constant time; other
    /// members fall back to a linear equality scan.
    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        let mut members = Vec::new();
        let mut objects = HashSet::new();
        for v in values {
            match v.as_object().map(Persistent::addr) {
                Some(addr) => {
                    if objects.insert(addr) {
                        members.push(v);
                    }
                }
                None => Self::insert_unique(&mut members, v),
            }
        }
        Self::Set(members)
    }

    /// Push `value` into `members` unless an equal element is present.
    pub fn insert_unique(members: &mut Vec<Value>, value: Value) {
        if !members.contains(&value) {
            members.push(value);
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for list, set and map values.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }

    /// Number of elements for collection values.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::List(v) | Self::Set(v) => Some(v.len()),
            Self::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Persistent> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Elements of a list or set, in order. `None` for anything else.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) | Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Convert a scalar into a map/primary key, if it has a key form.
    pub fn to_key(&self) -> Option<Key> {
        match self {
            Self::Int(v) => Some(Key::Int(*v)),
            Self::String(s) => Some(Key::Str(s.clone())),
            _ => None,
        }
    }

    /// A short label for the value's kind, used in diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Object(o) => o.entity_name(),
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Bean(b) => b.type_name(),
        }
    }
}

impl PartialEq for Value {
    /// Scalars compare by value, containers structurally, and objects by
    /// handle identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Persistent::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a.len() == b.len() && a.iter().all(|v| b.contains(v)),
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Bean(a), Self::Bean(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Self::Object(o) => write!(f, "Object({o:?})"),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Set(v) => f.debug_tuple("Set").field(v).finish(),
            Self::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Self::Bean(b) => write!(f, "Bean({})", b.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Persistent> for Value {
    fn from(v: Persistent) -> Self {
        Self::Object(v)
    }
}

impl From<Key> for Value {
    fn from(v: Key) -> Self {
        match v {
            Key::Int(i) => Self::Int(i),
            Key::Str(s) => Self::String(s),
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i64,
    }

    impl FieldAccess for Point {
        fn field(&self, name: &str) -> Option<Value> {
            (name == "x").then(|| Value::Int(self.x))
        }
    }

    #[test]
    fn set_drops_duplicates() {
        let set = Value::set(vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
        assert_eq!(set.len(), Some(2));
    }

    #[test]
    fn set_dedups_objects_by_handle() {
        let objects: Vec<Persistent> = (0..500).map(|_| Persistent::new("Painting")).collect();
        let values = objects
            .iter()
            .chain(objects.iter().rev())
            .map(|o| Value::Object(o.clone()))
            .chain([Value::Int(1), Value::Int(1)]);
        let set = Value::set(values);
        let members = set.elements().unwrap();
        assert_eq!(members.len(), 501);
        assert_eq!(members[0], Value::Object(objects[0].clone()));
        assert_eq!(members[499], Value::Object(objects[499].clone()));
        assert_eq!(members[500], Value::Int(1));
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = Value::set(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::set(vec![Value::Int(2), Value::Int(1)]);
        assert_eq!(a, b);
        assert_ne!(a, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Persistent::new("Artist");
        let b = Persistent::new("Artist");
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn bean_fields_and_identity() {
        let bean: Arc<dyn FieldAccess> = Arc::new(Point { x: 3 });
        let v = Value::Bean(bean.clone());
        assert_eq!(v, Value::Bean(bean.clone()));
        assert_eq!(bean.field("x"), Some(Value::Int(3)));
        assert_eq!(bean.field("y"), None);
        assert_eq!(v.type_name(), "bean");
    }

    #[test]
    fn key_conversion() {
        assert_eq!(Value::Int(4).to_key(), Some(Key::Int(4)));
        assert_eq!(Value::from("a").to_key(), Some(Key::from("a")));
        assert_eq!(Value::Float(1.0).to_key(), None);
        assert_eq!(Value::from(Key::Int(9)), Value::Int(9));
    }

    #[test]
    fn collection_helpers() {
        let list = Value::List(vec![Value::Null]);
        assert!(list.is_collection());
        assert_eq!(list.elements().map(<[Value]>::len), Some(1));
        assert!(!Value::Int(1).is_collection());
        assert_eq!(Value::Int(1).len(), None);
    }

    proptest::proptest! {
        #[test]
        fn set_never_holds_equal_members(xs in proptest::collection::vec(0i64..8, 0..32)) {
            let set = Value::set(xs.iter().copied().map(Value::Int));
            let members = set.elements().unwrap();
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    proptest::prop_assert_ne!(a, b);
                }
            }
            let mut distinct = xs.clone();
            distinct.sort_unstable();
            distinct.dedup();
            proptest::prop_assert_eq!(members.len(), distinct.len());
        }
    }
}
