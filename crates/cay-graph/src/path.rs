//! Dot-path property reads across an object graph.
//!
//! `read_nested_property(ctx, artist, "paintings.gallery.name")` walks one
//! segment at a time. A null anywhere before the end yields null. A
//! collection reached before the end is fanned out: the rest of the path is
//! read from every element and the results are spliced into one flat
//! collection, a list if the source was a list and a set otherwise.

use cay_runtime::ObjectContext;
use cay_types::{FieldAccess, Key, Persistent, Value};

use crate::error::{GraphError, GraphResult};

/// Terminal segment that evaluates to the size of a collection.
pub const COLLECTION_SIZE: &str = "@size";

/// Suffix marking a to-many segment as an outer join. Stripped on read.
pub const OUTER_JOIN_MARKER: char = '+';

/// Read the value at `path`, starting from `root`.
///
/// Mapped properties are read through the entity's class descriptor, which
/// resolves faults. Unmapped names fall back to values stored directly on
/// the object and then to its intrinsic fields (`objectId`, `entityName`,
/// `persistenceState`).
pub fn read_nested_property<C>(context: &C, root: &Persistent, path: &str) -> GraphResult<Value>
where
    C: ObjectContext + ?Sized,
{
    validate(path)?;
    read_from_object(context, root, path)
}

/// Like [`read_nested_property`], starting from any value.
pub fn read_nested_value<C>(context: &C, root: &Value, path: &str) -> GraphResult<Value>
where
    C: ObjectContext + ?Sized,
{
    validate(path)?;
    read_from_value(context, root, path)
}

/// Join property names into a dot path.
pub fn make_path<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

fn validate(path: &str) -> GraphResult<()> {
    if path.is_empty() {
        return Err(GraphError::EmptyPath);
    }
    if path.starts_with('.') {
        return Err(GraphError::PathStartsWithDot(path.to_string()));
    }
    if path.ends_with('.') {
        return Err(GraphError::PathEndsWithDot(path.to_string()));
    }
    Ok(())
}

/// Split off the first segment, stripping the outer-join marker from it
/// when more path follows.
fn split_head(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head.strip_suffix(OUTER_JOIN_MARKER).unwrap_or(head), Some(rest)),
        None => (path, None),
    }
}

fn read_from_value<C>(context: &C, value: &Value, path: &str) -> GraphResult<Value>
where
    C: ObjectContext + ?Sized,
{
    match value {
        Value::Null => Ok(Value::Null),
        Value::Object(object) => read_from_object(context, object, path),
        Value::List(items) | Value::Set(items) => {
            if path == COLLECTION_SIZE {
                return Ok(Value::Int(items.len() as i64));
            }
            let mut flat = Vec::new();
            for item in items {
                if !matches!(item, Value::Object(_) | Value::Bean(_)) {
                    continue;
                }
                match read_from_value(context, item, path)? {
                    Value::List(nested) | Value::Set(nested) => flat.extend(nested),
                    other => flat.push(other),
                }
            }
            Ok(match value {
                Value::List(_) => Value::List(flat),
                _ => Value::set(flat),
            })
        }
        Value::Map(entries) => {
            if path == COLLECTION_SIZE {
                return Ok(Value::Int(entries.len() as i64));
            }
            validate(path)?;
            let (head, rest) = split_head(path);
            let entry = entries
                .get(&Key::from(head))
                .or_else(|| head.parse::<i64>().ok().and_then(|k| entries.get(&Key::Int(k))))
                .cloned()
                .unwrap_or(Value::Null);
            continue_with(context, entry, rest)
        }
        Value::Bean(bean) => {
            validate(path)?;
            let (head, rest) = split_head(path);
            let field = bean
                .field(head)
                .ok_or_else(|| GraphError::UnknownProperty {
                    property: head.to_string(),
                    type_name: bean.type_name().to_string(),
                })?;
            continue_with(context, field, rest)
        }
        scalar => Err(GraphError::UnknownProperty {
            property: split_head(path).0.to_string(),
            type_name: scalar.type_name().to_string(),
        }),
    }
}

fn read_from_object<C>(context: &C, object: &Persistent, path: &str) -> GraphResult<Value>
where
    C: ObjectContext + ?Sized,
{
    validate(path)?;
    let (head, rest) = split_head(path);
    let value = read_simple(context, object, head)?;
    continue_with(context, value, rest)
}

fn continue_with<C>(context: &C, value: Value, rest: Option<&str>) -> GraphResult<Value>
where
    C: ObjectContext + ?Sized,
{
    match rest {
        Some(rest) => read_from_value(context, &value, rest),
        None => Ok(value),
    }
}

fn read_simple<C>(context: &C, object: &Persistent, name: &str) -> GraphResult<Value>
where
    C: ObjectContext + ?Sized,
{
    let descriptor = context
        .entity_resolver()
        .class_descriptor(object.entity_name());
    if let Some(property) = descriptor.as_ref().and_then(|d| d.property(name)) {
        return Ok(property.read_property(context, object)?);
    }
    if object.has_property(name) {
        return Ok(object.read_property_directly(name));
    }
    object
        .field(name)
        .ok_or_else(|| GraphError::UnknownProperty {
            property: name.to_string(),
            type_name: object.entity_name().to_string(),
        })
}
