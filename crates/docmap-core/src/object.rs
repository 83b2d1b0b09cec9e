//! The live object graph.
//!
//! Objects and lists are shared, interior-mutable nodes. Cloning an
//! [`ObjectRef`] or [`ListRef`] shares the node, so graphs may contain
//! shared or cyclic structure. Every mutator reports to the watchers
//! attached to the node after the node lock has been released.

use crate::identity::Identifier;
use crate::mapping::{TypeKey, ID_FIELD};
use parking_lot::RwLock;
use serde_json::Value as Json;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

/// A value in the object graph.
#[derive(Clone)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// String.
    String(String),
    /// An entity identifier, used as an unhydrated reference.
    Id(Identifier),
    /// A shared list.
    List(ListRef),
    /// A shared object.
    Object(ObjectRef),
}

impl Value {
    /// Check if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The object handle, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The list handle, if this is a list.
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// The string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The identifier, if this is an id.
    pub fn as_id(&self) -> Option<&Identifier> {
        match self {
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Interpret this value as an identifier.
    ///
    /// Ids, strings and integers are identifiers themselves; objects yield
    /// their `_id` field.
    pub fn identifier(&self) -> Option<Identifier> {
        match self {
            Value::Id(id) => Some(id.clone()),
            Value::String(s) => Some(Identifier::new(s.clone())),
            Value::Integer(i) => Some(Identifier::from_integer(*i)),
            Value::Object(object) => object.id(),
            _ => None,
        }
    }

    /// Shallow identity: equal scalars, or handles to the same node.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a.same_raw(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// A shallow document rendering, used as the offending value in errors.
    ///
    /// Nested objects and lists are not expanded.
    pub fn summary(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::String(s) => Json::String(s.clone()),
            Value::Id(id) => id.to_document(),
            Value::List(list) => Json::String(format!("[list; {}]", list.len())),
            Value::Object(object) => match object.id() {
                Some(id) => {
                    let mut stub = serde_json::Map::new();
                    stub.insert(ID_FIELD.to_string(), id.to_document());
                    Json::Object(stub)
                }
                None => Json::String("[object]".to_string()),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Id(id) => write!(f, "Id({id})"),
            Value::List(list) => list.fmt(f),
            Value::Object(object) => object.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Identifier> for Value {
    fn from(value: Identifier) -> Self {
        Value::Id(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<ListRef> for Value {
    fn from(value: ListRef) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A mutation reported to watchers.
pub(crate) enum Mutation<'a> {
    /// A field was assigned.
    Assign {
        owner: Option<TypeKey>,
        field: &'a str,
        old: Option<&'a Value>,
        new: &'a Value,
    },
    /// A field was removed.
    Remove { field: &'a str },
    /// A list changed length.
    Resize { from: usize, to: usize },
    /// A list element was replaced.
    Replace {
        index: usize,
        old: &'a Value,
        new: &'a Value,
    },
}

/// Receives mutations from the nodes it is attached to.
pub(crate) trait Watcher: Send + Sync {
    /// Whether the watcher still wants notifications.
    fn is_active(&self) -> bool;

    /// Handle a mutation.
    fn notify(&self, mutation: Mutation<'_>);
}

type Watchers = Vec<Weak<dyn Watcher>>;

/// Drop detached watchers and upgrade the remaining ones.
fn live_watchers(watchers: &mut Watchers) -> Vec<Arc<dyn Watcher>> {
    let mut live = Vec::with_capacity(watchers.len());
    watchers.retain(|weak| match weak.upgrade() {
        Some(watcher) if watcher.is_active() => {
            live.push(watcher);
            true
        }
        _ => false,
    });
    live
}

/// Attach a watcher, dropping any whose observer is gone.
fn attach_to(watchers: &mut Watchers, watcher: Weak<dyn Watcher>) {
    watchers.retain(|weak| weak.strong_count() > 0);
    watchers.push(watcher);
}

struct ObjectData {
    type_key: Option<TypeKey>,
    fields: BTreeMap<String, Value>,
    watchers: Watchers,
}

/// A shared handle to an object node.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<ObjectData>>);

impl ObjectRef {
    /// Create an empty object of a mapped type.
    pub fn new(type_key: TypeKey) -> Self {
        Self::with_type(Some(type_key))
    }

    /// Create an empty object with no mapped type.
    ///
    /// Untyped objects are used for plain records and reference stubs.
    pub fn untyped() -> Self {
        Self::with_type(None)
    }

    fn with_type(type_key: Option<TypeKey>) -> Self {
        Self(Arc::new(RwLock::new(ObjectData {
            type_key,
            fields: BTreeMap::new(),
            watchers: Vec::new(),
        })))
    }

    /// Create an untyped reference stub carrying only an identifier.
    pub fn stub(id: Identifier) -> Self {
        Self::untyped().with(ID_FIELD, id)
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// The mapped type of this object.
    pub fn type_key(&self) -> Option<TypeKey> {
        self.0.read().type_key
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.read().fields.get(field).cloned()
    }

    /// Check whether a field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.0.read().fields.contains_key(field)
    }

    /// Snapshot of all fields.
    pub fn fields(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// The object's `_id` field as an identifier.
    pub fn id(&self) -> Option<Identifier> {
        match self.0.read().fields.get(ID_FIELD)? {
            Value::Object(_) => None,
            other => other.identifier(),
        }
    }

    /// Assign a field, returning the previous value.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let field = field.into();
        let value = value.into();

        let (old, owner, watchers) = {
            let mut data = self.0.write();
            let old = data.fields.insert(field.clone(), value.clone());
            (old, data.type_key, live_watchers(&mut data.watchers))
        };

        for watcher in watchers {
            watcher.notify(Mutation::Assign {
                owner,
                field: &field,
                old: old.as_ref(),
                new: &value,
            });
        }
        old
    }

    /// Remove a field, returning its value.
    pub fn remove(&self, field: &str) -> Option<Value> {
        let (old, watchers) = {
            let mut data = self.0.write();
            let old = data.fields.remove(field);
            (old, live_watchers(&mut data.watchers))
        };

        if old.is_some() {
            for watcher in watchers {
                watcher.notify(Mutation::Remove { field });
            }
        }
        old
    }

    /// Check whether two handles share a node.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn attach(&self, watcher: Weak<dyn Watcher>) {
        attach_to(&mut self.0.write().watchers, watcher);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.read();
        let mut s = f.debug_struct("Object");
        s.field("type", &data.type_key);
        for (name, value) in &data.fields {
            match value {
                Value::Object(_) => s.field(name, &"{..}"),
                Value::List(_) => s.field(name, &"[..]"),
                other => s.field(name, other),
            };
        }
        s.finish()
    }
}

struct ListData {
    items: Vec<Value>,
    watchers: Watchers,
}

/// A shared handle to a list node.
#[derive(Clone)]
pub struct ListRef(Arc<RwLock<ListData>>);

impl ListRef {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    /// Create a list holding `items`.
    pub fn from_values(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(ListData {
            items,
            watchers: Vec::new(),
        })))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.read().items.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.read().items.is_empty()
    }

    /// Get an item.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().items.get(index).cloned()
    }

    /// Snapshot of all items.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().items.clone()
    }

    /// Append an item.
    pub fn push(&self, value: impl Into<Value>) {
        let value = value.into();
        self.resize_with(|items| {
            items.push(value);
        });
    }

    /// Remove the last item.
    pub fn pop(&self) -> Option<Value> {
        let mut popped = None;
        self.resize_with(|items| popped = items.pop());
        popped
    }

    /// Insert an item at `index`. Out of range indexes append.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        self.resize_with(|items| {
            let index = index.min(items.len());
            items.insert(index, value);
        });
    }

    /// Remove the item at `index`.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut removed = None;
        self.resize_with(|items| {
            if index < items.len() {
                removed = Some(items.remove(index));
            }
        });
        removed
    }

    /// Remove all items.
    pub fn clear(&self) {
        self.resize_with(Vec::clear);
    }

    /// Replace the item at `index`, returning the previous item.
    ///
    /// Returns `None` and changes nothing when `index` is out of range.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();

        let (old, watchers) = {
            let mut data = self.0.write();
            let slot = data.items.get_mut(index)?;
            let old = std::mem::replace(slot, value.clone());
            (old, live_watchers(&mut data.watchers))
        };

        for watcher in watchers {
            watcher.notify(Mutation::Replace {
                index,
                old: &old,
                new: &value,
            });
        }
        Some(old)
    }

    fn resize_with(&self, f: impl FnOnce(&mut Vec<Value>)) {
        let (from, to, watchers) = {
            let mut data = self.0.write();
            let from = data.items.len();
            f(&mut data.items);
            (from, data.items.len(), live_watchers(&mut data.watchers))
        };

        if from != to {
            for watcher in watchers {
                watcher.notify(Mutation::Resize { from, to });
            }
        }
    }

    /// Check whether two handles share a node.
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn attach(&self, watcher: Weak<dyn Watcher>) {
        attach_to(&mut self.0.write().watchers, watcher);
    }
}

impl Default for ListRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "List(len = {})", self.len())
    }
}

/// Nodes on the current walk, keyed by address.
#[derive(Debug, Default)]
pub struct Visited(HashSet<usize>);

impl Visited {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a node. Returns `false` if it is already on the walk.
    pub(crate) fn enter(&mut self, address: usize) -> bool {
        self.0.insert(address)
    }

    /// Leave a node.
    pub(crate) fn leave(&mut self, address: usize) {
        self.0.remove(&address);
    }
}
