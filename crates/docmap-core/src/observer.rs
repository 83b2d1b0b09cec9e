//! One-shot dirty detection on a live object graph.
//!
//! An [`Observer`] attaches to every object and list reachable from the
//! values it watches. The first real mutation deactivates it and arms its
//! callback, which runs on the next [`Observer::dispatch`] rather than inside
//! the mutating call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::identity::{IdentityGenerator, Identifier};
use crate::mapping::{FieldType, MappingRegistry, TypeKey};
use crate::object::{Mutation, Value, Visited, Watcher};

type Callback = Box<dyn FnOnce() + Send>;

struct WatchState {
    this: Weak<WatchState>,
    registry: Arc<MappingRegistry>,
    active: AtomicBool,
    pending: AtomicBool,
    callback: Mutex<Option<Callback>>,
}

impl WatchState {
    fn fire(&self, reason: &str) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.pending.store(true, Ordering::Release);
            trace!(reason, "Observer detected a change");
        }
    }

    /// Attach to `value` and everything reachable from it.
    fn adopt(&self, value: &Value) -> usize {
        let weak: Weak<dyn Watcher> = self.this.clone();
        attach(value, &weak, &mut Visited::new())
    }

    /// Whether `old` and `new` carry identifiers equal under the generator
    /// of the hierarchy they belong to.
    ///
    /// Returns `false` whenever no generator can be determined.
    fn same_reference(&self, owner: Option<TypeKey>, field: &str, old: &Value, new: &Value) -> bool {
        let (Some(old_id), Some(new_id)) = (reference_id(old), reference_id(new)) else {
            return false;
        };

        match self.generator_for(owner, field, old, new) {
            Some(generator) => generator.are_equal(&old_id, &new_id),
            None => false,
        }
    }

    fn generator_for(
        &self,
        owner: Option<TypeKey>,
        field: &str,
        old: &Value,
        new: &Value,
    ) -> Option<&Arc<dyn IdentityGenerator>> {
        let registry = &self.registry;

        let from_property = registry
            .get_mapping_for_constructor(owner)
            .and_then(|mapping| {
                registry
                    .properties(mapping)
                    .into_iter()
                    .find(|property| property.name == field)
            })
            .and_then(|property| match property.field_type.element() {
                FieldType::Reference(target) => Some(*target),
                _ => None,
            });

        let from_value = |value: &Value| {
            registry
                .get_mapping_for_object(value)
                .filter(|mapping| mapping.is_entity())
                .map(|mapping| mapping.key)
        };

        from_property
            .or_else(|| from_value(old))
            .or_else(|| from_value(new))
            .and_then(|key| registry.identity_for(key))
    }
}

impl Watcher for WatchState {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn notify(&self, mutation: Mutation<'_>) {
        if !self.is_active() {
            return;
        }
        match mutation {
            Mutation::Assign {
                owner,
                field,
                old,
                new,
            } => match old {
                Some(old) if old.same(new) => {}
                // The stub now stands in the graph and must stay watched.
                Some(old) if self.same_reference(owner, field, old, new) => {
                    self.adopt(new);
                }
                _ => self.fire(field),
            },
            Mutation::Remove { field } => self.fire(field),
            Mutation::Resize { from, to } => {
                if from != to {
                    self.fire("resize");
                }
            }
            Mutation::Replace { old, new, .. } => {
                if old.same(new) {
                    return;
                }
                if self.same_reference(None, "", old, new) {
                    self.adopt(new);
                } else {
                    self.fire("replace");
                }
            }
        }
    }
}

/// The identifier carried by a reference-shaped value.
fn reference_id(value: &Value) -> Option<Identifier> {
    match value {
        Value::Id(id) => Some(id.clone()),
        Value::Object(object) => object.id(),
        _ => None,
    }
}

/// Watches object graphs and reports the first change once.
pub struct Observer {
    state: Arc<WatchState>,
}

impl Observer {
    /// Create an observer that runs `callback` after the first change.
    ///
    /// The registry is used to find the identity generator when deciding
    /// whether a reassigned reference points at the same entity.
    pub fn new(registry: Arc<MappingRegistry>, callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            state: Arc::new_cyclic(|this| WatchState {
                this: this.clone(),
                registry,
                active: AtomicBool::new(true),
                pending: AtomicBool::new(false),
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        }
    }

    /// Watch `value` and every object and list reachable from it now.
    ///
    /// Nodes attached later are not watched. Dropping the observer stops
    /// all watching.
    pub fn watch(&self, value: &Value) {
        if !self.is_watching() {
            return;
        }
        let attached = self.state.adopt(value);
        trace!(nodes = attached, "Observer attached");
    }

    /// Whether no change has been detected yet.
    pub fn is_watching(&self) -> bool {
        self.state.is_active()
    }

    /// Whether a change was detected and the callback has not run yet.
    pub fn has_pending(&self) -> bool {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Run the callback if a change is pending. Returns whether it ran.
    ///
    /// The callback runs at most once over the observer's lifetime.
    pub fn dispatch(&self) -> bool {
        if !self.state.pending.swap(false, Ordering::AcqRel) {
            return false;
        }
        let callback = self.state.callback.lock().take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("watching", &self.is_watching())
            .field("pending", &self.has_pending())
            .finish()
    }
}

fn attach(value: &Value, watcher: &Weak<dyn Watcher>, visited: &mut Visited) -> usize {
    match value {
        Value::Object(object) => {
            if !visited.enter(object.address()) {
                return 0;
            }
            object.attach(watcher.clone());
            1 + object
                .fields()
                .iter()
                .map(|(_, field)| attach(field, watcher, visited))
                .sum::<usize>()
        }
        Value::List(list) => {
            if !visited.enter(list.address()) {
                return 0;
            }
            list.attach(watcher.clone());
            1 + list
                .items()
                .iter()
                .map(|item| attach(item, watcher, visited))
                .sum::<usize>()
        }
        _ => 0,
    }
}
