//! Change tracking for loaded entities.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value as Json;
use tracing::debug;

use crate::changes::Changes;
use crate::error::{Error, Result};
use crate::mapping::{ChangeTracking, MappingRegistry, TypeKey};
use crate::object::{ObjectRef, Value};
use crate::observer::Observer;
use crate::transform::{CompareOptions, Mapper};

struct Armed {
    observer: Observer,
    fired: Arc<AtomicBool>,
}

/// A loaded entity paired with the document it was loaded from.
///
/// The entity's change tracking policy decides when
/// [`detect_changes`](Self::detect_changes) actually compares:
///
/// - `DeferredImplicit` compares every time.
/// - `DeferredExplicit` compares only after [`mark_dirty`](Self::mark_dirty).
/// - `Observe` compares only after a mutation was observed on the graph.
pub struct TrackedEntity {
    registry: Arc<MappingRegistry>,
    object: ObjectRef,
    root: TypeKey,
    original: Json,
    policy: ChangeTracking,
    options: CompareOptions,
    dirty: bool,
    armed: Option<Armed>,
}

impl TrackedEntity {
    /// Start tracking `object`, which was loaded from `original`.
    ///
    /// Fails if the object's type is not a mapped entity.
    pub fn new(registry: Arc<MappingRegistry>, object: ObjectRef, original: Json) -> Result<Self> {
        let key = object
            .type_key()
            .ok_or_else(|| Error::not_an_entity("untyped object"))?;
        let mapping = registry.get_mapping(key).ok_or(Error::UnknownMapping(key))?;
        let entity = mapping
            .entity_mapping()
            .ok_or_else(|| Error::not_an_entity(&mapping.name))?;

        let policy = entity.change_tracking;
        let root = mapping.inheritance_root;

        let mut tracked = Self {
            registry,
            object,
            root,
            original,
            policy,
            options: CompareOptions::default(),
            dirty: false,
            armed: None,
        };
        tracked.arm();
        Ok(tracked)
    }

    /// Set the comparison options.
    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// The tracked object.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The baseline document.
    pub fn original(&self) -> &Json {
        &self.original
    }

    /// The change tracking policy.
    pub fn policy(&self) -> ChangeTracking {
        self.policy
    }

    /// Flag the entity for comparison under `DeferredExplicit`.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the next [`detect_changes`](Self::detect_changes) will compare.
    pub fn is_candidate(&self) -> bool {
        match self.policy {
            ChangeTracking::DeferredImplicit => true,
            ChangeTracking::DeferredExplicit => self.dirty,
            ChangeTracking::Observe => self.armed.as_ref().is_some_and(|armed| {
                armed.observer.has_pending() || armed.fired.load(Ordering::Acquire)
            }),
        }
    }

    /// Compute the update for the tracked entity, if it has changed.
    ///
    /// A non-empty change set of a versioned hierarchy also increments the
    /// version field. The baseline is left untouched; call
    /// [`accept`](Self::accept) once the update has been applied.
    pub fn detect_changes(&mut self) -> Option<Changes> {
        if let Some(armed) = &self.armed {
            armed.observer.dispatch();
        }
        if !self.is_candidate() {
            return None;
        }

        let mapping = self.registry.get_mapping(self.root)?;
        let mapper = Mapper::new(&self.registry).with_options(self.options);
        let mut changes = mapper.diff(mapping, &Value::Object(self.object.clone()), &self.original);

        if changes.is_empty() {
            debug!(mapping = %mapping.name, "Tracked entity is unchanged");
            self.dirty = false;
            self.arm();
            return None;
        }

        if let Some(field) = self.registry.root_policy(self.root).and_then(|policy| policy.version_field()) {
            changes.increment(field, 1);
        }
        debug!(mapping = %mapping.name, operations = changes.len(), "Tracked entity changed");
        Some(changes)
    }

    /// Install `document` as the new baseline and start tracking afresh.
    pub fn accept(&mut self, document: Json) {
        self.original = document;
        self.dirty = false;
        self.arm();
    }

    fn arm(&mut self) {
        if self.policy != ChangeTracking::Observe {
            return;
        }
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let observer = Observer::new(self.registry.clone(), move || {
            flag.store(true, Ordering::Release);
        });
        observer.watch(&Value::Object(self.object.clone()));
        self.armed = Some(Armed { observer, fired });
    }
}

impl std::fmt::Debug for TrackedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedEntity")
            .field("object", &self.object)
            .field("policy", &self.policy)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
