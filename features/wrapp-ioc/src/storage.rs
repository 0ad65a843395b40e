use std::{fmt, sync::Arc};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    errors::{ResolveError, ScopeError},
    graph::node::NodeId,
    scope::Scope,
    value::Value,
};

/// Cache of computed node values for one entered instance of a scope
///
/// Frames form a chain mirroring the entered scopes, rooted at the global scope.
/// A frame is only written through its own maps and lives as long as a container holds it.
#[derive(Clone)]
pub struct ScopeStorage(Arc<Frame>);

struct Frame {
    scope: Scope,
    parent: Option<ScopeStorage>,
    values: DashMap<NodeId, Value>,
    locks: DashMap<NodeId, Arc<Mutex<()>>>,
}

impl fmt::Debug for ScopeStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeStorage")
            .field("scope", &self.0.scope)
            .field("cached", &self.0.values.len())
            .finish()
    }
}

impl ScopeStorage {
    /// The frame of the global scope
    pub fn root() -> Self {
        ScopeStorage(Arc::new(Frame {
            scope: Scope::global(),
            parent: None,
            values: DashMap::new(),
            locks: DashMap::new(),
        }))
    }

    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }

    pub fn parent(&self) -> Option<&ScopeStorage> {
        self.0.parent.as_ref()
    }

    /// A fresh frame for `scope`, linked to this one
    pub fn enter(&self, scope: &Scope) -> Result<ScopeStorage, ScopeError> {
        if !scope.can_enter_directly_from(self.scope()) {
            return Err(ScopeError::CannotEnter {
                scope: scope.path(),
                current: self.scope().path(),
            });
        }

        tracing::debug!("Entering scope '{}'", scope);
        Ok(ScopeStorage(Arc::new(Frame {
            scope: scope.clone(),
            parent: Some(self.clone()),
            values: DashMap::new(),
            locks: DashMap::new(),
        })))
    }

    /// The frame this one was entered from - the root frame stays where it is
    pub fn leave(&self) -> ScopeStorage {
        tracing::debug!("Leaving scope '{}'", self.scope());
        match self.parent() {
            Some(parent) => parent.clone(),
            None => self.clone(),
        }
    }

    /// This frame followed by the frames it was entered from
    fn chain(&self) -> impl Iterator<Item = &ScopeStorage> {
        std::iter::successors(Some(self), |storage| storage.parent())
    }

    /// The closest frame of `scope`
    pub fn frame_for(&self, scope: &Scope) -> Option<&ScopeStorage> {
        self.chain().find(|storage| storage.scope() == scope)
    }

    pub fn has_frame(&self, scope: &Scope) -> bool {
        self.frame_for(scope).is_some()
    }

    /// The value cached for `node` in this frame
    pub fn cached(&self, node: NodeId) -> Option<Value> {
        self.0.values.get(&node).map(|value| value.clone())
    }

    /// The value of `node`, computed by `supplier` at most once per frame of `scope`
    ///
    /// Without a scope the supplier is always called. Otherwise the value lives in the
    /// closest frame of `scope` and failures are not cached. The returned value is
    /// deferred - nothing is computed until it is forced.
    pub fn get_or_else(
        &self,
        node: NodeId,
        scope: Option<&Scope>,
        supplier: impl FnOnce() -> Value + Send + 'static,
    ) -> Value {
        let Some(scope) = scope else {
            return Value::lazy(supplier);
        };

        let Some(frame) = self.frame_for(scope).cloned() else {
            return Value::error(ResolveError::ScopeNotEntered {
                scope: scope.path(),
            });
        };

        Value::lazy(move || frame.get_or_compute(node, supplier))
    }

    /// Double-checked locking on the `(frame, node)` lock
    ///
    /// 1. A cached value is returned without locking
    /// 2. Otherwise the node's lock is taken, created on first use
    /// 3. The cache is checked again, a concurrent caller may have filled it meanwhile
    /// 4. The supplier runs under the lock and only a success is cached
    fn get_or_compute(&self, node: NodeId, supplier: impl FnOnce() -> Value) -> Value {
        if let Some(value) = self.cached(node) {
            tracing::trace!("Cache hit for {} in '{}'", node, self.scope());
            return value;
        }

        let lock = self.0.locks.entry(node).or_default().clone();
        let _guard = lock.lock();
        tracing::trace!("Locked {} in '{}'", node, self.scope());

        if let Some(value) = self.cached(node) {
            tracing::trace!("Cache hit for {} in '{}' after locking", node, self.scope());
            return value;
        }

        tracing::trace!("Computing {} in '{}'", node, self.scope());
        let value = supplier().force();
        if !value.is_error() {
            self.0.values.insert(node, value.clone());
        }
        value
    }
}
