use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use parking_lot::Mutex;

use crate::{
    errors::ResolveError,
    types::{Injectable, Instance},
};

type Supplier = Box<dyn FnOnce() -> Value + Send>;

/// Result of resolving a node
#[derive(Clone, Debug)]
pub enum Value {
    /// A single resolved instance
    Single(Instance),
    /// An ordered sequence of resolved instances
    Array(Vec<Instance>),
    /// Resolution failed
    Error(ResolveError),
    /// Not computed yet - computed at most once, when first forced
    Lazy(Arc<LazyValue>),
}

impl Value {
    pub fn single(instance: Instance) -> Self {
        Value::Single(instance)
    }

    pub fn array(instances: Vec<Instance>) -> Self {
        Value::Array(instances)
    }

    pub fn error(error: ResolveError) -> Self {
        Value::Error(error)
    }

    /// Defers `supplier` until the value is first forced
    pub fn lazy(supplier: impl FnOnce() -> Value + Send + 'static) -> Self {
        Value::Lazy(Arc::new(LazyValue::new(supplier)))
    }

    /// Computes a deferred value - the result is never [Value::Lazy]
    pub fn force(&self) -> Value {
        match self {
            Value::Lazy(lazy) => lazy.get().clone(),
            other => other.clone(),
        }
    }

    fn forced(&self) -> &Value {
        match self {
            Value::Lazy(lazy) => lazy.get(),
            other => other,
        }
    }

    pub fn as_single(&self) -> Option<&Instance> {
        match self.forced() {
            Value::Single(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Instance]> {
        match self.forced() {
            Value::Array(instances) => Some(instances),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ResolveError> {
        match self.forced() {
            Value::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_error().is_some()
    }
}

/// A deferred value
///
/// Every holder shares the same cell - whoever forces first runs the supplier,
/// everyone else waits for and observes that one result.
pub struct LazyValue {
    once: OnceLock<Value>,
    supplier: Mutex<Option<Supplier>>,
}
impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.once.get() {
            Some(value) => f.debug_tuple("LazyValue").field(value).finish(),
            None => f.debug_tuple("LazyValue").field(&"pending").finish(),
        }
    }
}

impl LazyValue {
    fn new(supplier: impl FnOnce() -> Value + Send + 'static) -> Self {
        LazyValue {
            once: OnceLock::new(),
            supplier: Mutex::new(Some(Box::new(supplier))),
        }
    }

    /// Forces the value
    pub fn get(&self) -> &Value {
        self.once.get_or_init(|| {
            let supplier = self.supplier.lock().take();
            match supplier {
                Some(supplier) => supplier().force(),
                // The cell is initialized exactly once, so the supplier is always still there
                None => Value::Error(ResolveError::Internal(
                    "deferred value was forced without a supplier".to_string(),
                )),
            }
        })
    }

    pub fn is_forced(&self) -> bool {
        self.once.get().is_some()
    }
}

/// Resolved inputs of a provider, in declaration order
#[derive(Debug)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        Args { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Result<&Value, ResolveError> {
        self.values.get(index).ok_or_else(|| {
            ResolveError::Internal(format!(
                "argument {index} requested, but only {} were resolved",
                self.values.len()
            ))
        })
    }

    pub fn instance(&self, index: usize) -> Result<&Instance, ResolveError> {
        let value = self.value(index)?;
        value.as_single().ok_or_else(|| {
            ResolveError::Internal(format!(
                "argument {index} is not a single value: {value:?}"
            ))
        })
    }

    /// The argument at `index` as a shared instance of `T`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ResolveError> {
        self.instance(index)?.downcast()
    }

    /// Like [Args::get] - but the zero value of an optional dependency is `None`
    pub fn try_get<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, ResolveError> {
        self.instance(index)?.downcast_opt()
    }

    /// All instances collected for the argument at `index`
    pub fn get_all<T: Injectable>(&self, index: usize) -> Result<Vec<Arc<T>>, ResolveError> {
        let value = self.value(index)?;
        let instances = value.as_array().ok_or_else(|| {
            ResolveError::Internal(format!(
                "argument {index} is not a collection: {value:?}"
            ))
        })?;
        instances.iter().map(Instance::downcast).collect()
    }
}
