use std::{
    any::{Any, TypeId},
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::errors::ResolveError;

/// All errors must be shareable between threads
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Resolution may happen on any thread and cached values are shared between them,
/// so anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Source location a provider was declared at
pub type Location = &'static std::panic::Location<'static>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier, shared by providers, components and graph nodes
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// A type-erased, shared value produced by a provider
///
/// An instance without a payload is *absent*: the zero value of a type which has no
/// `Default`, handed out for optional dependencies nothing satisfies.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    payload: Option<Arc<dyn Any + Send + Sync + 'static>>,
}
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.payload.is_some() {
            "present"
        } else {
            "absent"
        };
        f.debug_tuple("Instance")
            .field(&self.info.type_name)
            .field(&state)
            .finish()
    }
}

impl Instance {
    pub fn new<T: Injectable>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<T: Injectable>(instance: Arc<T>) -> Self {
        Instance {
            info: TypeInfo::of::<T>(),
            payload: Some(instance as Arc<dyn Any + Send + Sync>),
        }
    }

    /// The zero value of a type without a default
    pub fn absent(info: TypeInfo) -> Self {
        Instance {
            info,
            payload: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.payload.is_none()
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, ResolveError> {
        let Some(payload) = self.payload.clone() else {
            return Err(ResolveError::Absent {
                type_name: self.info.type_name,
            });
        };

        Arc::downcast::<T>(payload).map_err(|_| ResolveError::Downcast {
            required_type: std::any::type_name::<T>(),
            actual_type: self.info.type_name,
        })
    }

    /// Like [Instance::downcast] - but an absent instance is `None` instead of an error
    pub fn downcast_opt<T: Injectable>(&self) -> Result<Option<Arc<T>>, ResolveError> {
        if self.is_absent() {
            return Ok(None);
        }
        self.downcast().map(Some)
    }

    /// Whether two instances share the same payload
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        match (&self.payload, &other.payload) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => self.info == other.info,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downcast_checks_the_type() {
        let instance = Instance::new(7_u32);

        assert_eq!(*instance.downcast::<u32>().unwrap(), 7);
        assert!(matches!(
            instance.downcast::<i64>(),
            Err(ResolveError::Downcast {
                actual_type: "u32",
                ..
            })
        ));
    }

    #[test]
    fn absent_instances_only_downcast_optionally() {
        let instance = Instance::absent(TypeInfo::of::<String>());

        assert!(instance.is_absent());
        assert!(matches!(
            instance.downcast::<String>(),
            Err(ResolveError::Absent { .. })
        ));
        assert!(instance.downcast_opt::<String>().unwrap().is_none());
    }

    #[test]
    fn clones_share_the_payload() {
        let instance = Instance::new("shared".to_string());
        let copy = instance.clone();

        assert!(instance.ptr_eq(&copy));
        assert!(!instance.ptr_eq(&Instance::new("shared".to_string())));
    }
}
