use std::sync::Arc;

use crate::{
    dependency::Dependency,
    errors::ResolveError,
    resolver::Resolver,
    types::{Injectable, Instance},
    value::Value,
};

fn single(value: &Value) -> Result<&Instance, ResolveError> {
    match value.as_error() {
        Some(error) => Err(error.clone()),
        None => value.as_single().ok_or_else(|| {
            ResolveError::Internal(format!("expected a single value, got {value:?}"))
        }),
    }
}

impl<T: Injectable> Resolver for Arc<T> {
    fn dependency() -> Dependency {
        Dependency::on::<T>()
    }

    fn extract(value: &Value) -> Result<Self, ResolveError> {
        single(value)?.downcast()
    }
}

impl<T: Injectable> Resolver for Option<Arc<T>> {
    fn dependency() -> Dependency {
        Dependency::on::<T>().optional()
    }

    fn extract(value: &Value) -> Result<Self, ResolveError> {
        single(value)?.downcast_opt()
    }
}

impl<T: Injectable> Resolver for Vec<Arc<T>> {
    fn dependency() -> Dependency {
        Dependency::all::<T>()
    }

    fn extract(value: &Value) -> Result<Self, ResolveError> {
        if let Some(error) = value.as_error() {
            return Err(error.clone());
        }
        value
            .as_array()
            .ok_or_else(|| {
                ResolveError::Internal(format!("expected a collection, got {value:?}"))
            })?
            .iter()
            .map(Instance::downcast)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeInfo;

    #[test]
    fn arc_requires_a_present_value() {
        let present = Value::single(Instance::new(1_i64));
        let absent = Value::single(Instance::absent(TypeInfo::of::<i64>()));

        assert_eq!(*Arc::<i64>::extract(&present).unwrap(), 1);
        assert!(matches!(
            Arc::<i64>::extract(&absent),
            Err(ResolveError::Absent { .. })
        ));
        assert!(Option::<Arc<i64>>::extract(&absent).unwrap().is_none());
    }

    #[test]
    fn vec_extracts_collections() {
        let value = Value::array(vec![Instance::new(1_i64), Instance::new(2_i64)]);

        let extracted = Vec::<Arc<i64>>::extract(&value).unwrap();
        assert_eq!(extracted.iter().map(|v| **v).collect::<Vec<_>>(), vec![1, 2]);
        assert!(Vec::<Arc<i64>>::dependency().is_collector());
    }

    #[test]
    fn errors_pass_through() {
        let value = Value::error(ResolveError::Missing {
            dependency: "i64".into(),
        });

        assert!(matches!(
            Arc::<i64>::extract(&value),
            Err(ResolveError::Missing { .. })
        ));
    }
}
