use crate::{dependency::Dependency, errors::ResolveError, value::Value};

pub mod arc;

/// Maps a parameter type to the dependency it declares
/// and extracts the parameter from the resolved value
pub trait Resolver: Sized {
    fn dependency() -> Dependency;

    fn extract(value: &Value) -> Result<Self, ResolveError>;
}
