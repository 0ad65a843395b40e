use std::fmt;

use crate::{
    repository::Component,
    types::{Injectable, Instance, TypeInfo},
};

/// Filter over components by type, name and tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub type_info: Option<TypeInfo>,
    pub name: Option<String>,
    pub tags: Vec<String>,
}

impl Criteria {
    /// Matches every visible component
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of<T: 'static + ?Sized>() -> Self {
        Criteria {
            type_info: Some(TypeInfo::of::<T>()),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether the component satisfies this filter
    ///
    /// Ignored components never match, hidden components only match when asked for by name.
    pub fn matches(&self, component: &Component) -> bool {
        if component.is_ignored() {
            return false;
        }
        if let Some(type_info) = &self.type_info {
            if type_info.type_id != component.type_info().type_id {
                return false;
            }
        }
        match &self.name {
            Some(name) if component.name() != Some(name.as_str()) => return false,
            None if component.is_hidden() => return false,
            _ => {}
        }
        self.tags
            .iter()
            .all(|tag| component.tags().iter().any(|t| t == tag))
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_info {
            Some(type_info) => write!(f, "{type_info}")?,
            None => f.write_str("any")?,
        }
        if let Some(name) = &self.name {
            write!(f, " named '{name}'")?;
        }
        if !self.tags.is_empty() {
            write!(f, " tagged {:?}", self.tags)?;
        }
        Ok(())
    }
}

/// One declared input of a provider
#[derive(Debug, Clone)]
pub struct Dependency {
    type_info: TypeInfo,
    criteria: Criteria,
    optional: bool,
    collector: bool,
    zero: Option<Instance>,
}

impl Dependency {
    /// A required dependency on exactly one `T`
    pub fn on<T: 'static + ?Sized>() -> Self {
        Dependency {
            type_info: TypeInfo::of::<T>(),
            criteria: Criteria::of::<T>(),
            optional: false,
            collector: false,
            zero: None,
        }
    }

    /// A dependency on every matching `T`
    pub fn all<T: 'static + ?Sized>() -> Self {
        Dependency {
            collector: true,
            ..Self::on::<T>()
        }
    }

    /// An optional dependency resolving to `T::default()` when nothing matches
    pub fn defaulted<T: Injectable + Default>() -> Self {
        Dependency {
            optional: true,
            zero: Some(Instance::new(T::default())),
            ..Self::on::<T>()
        }
    }

    /// Makes the dependency optional - when nothing matches it resolves to an absent instance
    pub fn optional(mut self) -> Self {
        self.optional = true;
        if self.zero.is_none() {
            self.zero = Some(Instance::absent(self.type_info));
        }
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.criteria = self.criteria.named(name);
        self
    }

    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.criteria = self.criteria.tagged(tag);
        self
    }

    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_collector(&self) -> bool {
        self.collector
    }

    /// Value used when an optional dependency matches nothing
    pub fn zero(&self) -> Instance {
        self.zero
            .clone()
            .unwrap_or_else(|| Instance::absent(self.type_info))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collector {
            write!(f, "all of {}", self.criteria)
        } else {
            write!(f, "{}", self.criteria)
        }
    }
}
