use std::{
    fmt,
    sync::{Arc, OnceLock},
};

/// A named lifecycle in the scope tree
///
/// Scopes compare by identity: two scopes with the same name are still distinct.
/// [Scope::global] is the root of every tree.
#[derive(Clone)]
pub struct Scope(Arc<ScopeInner>);
struct ScopeInner {
    name: String,
    parent: Option<Scope>,
}

static GLOBAL: OnceLock<Scope> = OnceLock::new();

impl Scope {
    /// The root scope, the only scope without a parent
    pub fn global() -> Scope {
        GLOBAL
            .get_or_init(|| {
                Scope(Arc::new(ScopeInner {
                    name: "global".to_string(),
                    parent: None,
                }))
            })
            .clone()
    }

    /// Creates a new child scope of `parent`
    pub fn new(name: impl Into<String>, parent: &Scope) -> Scope {
        Scope(Arc::new(ScopeInner {
            name: name.into(),
            parent: Some(parent.clone()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    pub fn is_global(&self) -> bool {
        self.0.parent.is_none()
    }

    /// Whether this scope may be entered while `current` is the innermost entered scope
    ///
    /// Only the global scope and direct children of `current` can be entered.
    pub fn can_enter_directly_from(&self, current: &Scope) -> bool {
        self.is_global() || self.parent() == Some(current)
    }

    /// Whether `self` is `other` or one of its ancestors
    pub fn encloses(&self, other: &Scope) -> bool {
        let mut cursor = Some(other);
        while let Some(scope) = cursor {
            if scope == self {
                return true;
            }
            cursor = scope.parent();
        }
        false
    }

    /// Path from the root to this scope, e.g. `global/request`
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}/{}", parent.path(), self.name()),
            None => self.name().to_string(),
        }
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scope").field(&self.path()).finish()
    }
}
impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
