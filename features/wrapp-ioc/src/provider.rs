use std::{fmt, sync::Arc};

use crate::{
    dependency::Dependency,
    errors::ResolveError,
    resolver::Resolver,
    scope::Scope,
    types::{next_id, DynError, Injectable, Instance, Location, TypeInfo},
    value::Args,
};

type Body = Arc<dyn Fn(&Args) -> Result<Vec<Instance>, DynError> + Send + Sync>;

/// Identifies a provider
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProviderId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Function,
    Structure,
    Constant,
    Dynamic,
    /// An ad hoc request - provides no components
    Consumer,
}

/// A component a provider yields
#[derive(Debug, Clone)]
pub struct Output {
    pub type_info: TypeInfo,
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub hidden: bool,
    pub ignored: bool,
}
impl Output {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Output {
            type_info: TypeInfo::of::<T>(),
            name: None,
            tags: Vec::new(),
            hidden: false,
            ignored: false,
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
}

/// A struct which can be assembled from its dependencies
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wrapp_ioc::{Args, Assemble, Dependency, DynError};
///
/// struct Server {
///     port: Arc<u16>,
/// }
/// impl Assemble for Server {
///     fn dependencies() -> Vec<Dependency> {
///         vec![Dependency::on::<u16>().named("port")]
///     }
///
///     fn assemble(args: &Args) -> Result<Self, DynError> {
///         Ok(Server { port: args.get(0)? })
///     }
/// }
/// ```
pub trait Assemble: Injectable + Sized {
    /// Returns a list of dependencies required to assemble the struct
    fn dependencies() -> Vec<Dependency>;

    /// Assembles the struct from the resolved dependencies, in the order of [Assemble::dependencies]
    fn assemble(args: &Args) -> Result<Self, DynError>;
}

/// A function whose parameters are all [Resolver]s
///
/// Implemented for closures with up to eight parameters returning a `Result`.
pub trait Inject<Params>: Send + Sync + 'static {
    type Output: Injectable;

    fn dependencies() -> Vec<Dependency>;

    fn call(&self, args: &Args) -> Result<Self::Output, DynError>;
}

macro_rules! impl_inject {
    ($($param:ident),*) => {
        impl<Func, Out, Err, $($param,)*> Inject<($($param,)*)> for Func
        where
            Func: Fn($($param),*) -> Result<Out, Err> + Send + Sync + 'static,
            Out: Injectable,
            Err: Into<DynError>,
            $($param: Resolver,)*
        {
            type Output = Out;

            fn dependencies() -> Vec<Dependency> {
                vec![$($param::dependency()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
            fn call(&self, args: &Args) -> Result<Out, DynError> {
                let mut index = 0;
                $(
                    let $param = $param::extract(args.value(index)?)?;
                    index += 1;
                )*
                (self)($($param),*).map_err(Into::into)
            }
        }
    };
}

impl_inject!();
impl_inject!(A);
impl_inject!(A, B);
impl_inject!(A, B, C);
impl_inject!(A, B, C, D);
impl_inject!(A, B, C, D, E);
impl_inject!(A, B, C, D, E, F);
impl_inject!(A, B, C, D, E, F, G);
impl_inject!(A, B, C, D, E, F, G, H);

/// A source of components
///
/// Declares an ordered list of dependencies and yields one value per [Output].
/// A clone is a separate provider with its own identity, sharing only the body.
pub struct Provider {
    id: ProviderId,
    kind: ProviderKind,
    label: String,
    dependencies: Vec<Dependency>,
    outputs: Vec<Output>,
    scope: Option<Scope>,
    location: Location,
    body: Body,
}
impl Clone for Provider {
    fn clone(&self) -> Self {
        Provider {
            id: ProviderId(next_id()),
            kind: self.kind,
            label: self.label.clone(),
            dependencies: self.dependencies.clone(),
            outputs: self.outputs.clone(),
            scope: self.scope.clone(),
            location: self.location,
            body: self.body.clone(),
        }
    }
}
impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("outputs", &self.outputs)
            .field("scope", &self.scope)
            .field("location", &self.location)
            .finish()
    }
}
impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.label, self.location)
    }
}

impl Provider {
    #[track_caller]
    fn new(
        kind: ProviderKind,
        label: String,
        dependencies: Vec<Dependency>,
        outputs: Vec<Output>,
        body: Body,
    ) -> Self {
        let scope = match kind {
            ProviderKind::Consumer => None,
            _ => Some(Scope::global()),
        };
        Provider {
            id: ProviderId(next_id()),
            kind,
            label,
            dependencies,
            outputs,
            scope,
            location: std::panic::Location::caller(),
            body,
        }
    }

    /// Provides the result of a function, its parameters are injected
    ///
    /// ```rust
    /// use std::{convert::Infallible, sync::Arc};
    /// use wrapp_ioc::Provider;
    ///
    /// let greeting = Provider::func(|name: Arc<String>| Ok::<_, Infallible>(format!("hello {name}")));
    /// ```
    #[track_caller]
    pub fn func<Params, Func: Inject<Params>>(func: Func) -> Self {
        let output = Output::of::<Func::Output>();
        let label = format!("func -> {}", output.type_info);
        Self::new(
            ProviderKind::Function,
            label,
            Func::dependencies(),
            vec![output],
            Arc::new(move |args: &Args| func.call(args).map(|out| vec![Instance::new(out)])),
        )
    }

    /// Provides an existing value
    #[track_caller]
    pub fn constant<T: Injectable>(value: T) -> Self {
        let instance = Instance::new(value);
        Self::new(
            ProviderKind::Constant,
            format!("const {}", instance.info),
            vec![],
            vec![Output::of::<T>()],
            Arc::new(move |_: &Args| Ok::<_, DynError>(vec![instance.clone()])),
        )
    }

    /// Provides a struct assembled from its dependencies
    #[track_caller]
    pub fn structure<S: Assemble>() -> Self {
        Self::new(
            ProviderKind::Structure,
            format!("struct {}", std::any::type_name::<S>()),
            S::dependencies(),
            vec![Output::of::<S>()],
            Arc::new(|args: &Args| S::assemble(args).map(|s| vec![Instance::new(s)])),
        )
    }

    /// Provides several components from explicitly declared dependencies
    ///
    /// The body must return one instance per output, in order.
    #[track_caller]
    pub fn dynamic(
        dependencies: Vec<Dependency>,
        outputs: Vec<Output>,
        body: impl Fn(&Args) -> Result<Vec<Instance>, DynError> + Send + Sync + 'static,
    ) -> Self {
        let label = format!(
            "dynamic -> ({})",
            outputs
                .iter()
                .map(|o| o.type_info.type_name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self::new(
            ProviderKind::Dynamic,
            label,
            dependencies,
            outputs,
            Arc::new(body),
        )
    }

    /// An ad hoc request, yielding its result without providing a component
    #[track_caller]
    pub(crate) fn consumer(
        label: String,
        dependencies: Vec<Dependency>,
        body: impl Fn(&Args) -> Result<Instance, DynError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            ProviderKind::Consumer,
            label,
            dependencies,
            vec![],
            Arc::new(move |args: &Args| body(args).map(|result| vec![result])),
        )
    }
}

// Modifiers
impl Provider {
    /// Names the last output
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(output) = self.outputs.last_mut() {
            output.name = Some(name.into());
        }
        self
    }

    /// Tags the last output
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        if let Some(output) = self.outputs.last_mut() {
            output.tags.push(tag.into());
        }
        self
    }

    /// Hides the last output from dependencies which do not ask for it by name
    pub fn hidden(mut self) -> Self {
        if let Some(output) = self.outputs.last_mut() {
            output.hidden = true;
        }
        self
    }

    /// Excludes the last output from every dependency
    pub fn ignored(mut self) -> Self {
        if let Some(output) = self.outputs.last_mut() {
            output.ignored = true;
        }
        self
    }

    /// Caches the provided components per entered instance of `scope`
    pub fn in_scope(mut self, scope: &Scope) -> Self {
        if self.kind != ProviderKind::Consumer {
            self.scope = Some(scope.clone());
        }
        self
    }

    /// Replaces the label used in diagnostics
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

// Accessors
impl Provider {
    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// The scope caching this provider - `None` for consumers
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn is_consumer(&self) -> bool {
        self.kind == ProviderKind::Consumer
    }

    /// Runs the provider's business logic
    pub fn invoke(&self, args: &Args) -> Result<Vec<Instance>, DynError> {
        (self.body)(args)
    }

    /// Runs the provider and checks its outputs against the declaration
    pub(crate) fn produce(&self, args: &Args) -> Result<Vec<Instance>, ResolveError> {
        let instances = self
            .invoke(args)
            .map_err(|error| ResolveError::provider_failed(self.to_string(), error))?;

        if self.is_consumer() {
            return match instances.len() {
                1 => Ok(instances),
                count => Err(ResolveError::Internal(format!(
                    "consumer '{self}' produced {count} results"
                ))),
            };
        }

        if instances.len() != self.outputs.len() {
            return Err(ResolveError::Internal(format!(
                "'{self}' declares {} outputs but produced {}",
                self.outputs.len(),
                instances.len()
            )));
        }
        for (instance, output) in instances.iter().zip(&self.outputs) {
            if instance.info.type_id != output.type_info.type_id {
                return Err(ResolveError::Internal(format!(
                    "'{self}' declares '{}' but produced '{}'",
                    output.type_info, instance.info
                )));
            }
        }

        Ok(instances)
    }
}
