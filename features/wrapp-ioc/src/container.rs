use std::{any::type_name, fmt::Debug, sync::Arc};

use crate::{
    builder::{ContainerBuilder, ContainerOptions},
    dependency::{Criteria, Dependency},
    errors::{BuildError, ResolveError, ScopeError},
    executor::{Executor, Resolution, ResolutionPath},
    graph::{builder::GraphBuilder, DependenceGraph},
    module::Module,
    provider::{Assemble, Inject, Provider},
    repository::{Component, Repository},
    resolver::Resolver,
    scope::Scope,
    storage::ScopeStorage,
    types::{DynError, Injectable, Instance},
    value::{Args, Value},
};

/// Resolves the components of a module, caching them per entered scope
///
/// Cloning a container is cheap. Entering and leaving scopes returns a new container
/// sharing the graph, bound to another chain of frames.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
    storage: ScopeStorage,
}
struct ContainerInner {
    repository: Repository,
    graph: Arc<DependenceGraph>,
    options: ContainerOptions,
}
impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("scope", self.storage.scope())
            .field("components", &self.inner.repository.all_components().len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Container {
    /// Validates the module and builds its dependence graph
    pub fn new(module: &Module, options: ContainerOptions) -> Result<Self, BuildError> {
        let repository = Repository::new(module);
        tracing::debug!(
            "Creating container for '{}' with {} providers and {} components",
            module.name(),
            repository.providers().len(),
            repository.all_components().len()
        );
        repository.validate()?;

        let mut graph = DependenceGraph::default();
        GraphBuilder::new(&repository, &mut graph).add_components();
        graph.check(&options)?;

        if options != ContainerOptions::default() {
            if let Err(errors) = graph.check(&ContainerOptions::default()) {
                for error in &errors.errors {
                    tracing::warn!("Ignoring configuration error: {}", error);
                }
            }
        }

        Ok(Container {
            inner: Arc::new(ContainerInner {
                repository,
                graph: Arc::new(graph),
                options,
            }),
            storage: ScopeStorage::root(),
        })
    }

    pub fn builder(module: Module) -> ContainerBuilder {
        ContainerBuilder::new(module)
    }

    /// The innermost entered scope
    pub fn scope(&self) -> &Scope {
        self.storage.scope()
    }

    /// A container bound to a fresh frame of `scope`
    ///
    /// Only the global scope and direct children of the current scope can be entered.
    pub fn enter_scope(&self, scope: &Scope) -> Result<Container, ScopeError> {
        Ok(Container {
            inner: self.inner.clone(),
            storage: self.storage.enter(scope)?,
        })
    }

    /// A container bound to the frame the current scope was entered from
    pub fn leave_scope(&self) -> Container {
        Container {
            inner: self.inner.clone(),
            storage: self.storage.leave(),
        }
    }

    pub fn graph(&self) -> &Arc<DependenceGraph> {
        &self.inner.graph
    }

    pub fn repository(&self) -> &Repository {
        &self.inner.repository
    }

    pub fn options(&self) -> ContainerOptions {
        self.inner.options
    }
}

// Requests
impl Container {
    /// The single component of type `T`
    ///
    /// Requests see the components of every scope. With uncertain dependencies tolerated,
    /// a component of a scope which is not entered fails and the next candidate is used.
    #[track_caller]
    pub fn value_of<T: Injectable>(&self) -> Executor<Arc<T>> {
        self.resolve_as(
            format!("value_of {}", type_name::<T>()),
            Dependency::on::<T>(),
        )
    }

    /// The component matching `dependency`
    ///
    /// An optional dependency without a default fails with [ResolveError::Absent] when nothing matches.
    #[track_caller]
    pub fn value_matching<T: Injectable>(&self, dependency: Dependency) -> Executor<Arc<T>> {
        self.resolve_as(format!("value_matching {dependency}"), dependency)
    }

    /// Every component of type `T`, in declaration order
    ///
    /// Requests see the components of every scope, not only the entered ones. If any of
    /// them lives in a scope which is not entered, the request fails with
    /// [ResolveError::ScopeNotEntered].
    #[track_caller]
    pub fn values_of<T: Injectable>(&self) -> Executor<Vec<Arc<T>>> {
        self.resolve_as(
            format!("values_of {}", type_name::<T>()),
            Dependency::all::<T>(),
        )
    }

    /// Whatever the [Resolver] `R` stands for - `Arc<T>`, `Option<Arc<T>>` or `Vec<Arc<T>>`
    #[track_caller]
    pub fn resolve<R: Resolver + Injectable + Clone>(&self) -> Executor<R> {
        self.resolve_as(format!("resolve {}", type_name::<R>()), R::dependency())
    }

    /// Calls `func` with its parameters injected
    ///
    /// ```rust
    /// use std::{convert::Infallible, sync::Arc};
    /// use wrapp_ioc::{Container, ContainerOptions, Module, Provider};
    ///
    /// let module = Module::new("app").provide(Provider::constant("world".to_string()));
    /// let container = Container::new(&module, ContainerOptions::default()).unwrap();
    ///
    /// let greeting = container
    ///     .func_of(|name: Arc<String>| Ok::<_, Infallible>(format!("hello {name}")))
    ///     .execute()
    ///     .unwrap();
    /// assert_eq!(*greeting, "hello world");
    /// ```
    #[track_caller]
    pub fn func_of<Params, Func: Inject<Params>>(&self, func: Func) -> Executor<Arc<Func::Output>> {
        self.request(
            format!("func_of -> {}", type_name::<Func::Output>()),
            Func::dependencies(),
            move |args: &Args| Ok(Instance::new(func.call(args)?)),
            Instance::downcast::<Func::Output>,
        )
    }

    /// Assembles `S` from its dependencies
    #[track_caller]
    pub fn struct_of<S: Assemble>(&self) -> Executor<Arc<S>> {
        self.request(
            format!("struct_of {}", type_name::<S>()),
            S::dependencies(),
            |args: &Args| Ok(Instance::new(S::assemble(args)?)),
            Instance::downcast::<S>,
        )
    }

    #[track_caller]
    fn resolve_as<R: Resolver + Injectable + Clone>(
        &self,
        label: String,
        dependency: Dependency,
    ) -> Executor<R> {
        self.request(
            label,
            vec![dependency],
            |args: &Args| Ok(Instance::new(R::extract(args.value(0)?)?)),
            |instance: &Instance| instance.downcast::<R>().map(|resolved| R::clone(&resolved)),
        )
    }

    /// Derives a graph holding a consumer for the request
    #[track_caller]
    fn request<T>(
        &self,
        label: String,
        dependencies: Vec<Dependency>,
        body: impl Fn(&Args) -> Result<Instance, DynError> + Send + Sync + 'static,
        extract: fn(&Instance) -> Result<T, ResolveError>,
    ) -> Executor<T> {
        let consumer = Arc::new(Provider::consumer(label, dependencies, body));

        let mut graph = self.inner.graph.derive();
        let node = GraphBuilder::new(&self.inner.repository, &mut graph).add_consumer(&consumer);

        Executor::new(
            Arc::new(graph),
            node,
            consumer.to_string(),
            self.storage.clone(),
            self.inner.options,
            extract,
        )
    }
}

// Eager loading
impl Container {
    /// Resolves every component matching `criteria` into the frames it belongs to
    ///
    /// Every match is attempted, the first failure is returned.
    pub fn load(&self, criteria: &Criteria) -> Result<(), ResolveError> {
        self.load_components(self.inner.repository.components_matching(criteria))
    }

    /// Resolves every component whose scope is currently entered
    pub fn load_all(&self) -> Result<(), ResolveError> {
        self.load_components(
            self.inner
                .repository
                .all_components()
                .iter()
                .filter(|component| {
                    component
                        .scope()
                        .is_some_and(|scope| self.storage.has_frame(scope))
                }),
        )
    }

    fn load_components<'a>(
        &self,
        components: impl Iterator<Item = &'a Arc<Component>>,
    ) -> Result<(), ResolveError> {
        let resolution = Resolution::new(self.inner.graph.clone(), self.storage.clone());

        let mut loaded = 0;
        let mut first_error = None;
        for component in components {
            let Some(node) = self.inner.graph.component_node(component.id()) else {
                continue;
            };

            match resolution.resolve(node, &ResolutionPath::default()).force() {
                Value::Error(error) => {
                    tracing::warn!("Failed to load '{}': {}", component, error);
                    first_error.get_or_insert(error);
                }
                _ => loaded += 1,
            }
        }

        tracing::debug!("Loaded {} components in '{}'", loaded, self.scope());
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
