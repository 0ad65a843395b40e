//! Wrapp IoC resolves a graph of providers on demand and caches what they provide
//! per entered scope.
//!
//! Wrapp IoC is split into three parts:
//! 1. [Module] and [Provider]: declare what can be provided and what it depends on
//! 2. [Container]: validates the declarations, builds the dependence graph and tracks the entered scopes
//! 3. [Executor]: a single request against the container, resolved when executed
//!
//! Every provider lives in a [Scope]. Its components are computed at most once per entered
//! instance of that scope, no matter how many threads ask for them concurrently.
//!
//! # Examples
//!
//! ```rust
//! use std::{
//!     convert::Infallible,
//!     sync::{
//!         atomic::{AtomicUsize, Ordering},
//!         Arc,
//!     },
//! };
//! use wrapp_ioc::{Container, Module, Provider, Scope};
//!
//! struct Session {
//!     id: usize,
//! }
//!
//! let request = Scope::new("request", &Scope::global());
//! let next_id = Arc::new(AtomicUsize::new(1));
//!
//! let module = Module::new("app")
//!     .provide(Provider::constant("wrapp".to_string()).named("app_name"))
//!     .provide(
//!         Provider::func(move || {
//!             Ok::<_, Infallible>(Session {
//!                 id: next_id.fetch_add(1, Ordering::SeqCst),
//!             })
//!         })
//!         .in_scope(&request),
//!     );
//!
//! let container = Container::builder(module).build().unwrap();
//!
//! let first = container.enter_scope(&request).unwrap();
//! assert_eq!(first.value_of::<Session>().execute().unwrap().id, 1);
//! assert_eq!(first.value_of::<Session>().execute().unwrap().id, 1);
//!
//! let second = first.leave_scope().enter_scope(&request).unwrap();
//! assert_eq!(second.value_of::<Session>().execute().unwrap().id, 2);
//! ```

pub mod builder;
pub mod container;
pub mod dependency;
pub mod errors;
pub mod executor;
pub mod graph;
pub mod module;
pub mod provider;
pub mod repository;
pub mod resolver;
pub mod scope;
pub mod storage;
pub mod types;
pub mod value;

pub use builder::{ContainerBuilder, ContainerOptions};
pub use container::Container;
pub use dependency::{Criteria, Dependency};
pub use errors::{BuildError, ComponentError, GraphError, GraphErrors, ResolveError, ScopeError};
pub use executor::Executor;
pub use module::Module;
pub use provider::{Assemble, Inject, Output, Provider};
pub use resolver::Resolver;
pub use scope::Scope;
pub use types::{DynError, Injectable, Instance, TypeInfo};
pub use value::{Args, Value};
