use std::{
    collections::BTreeSet,
    convert::Infallible,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use wrapp_ioc::{
    Args, Assemble, BuildError, Container, ContainerOptions, Criteria, Dependency, DynError,
    GraphError, Module, Provider, ResolveError,
};

struct A;
struct B;

fn cyclic() -> Module {
    Module::new("cyclic")
        .provide(Provider::func(|_: Arc<B>| Ok::<_, Infallible>(A)))
        .provide(Provider::func(|_: Arc<A>| Ok::<_, Infallible>(B)))
}

#[test]
fn cycles_fail_the_build() {
    let Err(BuildError::Graph(errors)) = Container::new(&cyclic(), ContainerOptions::default())
    else {
        panic!("expected the cycle to be reported");
    };

    let cycles: Vec<_> = errors.cycles().collect();
    assert_eq!(cycles.len(), 1);
    let GraphError::CircularDependency { chain } = cycles[0] else {
        panic!("expected a circular dependency");
    };
    assert_eq!(chain.len(), 2);
}

#[test]
fn ignored_cycles_fail_every_participant() {
    let a_first = Container::builder(cyclic()).ignore_cycle().build().unwrap();
    let b_first = Container::builder(cyclic()).ignore_cycle().build().unwrap();

    assert!(matches!(
        a_first.value_of::<A>().execute(),
        Err(ResolveError::Cycle { .. })
    ));
    assert!(matches!(
        a_first.value_of::<B>().execute(),
        Err(ResolveError::Cycle { .. })
    ));
    assert!(matches!(
        b_first.value_of::<B>().execute(),
        Err(ResolveError::Cycle { .. })
    ));
    assert!(matches!(
        b_first.value_of::<A>().execute(),
        Err(ResolveError::Cycle { .. })
    ));
}

#[test]
fn cycles_do_not_affect_unrelated_components() {
    let module = cyclic().provide(Provider::constant(3_u8));
    let container = Container::builder(module).ignore_cycle().build().unwrap();

    assert!(container.value_of::<A>().execute().is_err());
    assert_eq!(*container.value_of::<u8>().execute().unwrap(), 3);
}

struct Service;

struct Zeroes {
    number: Arc<i32>,
    text: Arc<String>,
    service: Option<Arc<Service>>,
}
impl Assemble for Zeroes {
    fn dependencies() -> Vec<Dependency> {
        vec![
            Dependency::defaulted::<i32>(),
            Dependency::defaulted::<String>(),
            Dependency::on::<Service>().optional(),
        ]
    }

    fn assemble(args: &Args) -> Result<Self, DynError> {
        Ok(Zeroes {
            number: args.get(0)?,
            text: args.get(1)?,
            service: args.try_get(2)?,
        })
    }
}

#[test]
fn optional_dependencies_resolve_to_zero_values() {
    let container = Container::new(&Module::new("empty"), ContainerOptions::default()).unwrap();

    let zeroes = container.struct_of::<Zeroes>().execute().unwrap();

    assert_eq!(*zeroes.number, 0);
    assert_eq!(*zeroes.text, "");
    assert!(zeroes.service.is_none());
    assert!(container
        .func_of(|service: Option<Arc<Service>>| Ok::<_, Infallible>(service.is_none()))
        .execute()
        .map(|none| *none)
        .unwrap());
}

#[test]
fn ambiguous_dependencies_resolve_to_one_candidate() {
    let module = Module::new("ambiguous")
        .provide(Provider::constant(1_i32))
        .provide(Provider::constant(2_i32));

    let strict = Container::new(&module, ContainerOptions::default()).unwrap();
    assert!(matches!(
        strict.value_of::<i32>().execute(),
        Err(ResolveError::Invalid(ref errors)) if errors.uncertain().count() == 1
    ));

    let tolerant = Container::builder(module).ignore_uncertain().build().unwrap();
    let value = *tolerant.value_of::<i32>().execute().unwrap();
    assert!(value == 1 || value == 2);
}

#[test]
fn collectors_gather_every_candidate() {
    let module = Module::new("numbers")
        .provide(Provider::constant(1_u8))
        .provide(Provider::constant(2_u8).named("two"))
        .provide(Provider::constant(3_u8).tagged("odd"))
        .provide(Provider::constant(4_u8).ignored());
    let container = Container::new(&module, ContainerOptions::default()).unwrap();

    let values: BTreeSet<u8> = container
        .values_of::<u8>()
        .execute()
        .unwrap()
        .iter()
        .map(|value| **value)
        .collect();

    assert_eq!(values, BTreeSet::from([1, 2, 3]));
    let odd = container
        .value_matching::<u8>(Dependency::on::<u8>().tagged("odd"))
        .execute()
        .unwrap();
    assert_eq!(*odd, 3);
}

#[test]
fn collectors_follow_declaration_order() {
    let inner = Module::new("inner")
        .provide(Provider::constant(4_u8))
        .provide(Provider::constant(5_u8));
    let outer = Module::new("outer")
        .provide(Provider::constant(1_u8))
        .include(inner)
        .provide(Provider::constant(2_u8))
        .include(Module::new("last").provide(Provider::constant(6_u8)))
        .provide(Provider::constant(3_u8));
    let container = Container::new(&outer, ContainerOptions::default()).unwrap();

    let values: Vec<u8> = container
        .values_of::<u8>()
        .execute()
        .unwrap()
        .iter()
        .map(|value| **value)
        .collect();

    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn load_attempts_every_match() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let module = Module::new("load")
        .provide(Provider::func(|| Err::<u8, _>("broken")).named("broken"))
        .provide(
            Provider::func(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(2_u8)
            })
            .named("working"),
        );
    let container = Container::new(&module, ContainerOptions::default()).unwrap();

    let error = container.load(&Criteria::of::<u8>()).unwrap_err();

    assert!(matches!(error.root_cause(), ResolveError::Provider { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let working = container
        .value_matching::<u8>(Dependency::on::<u8>().named("working"))
        .execute()
        .unwrap();
    assert_eq!(*working, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failures_are_retried_and_successes_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let module = Module::new("flaky").provide(Provider::func(move || {
        match counter.fetch_add(1, Ordering::SeqCst) + 1 {
            1 => Err("first attempt fails"),
            attempt => Ok(attempt),
        }
    }));
    let container = Container::new(&module, ContainerOptions::default()).unwrap();
    let executor = container.value_of::<usize>();

    let error = executor.execute().unwrap_err();
    let ResolveError::Provider { error, .. } = error.root_cause() else {
        panic!("expected the provider failure, got {error:?}");
    };
    assert_eq!(error.to_string(), "first attempt fails");

    assert_eq!(*executor.execute().unwrap(), 2);
    assert_eq!(*container.value_of::<usize>().execute().unwrap(), 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_dependencies_are_attributed_to_their_provider() {
    let module = Module::new("missing")
        .provide(Provider::func(|byte: Arc<u8>| Ok::<_, Infallible>(*byte as u32)).labelled("widen"));
    let container = Container::builder(module).ignore_missing().build().unwrap();

    let error = container.value_of::<u32>().execute().unwrap_err();

    let ResolveError::Dependency { provider, source } = &error else {
        panic!("expected an attributed error, got {error:?}");
    };
    assert!(provider.starts_with("widen at "));
    assert!(matches!(**source, ResolveError::Missing { .. }));
}

#[test]
fn duplicate_names_are_rejected() {
    let module = Module::new("duplicate")
        .provide(Provider::constant(1_u8).named("port"))
        .provide(Provider::constant(2_u8).named("port"));

    assert!(matches!(
        Container::new(&module, ContainerOptions::default()),
        Err(BuildError::Invalid(_))
    ));
}
