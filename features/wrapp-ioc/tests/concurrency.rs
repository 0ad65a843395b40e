use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

use wrapp_ioc::{Container, ContainerOptions, Module, Provider, Scope};

struct Expensive {
    invocation: usize,
}

fn expensive_in(scope: &Scope) -> (Arc<AtomicUsize>, Module) {
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();
    let module = Module::new("expensive").provide(
        Provider::func(move || {
            let invocation = counter.fetch_add(1, Ordering::SeqCst) + 1;
            thread::sleep(Duration::from_millis(20));
            Ok::<_, Infallible>(Expensive { invocation })
        })
        .in_scope(scope),
    );
    (invocations, module)
}

#[test]
fn concurrent_requests_invoke_the_provider_once() {
    let (invocations, module) = expensive_in(&Scope::global());
    let container = Container::new(&module, ContainerOptions::default()).unwrap();
    let barrier = Barrier::new(20);

    let results: Vec<Arc<Expensive>> = thread::scope(|s| {
        let handles: Vec<_> = (0..20)
            .map(|_| {
                s.spawn(|| {
                    let executor = container.value_of::<Expensive>();
                    barrier.wait();
                    executor.execute().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|result| Arc::ptr_eq(result, &results[0])));
    assert_eq!(results[0].invocation, 1);
}

#[test]
fn concurrent_frames_compute_independently() {
    let request = Scope::new("request", &Scope::global());
    let (invocations, module) = expensive_in(&request);
    let container = Container::new(&module, ContainerOptions::default()).unwrap();
    let frames: Vec<Container> = (0..4)
        .map(|_| container.enter_scope(&request).unwrap())
        .collect();
    let barrier = Barrier::new(frames.len() * 5);

    thread::scope(|s| {
        for frame in &frames {
            for _ in 0..5 {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    frame.value_of::<Expensive>().execute().unwrap();
                });
            }
        }
    });

    assert_eq!(invocations.load(Ordering::SeqCst), frames.len());
}
