use std::{convert::Infallible, sync::Arc};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wrapp_ioc::{Container, ContainerOptions, Dependency, Instance, Module, Output, Provider, Scope};

struct Link {
    depth: usize,
}

/// A chain of `depth` providers, each needing the previous one
fn chain(depth: usize, scope: &Scope) -> Module {
    (1..depth).fold(
        Module::new("chain").provide(Provider::constant(Link { depth: 0 }).named("link 0")),
        |module, depth| {
            let previous = format!("link {}", depth - 1);
            module.provide(
                Provider::dynamic(
                    vec![Dependency::on::<Link>().named(previous)],
                    vec![Output::of::<Link>().named(format!("link {depth}"))],
                    move |args| {
                        let previous: Arc<Link> = args.get(0)?;
                        Ok(vec![Instance::new(Link {
                            depth: previous.depth + 1,
                        })])
                    },
                )
                .in_scope(scope),
            )
        },
    )
}

fn bench_cached_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_resolution");

    for depth in [1, 10, 100] {
        let module = chain(depth, &Scope::global());
        let container = Container::new(&module, ContainerOptions::default()).unwrap();
        let last = Dependency::on::<Link>().named(format!("link {}", depth - 1));
        container.value_matching::<Link>(last.clone()).execute().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &last, |b, last| {
            b.iter(|| {
                let link = container
                    .value_matching::<Link>(last.clone())
                    .execute()
                    .unwrap();
                black_box(link.depth)
            })
        });
    }

    group.finish();
}

fn bench_fresh_scope_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("fresh_scope_resolution");
    let request = Scope::new("request", &Scope::global());

    for depth in [1, 10, 100] {
        let module = chain(depth, &request);
        let container = Container::new(&module, ContainerOptions::default()).unwrap();
        let last = Dependency::on::<Link>().named(format!("link {}", depth - 1));

        group.bench_with_input(BenchmarkId::from_parameter(depth), &last, |b, last| {
            b.iter(|| {
                let in_request = container.enter_scope(&request).unwrap();
                let link = in_request
                    .value_matching::<Link>(last.clone())
                    .execute()
                    .unwrap();
                black_box(link.depth)
            })
        });
    }

    group.finish();
}

fn bench_func_of(c: &mut Criterion) {
    let module = Module::new("values")
        .provide(Provider::constant(8080_u16))
        .provide(Provider::constant("localhost".to_string()));
    let container = Container::new(&module, ContainerOptions::default()).unwrap();

    c.bench_function("func_of", |b| {
        b.iter(|| {
            let address = container
                .func_of(|port: Arc<u16>, host: Arc<String>| {
                    Ok::<_, Infallible>(format!("{host}:{port}"))
                })
                .execute()
                .unwrap();
            black_box(address)
        })
    });
}

criterion_group!(
    benches,
    bench_cached_resolution,
    bench_fresh_scope_resolution,
    bench_func_of
);
criterion_main!(benches);
