use brrtmux::dispatcher::{HandlerRequest, HandlerResponse};
use brrtmux::router::Lookup;
use brrtmux::{MetricsPlugin, Multiplexer};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use std::hint::black_box;

fn noop(_res: &mut HandlerResponse, _req: &HandlerRequest) {}

fn zoo() -> Multiplexer {
    let mut mux = Multiplexer::with_base_path("/api");
    mux.get("/", noop).unwrap();
    mux.get("/zoo/animals", noop).unwrap();
    mux.post("/zoo/animals", noop).unwrap();
    mux.get("/zoo/animals/{id:int}", noop).unwrap();
    mux.put("/zoo/animals/{id:int}", noop).unwrap();
    mux.patch("/zoo/animals/{id:int}", noop).unwrap();
    mux.delete("/zoo/animals/{id:int}", noop).unwrap();
    mux.get("/zoo/animals/{id:int}/toys/{toy_id}", noop).unwrap();
    mux.get("/zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}", noop)
        .unwrap();
    mux.post("/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id:uuid}", noop)
        .unwrap();
    mux.get("/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}", noop)
        .unwrap();
    mux.head("/zoo/health", noop).unwrap();
    mux.options("/zoo/health", noop).unwrap();
    mux
}

const PATHS: [(Method, &str); 5] = [
    (Method::GET, "/api/zoo/animals/123"),
    (Method::GET, "/api/zoo/animals/123/toys/456"),
    (Method::GET, "/api/zoo/cats/animals/123/habitats/88/sections/5"),
    (
        Method::POST,
        "/api/inventory/1/feeds/2/items/3/batches/7f1c2a3e-8b4d-4f6a-9c0e-1d2b3c4d5e6f",
    ),
    (Method::GET, "/api/complex/1/2/3/4/5/6/7/8/9"),
];

fn bench_route_lookup(c: &mut Criterion) {
    let mux = zoo();
    let router = mux.router();
    c.bench_function("route_lookup", |b| {
        b.iter(|| {
            for (method, path) in &PATHS {
                let path = path.trim_start_matches("/api");
                let found = matches!(router.lookup(method, black_box(path)), Lookup::Found(_));
                black_box(found);
            }
        });
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for plugins in [0usize, 1, 4] {
        let mut mux = zoo();
        for _ in 0..plugins {
            mux.use_plugin(MetricsPlugin::new()).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("plugins", plugins), &mux, |b, mux| {
            b.iter(|| {
                for (method, path) in &PATHS {
                    let mut req = HandlerRequest::new(method.clone(), path);
                    let mut res = HandlerResponse::default();
                    black_box(mux.dispatch(&mut res, &mut req));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_route_lookup, bench_dispatch);
criterion_main!(benches);
