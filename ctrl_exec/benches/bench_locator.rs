//! # Waypoint Locator Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::{
    loc::Pose,
    planning::{RefPath, Waypoint},
};
use ctrl_lib::waypoints::{find_lookahead, find_nearest};

fn locator_benchmark(c: &mut Criterion) {
    // ---- Build a long winding path ----

    let path = RefPath::new(
        (0..10_000)
            .map(|i| {
                let s = i as f64 * 0.1;
                let x = s;
                let y = 5.0 * (s / 20.0).sin();
                let heading = (0.25 * (s / 20.0).cos()).atan();
                Waypoint::new(x, y, heading, 5.0)
            })
            .collect()
    );

    // Vehicle part way along, slightly off the path
    let ego = Pose::from_xy_heading(612.3, 5.0 * (612.3f64 / 20.0).sin() + 0.4, 0.1);

    c.bench_function("find_nearest", |b| {
        b.iter(|| find_nearest(black_box(&path), black_box(&ego)))
    });

    c.bench_function("find_lookahead", |b| {
        b.iter(|| find_lookahead(black_box(&path), black_box(&ego), black_box(8.0)))
    });
}

criterion_group!(benches, locator_benchmark);
criterion_main!(benches);
