use adsweep::{derivative, BufferPlanner, DerivativeOptions, Mode, Seeds, TapeRegistry};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

mod common;
use common::{broyden, mixed, point, rosenbrock};

/// Jacobian through each strategy: gradient (m = 1), forward (n < 2m), reverse.
fn bench_jacobian_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("jacobian_routing");
    let planner = BufferPlanner::new();
    let options = DerivativeOptions::default();

    for n in [10, 100] {
        let x = point(n);

        group.bench_with_input(BenchmarkId::new("gradient", n), &x, |b, x| {
            let mut engine = TapeRegistry::<f64>::new();
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        |v| vec![rosenbrock(v)],
                        1,
                        n,
                        black_box(x),
                        Mode::Jac,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("forward", n), &x, |b, x| {
            let mut engine = TapeRegistry::<f64>::new();
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        broyden,
                        n,
                        n,
                        black_box(x),
                        Mode::Jac,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("reverse", n), &x, |b, x| {
            let mut engine = TapeRegistry::<f64>::new();
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        mixed,
                        3,
                        n,
                        black_box(x),
                        Mode::Jac,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });
    }
    group.finish();
}

/// Record once, then replay the stored tape at a new point.
fn bench_tape_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("tape_reuse");
    let planner = BufferPlanner::new();

    for n in [10, 100] {
        let x = point(n);
        let x2: Vec<f64> = x.iter().map(|v| v + 0.1).collect();

        group.bench_with_input(BenchmarkId::new("record_each_time", n), &x2, |b, x2| {
            let mut engine = TapeRegistry::<f64>::new();
            let options = DerivativeOptions::default();
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        mixed,
                        3,
                        n,
                        black_box(x2),
                        Mode::Jac,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("reuse", n), &x2, |b, x2| {
            let mut engine = TapeRegistry::<f64>::new();
            derivative(
                &mut engine,
                &planner,
                mixed,
                3,
                n,
                &x,
                Mode::Jac,
                &DerivativeOptions::default(),
            )
            .unwrap();
            let options = DerivativeOptions {
                reuse_tape: true,
                ..Default::default()
            };
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        mixed,
                        3,
                        n,
                        black_box(x2),
                        Mode::Jac,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });
    }
    group.finish();
}

/// Products against a batch of directions or weights.
fn bench_products(c: &mut Criterion) {
    let mut group = c.benchmark_group("products");
    let planner = BufferPlanner::new();
    let n = 50;
    let x = point(n);

    for p in [1, 8] {
        let seeds: Vec<Vec<f64>> = (0..p)
            .map(|k| (0..n).map(|i| ((i + k) % 3) as f64).collect())
            .collect();
        let weights: Vec<Vec<f64>> = (0..p).map(|k| vec![1.0, k as f64, 0.5]).collect();

        group.bench_with_input(BenchmarkId::new("jac_mat", p), &seeds, |b, seeds| {
            let mut engine = TapeRegistry::<f64>::new();
            let options = DerivativeOptions {
                direction: Some(Seeds::Many(seeds)),
                ..Default::default()
            };
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        mixed,
                        3,
                        n,
                        &x,
                        Mode::JacMat,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("mat_jac", p), &weights, |b, weights| {
            let mut engine = TapeRegistry::<f64>::new();
            let options = DerivativeOptions {
                weights: Some(Seeds::Many(weights)),
                ..Default::default()
            };
            b.iter(|| {
                black_box(
                    derivative(
                        &mut engine,
                        &planner,
                        mixed,
                        3,
                        n,
                        &x,
                        Mode::MatJac,
                        &options,
                    )
                    .unwrap(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_jacobian_routing,
    bench_tape_reuse,
    bench_products
);
criterion_main!(benches);
