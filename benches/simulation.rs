use std::hint::black_box;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use ndarray::Array2;
use portfolio_mc::config::SimulationConfig;
use portfolio_mc::quant::portfolio::ReturnsModel;
use portfolio_mc::quant::portfolio::WeightSampler;
use portfolio_mc::quant::portfolio::simulate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

const PERIODS: usize = 1260;

fn model(n_assets: usize) -> ReturnsModel {
  let mut rng = StdRng::seed_from_u64(42);
  let normal = Normal::new(0.0005, 0.01).unwrap();
  let returns = Array2::from_shape_fn((PERIODS, n_assets), |_| normal.sample(&mut rng));
  let tickers = (0..n_assets).map(|i| format!("T{i}")).collect();
  ReturnsModel::from_log_returns(tickers, returns).unwrap()
}

fn bench_simulate(c: &mut Criterion) {
  let mut group = c.benchmark_group("Simulate");
  group.sample_size(10);

  for n_assets in [2usize, 5, 10] {
    let model = model(n_assets);

    group.bench_with_input(BenchmarkId::new("sequential", n_assets), &model, |b, m| {
      let config = SimulationConfig {
        seed: Some(1),
        ..Default::default()
      };
      b.iter(|| black_box(simulate(m, &config).unwrap()));
    });

    group.bench_with_input(BenchmarkId::new("parallel", n_assets), &model, |b, m| {
      let config = SimulationConfig {
        seed: Some(1),
        parallel: true,
        ..Default::default()
      };
      b.iter(|| black_box(simulate(m, &config).unwrap()));
    });
  }

  group.finish();
}

fn bench_sampler(c: &mut Criterion) {
  let mut group = c.benchmark_group("WeightSampler");

  group.bench_function("sample_10", |b| {
    let mut sampler = WeightSampler::seeded(7);
    b.iter(|| black_box(sampler.sample(10).unwrap()));
  });

  group.finish();
}

criterion_group!(benches, bench_simulate, bench_sampler);
criterion_main!(benches);
