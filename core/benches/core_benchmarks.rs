use baoleme_core::domain::pricing::quote;
use baoleme_core::domain::{CouponKind, CouponPolicy, CouponTerms, PricedLine, QuoteRequest};
use baoleme_core::{ContextData, FlowError, Pipeline, StepControl, StepDef};
use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

fn counting_pipeline(num_steps: usize) -> Pipeline<BenchContext, FlowError> {
  let steps = (0..num_steps).map(|i| StepDef::required(format!("step_{}", i))).collect();
  let mut pipeline = Pipeline::<BenchContext, FlowError>::from_steps("bench", steps);
  for i in 0..num_steps {
    pipeline.on(&format!("step_{}", i), |ctx: ContextData<BenchContext>| async move {
      ctx.write().counter += 1;
      Ok::<_, FlowError>(StepControl::Continue)
    });
  }
  pipeline
}

fn bench_pipeline_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineRun");
  let rt = Runtime::new().expect("tokio runtime");

  for num_steps in [1usize, 5, 20] {
    let pipeline = counting_pipeline(num_steps);
    group.bench_with_input(BenchmarkId::from_parameter(num_steps), &num_steps, |b, _| {
      b.to_async(&rt).iter(|| async {
        let ctx = ContextData::new(BenchContext::default());
        pipeline.run(ctx).await.expect("pipeline runs");
      });
    });
  }
  group.finish();
}

fn bench_quote(c: &mut Criterion) {
  let now = Utc::now();
  let coupon = CouponPolicy {
    terms: CouponTerms {
      kind: CouponKind::FullReduction,
      discount: None,
      full_amount: Some(Decimal::from(20)),
      reduce_amount: Some(Decimal::from(5)),
    },
    owner_id: None,
    store_id: None,
    expires_at: now + Duration::days(1),
    used: false,
  };

  let mut group = c.benchmark_group("Quote");
  for num_lines in [1i64, 10, 50] {
    let lines: Vec<PricedLine> = (0..num_lines)
      .map(|id| PricedLine {
        product_id: id,
        name: format!("dish-{}", id),
        unit_price: Decimal::new(1250 + id, 2),
        quantity: 2,
        stock: 100,
      })
      .collect();
    group.bench_with_input(BenchmarkId::from_parameter(num_lines), &lines, |b, lines| {
      b.iter(|| {
        quote(QuoteRequest {
          user_id: 1,
          store_id: 1,
          lines,
          coupon: Some(&coupon),
          delivery_price: Decimal::from(4),
          now,
        })
        .expect("quote")
      });
    });
  }
  group.finish();
}

criterion_group!(benches, bench_pipeline_run, bench_quote);
criterion_main!(benches);
