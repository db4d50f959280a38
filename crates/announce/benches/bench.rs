use announce::{
    AnnounceConfig, Announcer, CancellationToken, ContentKey, ContentRouter, RouterError,
};
use core::{hint::black_box, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::time::Instant;
use tokio::runtime::Builder;

const TOTAL_KEYS: usize = 4096;

/// Accepts every announce immediately.
struct NoopRouter;

impl ContentRouter<ContentKey> for NoopRouter {
    async fn announce(
        &self,
        key: &ContentKey,
        _cancel: CancellationToken,
    ) -> Result<(), RouterError> {
        black_box(key);
        Ok(())
    }
}

/// Simulates a slow overlay.
struct SleepRouter(Duration);

impl ContentRouter<ContentKey> for SleepRouter {
    async fn announce(
        &self,
        _key: &ContentKey,
        _cancel: CancellationToken,
    ) -> Result<(), RouterError> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

fn keys() -> Vec<ContentKey> {
    (0..TOTAL_KEYS as u64)
        .map(|i| ContentKey::from(i.to_be_bytes().to_vec()))
        .collect()
}

async fn drain(announcer: &Announcer<ContentKey>, expected: u64) {
    while announcer.stat().completed < expected {
        tokio::task::yield_now().await;
    }
}

/// Measures end-to-end time for every key to be announced.
fn bench_end_to_end<R>(
    c: &mut Criterion,
    group_name: &str,
    config: AnnounceConfig,
    router_factory: impl Fn() -> R + Copy,
) where
    R: ContentRouter<ContentKey>,
{
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_KEYS as u64));

    group.bench_function(format!("elems/{TOTAL_KEYS}"), |b| {
        let rt = Builder::new_multi_thread()
            .enable_all()
            .worker_threads(4)
            .build()
            .unwrap();
        let keys = keys();

        b.to_async(&rt).iter_custom(|iters| {
            let keys = keys.clone();
            let config = config.clone();
            async move {
                let mut elapsed = Duration::ZERO;
                for _ in 0..iters {
                    let announcer =
                        Announcer::new(&CancellationToken::new(), router_factory(), config.clone())
                            .unwrap();
                    let start = Instant::now();
                    for key in &keys {
                        announcer.provide(key.clone()).await.unwrap();
                    }
                    drain(&announcer, TOTAL_KEYS as u64).await;
                    elapsed += start.elapsed();
                    announcer.close().await;
                }
                elapsed
            }
        });
    });

    group.finish();
}

/// Measures how fast producers can hand keys to the intake buffer alone.
fn bench_try_provide(c: &mut Criterion) {
    let mut group = c.benchmark_group("try_provide");
    group.throughput(Throughput::Elements(1));

    let rt = Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .build()
        .unwrap();
    let announcer = rt.block_on(async {
        Announcer::new(
            &CancellationToken::new(),
            NoopRouter,
            AnnounceConfig::standard().with_intake_capacity(1 << 16),
        )
        .unwrap()
    });
    let key = ContentKey::from(&b"bench"[..]);

    group.bench_function("single", |b| {
        b.iter(|| black_box(announcer.try_provide(key.clone())))
    });

    group.finish();
    rt.block_on(announcer.close());
}

fn benchmark_noop_standard(c: &mut Criterion) {
    bench_end_to_end(c, "noop/standard", AnnounceConfig::standard(), || {
        NoopRouter
    });
}

fn benchmark_noop_low_resource(c: &mut Criterion) {
    bench_end_to_end(c, "noop/low_resource", AnnounceConfig::low_resource(), || {
        NoopRouter
    });
}

fn benchmark_sleep_standard(c: &mut Criterion) {
    bench_end_to_end(c, "sleep_1ms/standard", AnnounceConfig::standard(), || {
        SleepRouter(Duration::from_millis(1))
    });
}

criterion_group!(
    benches,
    benchmark_noop_standard,
    benchmark_noop_low_resource,
    benchmark_sleep_standard,
    bench_try_provide,
);
criterion_main!(benches);
