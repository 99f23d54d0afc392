use std::sync::Arc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use priority_completion::{PoolConfig, Priority, PriorityCompletionService, ThreadPool};

fn submit_and_drain(service: &PriorityCompletionService<usize, Arc<ThreadPool>>, jobs: usize) -> usize {
    for idx in 0..jobs {
        service.submit_at(move || {
            let mut val = idx;
            for i in 0..1_000 {
                val ^= idx ^ i;
            }
            Ok(val)
        }, Priority::ALL[idx % Priority::COUNT]).unwrap();
    }
    let mut total = 0;
    for idx in 0..jobs {
        let handle = service.take_at(Priority::ALL[idx % Priority::COUNT]).unwrap();
        total ^= handle.get().unwrap();
    }
    total
}

fn criterion_benchmark(c: &mut Criterion) {
    let pool = Arc::new(ThreadPool::new(PoolConfig::default().with_name("bench")).unwrap());
    let service = PriorityCompletionService::new(pool);
    c.bench_function("drain 1000 jobs", |b| b.iter(|| black_box(submit_and_drain(&service, 1000))));
    c.bench_function("drain 100 jobs", |b| b.iter(|| black_box(submit_and_drain(&service, 100))));
    c.bench_function("drain 10 jobs", |b| b.iter(|| black_box(submit_and_drain(&service, 10))));
    c.bench_function("drain 1 jobs", |b| b.iter(|| black_box(submit_and_drain(&service, 1))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
