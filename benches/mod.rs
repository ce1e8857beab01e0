use criterion::{criterion_group, criterion_main};

mod flow;

use flow::register_benchmarks as register_flow_benchmarks;
use merge::register_benchmarks as register_merge_benchmarks;

// Define the benchmark groups
criterion_group!(benches, register_flow_benchmarks, register_merge_benchmarks);

criterion_main!(benches);
