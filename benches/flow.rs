//! Benchmarks for tick ingestion and minute-matrix freezing.

use criterion::Criterion;
use std::hint::black_box;
use tickflow_rs::{
    BookUpdate, FillPolicy, Level, MinuteMatrix, Side, TradeFlow, TradeTick, WriteMode,
};

/// Minute boundary base so second-of-minute arithmetic stays readable.
const BASE: i64 = 1_700_000_040;

fn dense_matrix(levels: i64) -> MinuteMatrix {
    let mut matrix = MinuteMatrix::new(5.0);
    for slot in 0..60u8 {
        matrix.record_price(slot, 100.0 + slot as f64);
        for index in 0..levels {
            matrix.observe(
                slot,
                Level::from_index(20 + index),
                1.0 + index as f64,
                WriteMode::Accumulate,
            );
        }
    }
    matrix
}

pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow");

    group.bench_function("trade_flow_minute_of_ticks", |b| {
        b.iter(|| {
            let mut flow = TradeFlow::new("alpha", "BTC-PERP", 5.0);
            for second in 0..60 {
                let tick = TradeTick {
                    timestamp: BASE + second,
                    side: if second % 2 == 0 { Side::Buy } else { Side::Sell },
                    price: 100.0 + (second % 7) as f64,
                    amount: 1.0,
                };
                flow.update(black_box(&tick)).expect("valid trade");
            }
            flow
        })
    });

    group.bench_function("book_flow_full_recompute_update", |b| {
        let mut flow = tickflow_rs::BookFlow::new("alpha", "BTC-PERP", 5.0);
        let update = BookUpdate {
            timestamp: BASE + 5,
            bids: (0..50).map(|i| (100.0 - i as f64 * 0.1, 2.0)).collect(),
            asks: (0..50).map(|i| (100.1 + i as f64 * 0.1, 2.0)).collect(),
        };
        flow.update(&update).expect("valid book update");

        b.iter(|| flow.update(black_box(&update)))
    });

    group.bench_function("freeze_filled_60x100", |b| {
        let matrix = dense_matrix(100);
        b.iter(|| black_box(&matrix).freeze(FillPolicy::All))
    });

    group.bench_function("freeze_price_only_60x100", |b| {
        let matrix = dense_matrix(100);
        b.iter(|| black_box(&matrix).freeze(FillPolicy::PriceOnly))
    });

    group.finish();
}
