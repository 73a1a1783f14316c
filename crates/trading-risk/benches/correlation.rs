use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trading_core::types::{Bar, MarketSnapshot};
use trading_risk::{pearson, CorrelationTable};

fn market(symbols: &[String], bars: usize) -> MarketSnapshot {
    let mut market = MarketSnapshot::with_capacity(64);
    for (k, symbol) in symbols.iter().enumerate() {
        for i in 0..bars {
            let close = 1.0 + ((i as f64) * 0.3 + k as f64).sin() * 0.01;
            market.update(symbol, Bar::new(i as i64, close, close, close, close, 0.0));
        }
    }
    market
}

fn bench_correlation(c: &mut Criterion) {
    let x: Vec<f64> = (0..15).map(|i| (i as f64 * 0.3).sin()).collect();
    let y: Vec<f64> = (0..15).map(|i| (i as f64 * 0.3 + 0.5).sin()).collect();
    c.bench_function("pearson_15", |b| b.iter(|| pearson(black_box(&x), black_box(&y))));

    let symbols: Vec<String> = (0..28).map(|i| format!("SYM{i:02}")).collect();
    let market = market(&symbols, 64);
    c.bench_function("correlation_table_28x15", |b| {
        b.iter(|| CorrelationTable::compute(black_box(&market), "SYM00", &symbols[1..], 15))
    });
}

criterion_group!(benches, bench_correlation);
criterion_main!(benches);
