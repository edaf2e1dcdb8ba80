//! Benchmarks for compiled mapping routines.
//!
//! Run with: cargo bench --bench conversion

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rowbind::memory::{MemoryCommand, MemoryCursor};
use rowbind::{DbType, DbValue, Mapper, MapperConfig, OutboundField};

rowbind::record! {
    #[derive(Debug, Clone)]
    pub struct Order {
        pub id: i64 => "Id",
        pub customer: String => "Customer",
        pub amount: f64 => "Amount",
        pub note: Option<String> => "Note",
        pub placed: NaiveDate => "Placed",
    }
}

fn cursor(rows: usize) -> MemoryCursor {
    let mut cursor = MemoryCursor::new([
        ("Id", DbType::I64),
        ("Customer", DbType::String),
        // narrower than the property, so every row runs a coercion
        ("Amount", DbType::F32),
        ("Note", DbType::String),
        ("Placed", DbType::Date),
    ]);
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    for i in 0..rows {
        let note = if i % 3 == 0 {
            DbValue::Null
        } else {
            DbValue::String(format!("note {i}"))
        };
        cursor.push_row(vec![
            DbValue::I64(i as i64),
            DbValue::String(format!("customer {i}")),
            DbValue::F32(i as f32 * 1.5),
            note,
            DbValue::Date(day),
        ]);
    }
    cursor
}

fn orders(count: usize) -> Vec<Order> {
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..count)
        .map(|i| Order {
            id: i as i64,
            customer: format!("customer {i}"),
            amount: i as f64,
            note: None,
            placed: day,
        })
        .collect()
}

fn benchmark_map_rows(c: &mut Criterion) {
    let mapper = Mapper::new(MapperConfig::default());
    let mut group = c.benchmark_group("map_rows");

    for rows in [10_usize, 1_000, 10_000] {
        let mut source = cursor(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                source.rewind();
                let mapped: Vec<Order> = mapper.map_rows(&mut source).unwrap_or_default();
                black_box(mapped)
            });
        });
    }

    group.finish();
}

fn benchmark_routine_lookup(c: &mut Criterion) {
    let mapper = Mapper::new(MapperConfig::default());
    let source = cursor(1);

    c.bench_function("routine_lookup", |b| {
        b.iter(|| black_box(mapper.row_mapper::<Order>(&source).is_ok()));
    });
}

fn benchmark_write_parameters(c: &mut Criterion) {
    let mapper = Mapper::new(MapperConfig::default());
    let fields: Vec<OutboundField> = ["Id", "Customer", "Amount", "Note", "Placed"]
        .into_iter()
        .map(OutboundField::from)
        .collect();
    let mut group = c.benchmark_group("write_parameters");

    for batch in [1_usize, 16, 128] {
        let instances = orders(batch);
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &instances, |b, instances| {
            let mut sink = MemoryCommand::new();
            b.iter(|| {
                let written = mapper.write_parameters(&mut sink, &fields, instances);
                black_box(written.is_ok())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_map_rows,
    benchmark_routine_lookup,
    benchmark_write_parameters
);
criterion_main!(benches);
