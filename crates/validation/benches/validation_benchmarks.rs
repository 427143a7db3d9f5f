use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use taxpipe_core::{InvoiceHeader, LineItem};
use taxpipe_validation::validate;

fn bench_header(line_count: usize) -> (InvoiceHeader, Vec<LineItem>) {
    let lines: Vec<LineItem> = (1..=line_count as u32)
        .map(|line_number| LineItem {
            line_number,
            taxable_value: 100.0,
            cgst_rate: 9.0,
            sgst_rate: 9.0,
            cgst_amount: 9.0,
            sgst_amount: 9.0,
            line_total: 118.0,
            ..LineItem::default()
        })
        .collect();

    let header = InvoiceHeader {
        invoice_number: Some("INV-2024-001".to_string()),
        supply_type: Some("intra-state".to_string()),
        taxable_total: 100.0 * line_count as f64,
        total_tax: 18.0 * line_count as f64,
        cgst_total: 9.0 * line_count as f64,
        sgst_total: 9.0 * line_count as f64,
        ..InvoiceHeader::default()
    };

    (header, lines)
}

fn validation_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for line_count in [1usize, 10, 100] {
        let (header, lines) = bench_header(line_count);
        group.throughput(Throughput::Elements(line_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(line_count),
            &line_count,
            |b, _| {
                b.iter(|| validate(black_box(&header), black_box(&lines)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, validation_throughput);
criterion_main!(benches);
