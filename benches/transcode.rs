//! Benchmark: transcode a synthetic file of fixed-length records, raw and hex-escaped.
//! Records follow the layout below with CRLF terminators; output goes to a reused buffer.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fixedrec::{transcode, EscapeMode, LayoutSet, TranscodeOptions};
use std::io::Cursor;

const LAYOUT: &str = r#"
struct Order {
    BYTE Id[10];
    BYTE Date[8];
    BYTE Code[4];
    BYTE Qty[6];
    BYTE Amount[12];
    BYTE Memo[24];
} dat;
"#;

const RECORDS: usize = 20_000;

fn synthetic_input(record_len: usize) -> Vec<u8> {
    let mut input = Vec::with_capacity(RECORDS * (record_len + 2));
    for i in 0..RECORDS {
        input.extend((0..record_len).map(|j| b'0' + ((i + j) % 75) as u8));
        input.extend_from_slice(b"\r\n");
    }
    input
}

fn bench_transcode(c: &mut Criterion) {
    let layouts = LayoutSet::parse(LAYOUT).expect("parse layout");
    let layout = layouts.get("Order").expect("layout");
    let input = synthetic_input(layout.record_len());
    eprintln!(
        "transcode: {} records, {} bytes per record, {} input bytes",
        RECORDS,
        layout.record_len() + 2,
        input.len()
    );

    let raw = TranscodeOptions::default();
    let hex = TranscodeOptions {
        escape: EscapeMode::Hex,
        ..TranscodeOptions::default()
    };
    let hex_prefixed = TranscodeOptions {
        escape: EscapeMode::Hex,
        prefix: "%".to_string(),
        ..TranscodeOptions::default()
    };

    let mut group = c.benchmark_group("transcode");
    group.throughput(Throughput::Bytes(input.len() as u64));
    let mut out = Vec::with_capacity(input.len() * 4);
    for (name, options) in [("raw", &raw), ("hex", &hex), ("hex_prefix", &hex_prefixed)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                out.clear();
                let stats = transcode(Cursor::new(black_box(&input)), &mut out, layout, options)
                    .expect("transcode");
                black_box(stats.records)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transcode);
criterion_main!(benches);
