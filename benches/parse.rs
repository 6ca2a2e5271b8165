use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use datatable::data::parser::parse_csv_file;
use std::io::Write;

const ROWS: usize = 1_000_000;

// Synthesizes a dataset once per run so the benchmark has no external
// file dependency.
fn generate_dataset() -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    let mut out = std::io::BufWriter::new(tmp.as_file_mut());
    writeln!(out, "id,label,value,comment").unwrap();
    for n in 0..ROWS {
        writeln!(
            out,
            "{},item_{},{}.{:02},\"note, row {}\"",
            n,
            n % 1000,
            n % 500,
            n % 100,
            n
        )
        .unwrap();
    }
    drop(out);
    tmp
}

fn parse_csv(c: &mut Criterion) {
    let dataset = generate_dataset();
    let bytes = dataset.path().metadata().unwrap().len();

    let mut group = c.benchmark_group("Parser");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(bytes));

    group.bench_function("parse_csv_file", |b| {
        b.iter(|| parse_csv_file(dataset.path(), 0).unwrap())
    });

    group.bench_function("parse_csv_file + erase_rows", |b| {
        b.iter(|| {
            let mut table = parse_csv_file(dataset.path(), 0).unwrap();
            let rows: Vec<usize> = (0..table.rows()).step_by(10).collect();
            table.erase_rows(&rows);
        })
    });

    group.finish();
}

criterion_group!(benches, parse_csv);
criterion_main!(benches);
