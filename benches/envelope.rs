//! Benchmarks for the per-record forwarding pipeline.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use logship::{ContainerInfo, Envelope, LogRecord, options};

fn sample_record() -> LogRecord {
    LogRecord::new(
        "172.17.0.1 - - [22/Aug/2026:10:14:02 +0000] \"GET /healthz HTTP/1.1\" 200 512",
        ContainerInfo {
            name: "web1".to_string(),
            id: "abc123def456".to_string(),
            image: "nginx:1.27".to_string(),
            hostname: "h1".to_string(),
            args: vec!["nginx".to_string(), "-g".to_string(), "daemon off;".to_string()],
            env: vec![
                "PATH=/usr/local/sbin:/usr/local/bin".to_string(),
                r#"LOGSPOUT_OPTIONS={"team":"edge","tier":"frontend"}"#.to_string(),
            ],
        },
    )
}

fn forwarding_benchmarks(c: &mut Criterion) {
    let record = sample_record();
    let defaults = options::parse_options(r#"{"env":"prod","team":"infra"}"#);

    let mut group = c.benchmark_group("forwarding");
    group.bench_function("resolve_options", |b| {
        b.iter(|| options::resolve(black_box(&defaults), black_box(&record.container.env)))
    });
    group.bench_function("enrich_and_serialise", |b| {
        b.iter(|| {
            let merged = options::resolve(&defaults, &record.container.env);
            let envelope = Envelope::enrich(black_box(&record), "i-0123456789abcdef0", merged);
            serde_json::to_vec(&envelope).expect("serialise envelope")
        })
    });
    group.finish();
}

criterion_group!(benches, forwarding_benchmarks);
criterion_main!(benches);
