use std::fs;
use std::path::Path;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use oxipack::codec::CacheConfig;
use oxipack::encoding::Encoding;
use oxipack::engine::{self, EncodeOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};

const WORDS: [&str; 12] = [
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima",
];

/// A list of records with recurring keys and values, like an API response.
fn gen_records(count: usize, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..count)
        .map(|id| {
            let tags: Vec<Value> = (0..rng.random_range(0..4))
                .map(|_| json!(WORDS[rng.random_range(0..WORDS.len())]))
                .collect();
            json!({
                "id": id,
                "name": format!("{}-{}", WORDS[rng.random_range(0..WORDS.len())], id % 97),
                "score": f64::from(rng.random_range(-10_000..10_000)) / 100.0,
                "active": rng.random::<bool>(),
                "owner": null,
                "tags": tags,
            })
        })
        .collect();
    Value::Array(records)
}

/// Random nested values with no repetition to speak of.
fn gen_noise(rng: &mut StdRng, depth: u32) -> Value {
    match rng.random_range(0..if depth == 0 { 4 } else { 6 }) {
        0 => Value::from(rng.random::<i64>()),
        1 => Value::from(f64::from(rng.random::<i32>()) / 1000.0),
        2 => Value::String(
            (0..rng.random_range(0..40))
                .map(|_| char::from(rng.random_range(b'a'..=b'z')))
                .collect(),
        ),
        3 => Value::Bool(rng.random()),
        4 => Value::Array((0..rng.random_range(0..8)).map(|_| gen_noise(rng, depth - 1)).collect()),
        _ => Value::Object(
            (0..rng.random_range(0..8))
                .map(|i| (format!("k{i}"), gen_noise(rng, depth - 1)))
                .collect::<Map<_, _>>(),
        ),
    }
}

fn record_schema() -> Encoding {
    let string = Arc::new(Encoding::FloorVarintPrefixUtf8StringShared { minimum: 0 });
    Encoding::FloorTypedArray {
        minimum: 0,
        encoding: Arc::new(Encoding::VarintTypedArbitraryObject {
            key_encoding: string,
            encoding: Arc::new(Encoding::any()),
        }),
        prefix_encodings: vec![],
    }
}

fn write_size_snapshot() {
    let documents = [
        ("records_1k", gen_records(1000, 7)),
        ("noise", gen_noise(&mut StdRng::seed_from_u64(11), 5)),
    ];
    let mut csv = String::from("document,json_bytes,any_bytes,any_unshared_bytes\n");
    for (name, document) in &documents {
        let text = serde_json::to_vec(document).unwrap_or_default();
        let shared = engine::encode(document, &Encoding::any()).unwrap_or_default();
        let plain = engine::encode_with_options(
            document,
            &Encoding::any(),
            &EncodeOptions::without_shared_strings(),
        )
        .unwrap_or_default();
        csv.push_str(&format!(
            "{name},{},{},{}\n",
            text.len(),
            shared.len(),
            plain.len()
        ));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("size_snapshot.csv"), csv);
}

fn bench_encoding_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_any");
    for count in [10usize, 100, 1000] {
        let document = gen_records(count, 42);
        let bytes = serde_json::to_vec(&document).unwrap().len();
        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &document, |b, document| {
            b.iter(|| engine::encode(black_box(document), &Encoding::any()).unwrap())
        });
    }
    group.finish();
}

fn bench_decoding_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_any");
    for count in [10usize, 100, 1000] {
        let packed = engine::encode(&gen_records(count, 42), &Encoding::any()).unwrap();
        group.throughput(Throughput::Bytes(packed.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &packed, |b, packed| {
            b.iter(|| engine::decode(black_box(packed), &Encoding::any()).unwrap())
        });
    }
    group.finish();
}

fn bench_schema_vs_any(c: &mut Criterion) {
    let document = gen_records(500, 3);
    let schema = record_schema();
    let mut group = c.benchmark_group("schema_vs_any");
    group.bench_function("any", |b| {
        b.iter(|| engine::encode(black_box(&document), &Encoding::any()).unwrap())
    });
    group.bench_function("typed", |b| {
        b.iter(|| engine::encode(black_box(&document), &schema).unwrap())
    });
    group.finish();
}

fn bench_cache_settings(c: &mut Criterion) {
    let document = gen_records(1000, 9);
    let mut group = c.benchmark_group("cache_settings");
    let settings = [
        ("default", CacheConfig::default()),
        ("disabled", CacheConfig::disabled()),
        (
            "small",
            CacheConfig {
                min_string_length: 3,
                max_byte_size: 4 * 1024,
            },
        ),
    ];
    for (name, cache) in settings {
        let opts = EncodeOptions {
            cache,
            ..Default::default()
        };
        group.bench_function(name, |b| {
            b.iter(|| engine::encode_with_options(black_box(&document), &Encoding::any(), &opts).unwrap())
        });
    }
    group.finish();
}

fn bench_noise_roundtrip(c: &mut Criterion) {
    write_size_snapshot();
    let document = gen_noise(&mut StdRng::seed_from_u64(1), 5);
    c.bench_function("noise_roundtrip", |b| {
        b.iter(|| {
            let packed = engine::encode(black_box(&document), &Encoding::any()).unwrap();
            engine::decode(&packed, &Encoding::any()).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_encoding_speed,
    bench_decoding_speed,
    bench_schema_vs_any,
    bench_cache_settings,
    bench_noise_roundtrip
);
criterion_main!(benches);
