use oxipack::encoding::{Encoding, loader};
use oxipack::engine;
use serde_json::Value;

#[derive(Debug)]
struct Vector {
    name: String,
    encoding: Encoding,
    document: Value,
    bytes: Vec<u8>,
}

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s = s.trim();
    if s.is_empty() {
        return Vec::new();
    }
    assert!(
        s.len().is_multiple_of(2),
        "hex string must have even length"
    );
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn load_vectors() -> Vec<Vector> {
    let manifest = include_str!("vectors/manifest.tsv");
    manifest
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| {
            let parts: Vec<_> = line.split('|').collect();
            assert_eq!(parts.len(), 4, "invalid vector row: {line}");
            Vector {
                name: parts[0].to_string(),
                encoding: loader::from_str(parts[1])
                    .unwrap_or_else(|e| panic!("descriptor of {}: {e}", parts[0])),
                document: serde_json::from_str(parts[2])
                    .unwrap_or_else(|e| panic!("document of {}: {e}", parts[0])),
                bytes: hex_to_bytes(parts[3]),
            }
        })
        .collect()
}

#[test]
fn vector_database_is_non_empty() {
    let vectors = load_vectors();
    assert!(vectors.len() >= 30);
}

#[test]
fn encode_matches_all_vectors() {
    for v in load_vectors() {
        let bytes = engine::encode(&v.document, &v.encoding)
            .unwrap_or_else(|e| panic!("encode failed for {}: {e}", v.name));
        assert_eq!(bytes, v.bytes, "vector {}", v.name);
    }
}

#[test]
fn decode_matches_all_vectors() {
    for v in load_vectors() {
        let document = engine::decode(&v.bytes, &v.encoding)
            .unwrap_or_else(|e| panic!("decode failed for {}: {e}", v.name));
        assert_eq!(document, v.document, "vector {}", v.name);
    }
}

#[test]
fn truncated_vectors_never_decode_to_the_original() {
    for v in load_vectors() {
        for len in 0..v.bytes.len() {
            let result = engine::decode(&v.bytes[..len], &v.encoding);
            assert_ne!(
                result.ok().as_ref(),
                Some(&v.document),
                "vector {} truncated to {len} bytes",
                v.name
            );
        }
    }
}

#[test]
fn descriptors_survive_json_roundtrip() {
    for v in load_vectors() {
        let json = loader::to_json(&v.encoding);
        assert_eq!(loader::load(&json).unwrap(), v.encoding, "vector {}", v.name);
    }
}
