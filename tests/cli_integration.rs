use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_oxipack").to_string()
}

const SCHEMA: &str = r#"{
    "binpackEncoding": "VARINT_TYPED_ARBITRARY_OBJECT",
    "binpackOptions": {
        "keyEncoding": {"binpackEncoding": "PREFIX_VARINT_LENGTH_STRING_SHARED"},
        "encoding": {
            "binpackEncoding": "BOUNDED_MULTIPLE_8BITS_ENUM_FIXED",
            "binpackOptions": {"minimum": 0, "maximum": 255, "multiplier": 1}
        }
    }
}"#;

#[test]
fn cli_encode_decode_roundtrip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    let packed = dir.path().join("doc.bin");
    let output = dir.path().join("out.json");

    let text = r#"{"name":"oxipack","tags":["json","binary","json"],"size":[1,2.5,-300]}"#;
    std::fs::write(&input, text).unwrap();

    let st = Command::new(bin())
        .arg("encode")
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());
    assert!(std::fs::metadata(&packed).unwrap().len() < text.len() as u64);

    let st = Command::new(bin())
        .arg("decode")
        .arg(&packed)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());

    let restored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
    let original: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn cli_schema_roundtrip_over_stdio() {
    let dir = tempdir().unwrap();
    let schema = dir.path().join("schema.json");
    std::fs::write(&schema, SCHEMA).unwrap();

    let mut child = Command::new(bin())
        .args(["encode", "--encoding"])
        .arg(&schema)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"a": 1, "b": 200}"#)
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, [0x02, 0x02, b'a', 0x01, 0x02, b'b', 200]);

    let mut child = Command::new(bin())
        .args(["decode", "-e"])
        .arg(&schema)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(&out.stdout).unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"{\"a\":1,\"b\":200}\n");
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    let packed = dir.path().join("doc.bin");
    std::fs::write(&input, "[1,2,3]").unwrap();
    std::fs::write(&packed, "keep me").unwrap();

    let out = Command::new(bin())
        .arg("encode")
        .arg(&input)
        .arg(&packed)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("use -f to overwrite"));
    assert_eq!(std::fs::read(&packed).unwrap(), b"keep me");

    let st = Command::new(bin())
        .args(["--force", "encode"])
        .arg(&input)
        .arg(&packed)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(&packed).unwrap(), [0x24, 0x11, 0x19, 0x21]);
}

#[test]
fn cli_reports_invalid_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.json");
    std::fs::write(&input, "{not json").unwrap();

    let out = Command::new(bin())
        .args(["encode", "-c"])
        .arg(&input)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid JSON"));
}

#[test]
fn cli_rejects_unknown_encoding() {
    let dir = tempdir().unwrap();
    let schema = dir.path().join("schema.json");
    std::fs::write(&schema, r#"{"binpackEncoding": "NOT_A_THING"}"#).unwrap();

    let out = Command::new(bin())
        .args(["inspect", "--encoding"])
        .arg(&schema)
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unrecognized encoding: NOT_A_THING"));
}

#[test]
fn cli_inspect_prints_tree() {
    let dir = tempdir().unwrap();
    let schema = dir.path().join("schema.json");
    std::fs::write(&schema, SCHEMA).unwrap();

    let out = Command::new(bin())
        .args(["inspect", "--encoding"])
        .arg(&schema)
        .output()
        .unwrap();
    assert!(out.status.success());
    let tree = String::from_utf8(out.stdout).unwrap();
    assert!(tree.starts_with("VARINT_TYPED_ARBITRARY_OBJECT\n"));
    assert!(tree.contains("  encoding: BOUNDED_MULTIPLE_8BITS_ENUM_FIXED maximum=255 minimum=0 multiplier=1\n"));
    assert!(tree.contains("  keyEncoding: PREFIX_VARINT_LENGTH_STRING_SHARED\n"));
}

#[test]
fn cli_json_stats() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("doc.json");
    std::fs::write(&input, r#"["repeat", "repeat"]"#).unwrap();

    let out = Command::new(bin())
        .args(["--json", "encode", "-c"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(stats["command"], "encode");
    assert_eq!(stats["input_size"], 20);
    assert_eq!(stats["output_size"], out.stdout.len());
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("DEFAULT_MAX_DEPTH=128"));
}
