use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn grainy(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grainy"))
        .env("GRAINY_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run grainy")
}

#[test]
fn inspect_prints_the_evaluated_frame() {
    let root = TempDir::new().unwrap();
    let output = grainy(
        root.path(),
        &[
            "inspect",
            "--size",
            "400x200",
            "--gradient",
            "linear-gradient(90deg, #000, #fff)",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["output"]["width"], 400);
    assert_eq!(json["gradient"]["count"], 2);
    assert_eq!(json["gradient"]["colors"][0]["r"], 0.0);
    assert_eq!(json["gradient"]["colors"][1]["r"], 1.0);
    let offsets = json["gradient"]["offsets"].as_array().unwrap();
    assert_eq!(offsets[0], 0.0);
    assert_eq!(offsets[1], 1.0);
    assert!(offsets[2..].iter().all(|offset| offset.is_null()));
}

#[test]
fn inspect_reads_the_default_config() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("grainy.toml"),
        "version = 1\ngradient = \"linear-gradient(red, green, blue)\"\nshimmer_speed = 1.0\n",
    )
    .unwrap();

    let output = grainy(root.path(), &["inspect", "--time", "60000"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["gradient"]["count"], 3);
    let shimmer = json["shimmer"].as_f64().unwrap();
    assert!((shimmer - 0.1).abs() < 1e-6);
}

#[test]
fn export_on_cpu_writes_a_png() {
    let root = TempDir::new().unwrap();
    let target = root.path().join("frame.png");
    let output = grainy(
        root.path(),
        &[
            "export",
            "--cpu",
            "--size",
            "48x24",
            "--output",
            target.to_str().unwrap(),
            "--gradient",
            "linear-gradient(to right, black, white)",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let bytes = fs::read(&target).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    // IHDR width and height, big-endian
    assert_eq!(&bytes[16..20], &48u32.to_be_bytes());
    assert_eq!(&bytes[20..24], &24u32.to_be_bytes());
}

#[test]
fn malformed_gradients_fail() {
    let root = TempDir::new().unwrap();
    let output = grainy(
        root.path(),
        &["inspect", "--gradient", "radial-gradient(red, blue)"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to evaluate gradient"));
}

#[test]
fn explicit_config_must_exist() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope.toml");
    let output = grainy(
        root.path(),
        &["inspect", "--config", missing.to_str().unwrap()],
    );
    assert!(!output.status.success());
}
