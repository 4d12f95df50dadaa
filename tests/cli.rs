//! Run the compiled binary against temporary inputs.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn vocab_deck(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vocab-deck"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn gen_config_prints_stock_file() {
    let output = vocab_deck(&["gen-config"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("[media.images]"));
    assert!(toml::from_str::<toml::Value>(&text).is_ok());
}

#[test]
fn build_then_inspect() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("animals.csv");
    fs::write(&input, "Front;Back\nchat;cat\nchien;dog\n").unwrap();
    let out = tmp.path().join("out");

    let built = vocab_deck(&[
        "build",
        input.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--no-media",
        "-q",
    ]);
    assert!(built.status.success(), "{}", String::from_utf8_lossy(&built.stderr));
    assert!(stdout(&built).contains("Model: Basic Vanilla"));
    let archive = out.join("animals.apkg");
    assert!(archive.is_file());

    let inspected = vocab_deck(&["inspect", archive.to_str().unwrap()]);
    assert!(inspected.status.success());
    let text = stdout(&inspected);
    assert!(text.contains("001 Basic Vanilla (2 notes)"));
    assert!(text.contains("001 chat | cat"));
}

#[test]
fn invalid_layout_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("broken.csv");
    fs::write(&input, "Front;Back;Reverse;Q&A\nchat;cat;y;\n").unwrap();

    let output = vocab_deck(&[
        "build",
        input.to_str().unwrap(),
        "--output",
        tmp.path().to_str().unwrap(),
        "--no-media",
    ]);

    assert!(!output.status.success());
    assert!(!tmp.path().join("broken.apkg").exists());
}

#[test]
fn unknown_config_key_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("words.csv");
    fs::write(&input, "Front;Back\nchat;cat\n").unwrap();
    fs::write(tmp.path().join("config.toml"), "[media]\nlang = \"fr\"\n").unwrap();

    let output = vocab_deck(&["build", input.to_str().unwrap(), "--no-media"]);

    assert!(!output.status.success());
}
