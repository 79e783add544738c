use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use serde_json::Value;

const BOLD_NONBOLD: &str = r#"{
    "text": [
        "Início da transcrição",
        "Como você conheceu a ginástica?",
        "Minha professora em Curitiba me levou ao clube.",
        "E a primeira competição?",
        "Foi em São Paulo, com a equipe do Flamengo."
    ],
    "bold": [
        "Início da transcrição Como você conheceu a ginástica?",
        "E a primeira competição?"
    ],
    "nonbold": [
        "Minha professora em Curitiba me levou ao clube.",
        "Foi em São Paulo, com a equipe do Flamengo."
    ]
}"#;

fn icgeo_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_icgeo"))
}

fn run(args: &[&str], dir: &Path) -> Output {
    Command::new(icgeo_bin())
        .args(args)
        .current_dir(dir)
        .env("ICGEO_LOG", "warn")
        .output()
        .expect("failed to run icgeo")
}

fn fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn normalize_json_output() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path(), "01.json", BOLD_NONBOLD);

    let out = run(&["normalize", "01.json", "--json"], tmp.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let value: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["dialect"], "bold-nonbold");
    assert_eq!(value["questions"][0], "Como você conheceu a ginástica?");
    assert_eq!(value["answers"].as_array().unwrap().len(), 2);
    assert_eq!(value["text"].as_array().unwrap().len(), 4);
}

#[test]
fn normalize_human_output() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path(), "01.json", BOLD_NONBOLD);

    let out = run(&["normalize", "01.json"], tmp.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("dialect: bold-nonbold"));
    assert!(stdout.contains("questions: 2"));
}

#[test]
fn meta_output() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path(), "01.json", BOLD_NONBOLD);

    let out = run(&["meta", "01.json"], tmp.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let value: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["questions"]["bow"]["ginástica"], 1);
    assert!(value["text"]["bow"].get("a").is_none());
    assert!(value["answers"]["bow_stemmed"].as_object().unwrap().len() > 3);
    let entities: Vec<_> = value["answers"]["ne"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["entity"].as_str().unwrap().to_string())
        .collect();
    assert!(entities.contains(&"São Paulo".to_string()));
}

#[test]
fn unknown_layout_fails() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path(), "02.json", r#"{"text": ["Sem marcadores"]}"#);

    let out = run(&["normalize", "02.json"], tmp.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Sem marcadores"));
}

#[test]
fn missing_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let out = run(&["meta", "nope.json"], tmp.path());
    assert!(!out.status.success());
}
