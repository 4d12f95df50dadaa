//! Build decks through the public API and read them back.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vocab_deck::archive::{dump_collection, read_collection};
use vocab_deck::config::DeckConfig;
use vocab_deck::enrich::MediaServices;
use vocab_deck::ids::generate_id;
use vocab_deck::notes::BuildCounts;
use vocab_deck::pipeline::{BuildError, BuildOptions, build_deck};
use vocab_deck::templates::TemplateError;

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn config() -> DeckConfig {
    let mut config = DeckConfig::default();
    config.fields.extend_well_known = false;
    config
}

fn build(input: PathBuf, out: &Path) -> Result<vocab_deck::pipeline::BuildReport, BuildError> {
    let options = BuildOptions {
        output_dir: out.to_path_buf(),
        no_media: true,
        ..BuildOptions::new(input)
    };
    build_deck(&options, &config(), MediaServices::none())
}

#[test]
fn front_back_scenario() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), "animals.csv", "Front;Back\nchat;cat\nchien;dog\n");

    let report = build(input, tmp.path()).unwrap();
    assert_eq!(report.model_name, "Basic Vanilla");
    assert_eq!(report.counts, BuildCounts { created: 2, seen: 2 });

    let collection = read_collection(&report.archive).unwrap();
    assert_eq!(collection.models.len(), 1);
    let model = &collection.models[&report.model_id];
    assert_eq!(model.name, "Basic Vanilla");
    assert_eq!(model.templates.len(), 1);
    assert_eq!(model.schema.names(), ["Front", "Back"]);

    let fields: Vec<&Vec<String>> = collection.notes.iter().map(|n| &n.fields).collect();
    assert_eq!(fields, [&vec!["chat", "cat"], &vec!["chien", "dog"]]);
    assert!(collection.notes.iter().all(|n| n.tags.is_empty()));
}

#[test]
fn many_rows_round_trip_in_order() {
    let tmp = TempDir::new().unwrap();
    let mut content = String::from("Front,Back,Remark\n");
    for i in 0..25 {
        content.push_str(&format!("word{i},meaning{i},\n"));
    }
    let input = write_input(tmp.path(), "many.csv", &content);

    let report = build(input, tmp.path()).unwrap();
    let collection = read_collection(&report.archive).unwrap();

    assert_eq!(collection.notes.len(), 25);
    for (i, note) in collection.notes.iter().enumerate() {
        assert_eq!(note.fields, vec![format!("word{i}"), format!("meaning{i}"), String::new()]);
        assert!(note.tags.is_empty());
    }
}

#[test]
fn listen_without_sound_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), "broken.csv", "Front;Back;Listen\nchat;cat;y\n");

    let err = build(input, tmp.path()).unwrap_err();

    assert!(matches!(
        err,
        BuildError::Template(TemplateError::ListenWithoutSound)
    ));
    assert!(!tmp.path().join("broken.apkg").exists());
}

#[test]
fn identifiers_are_stable_across_builds() {
    let tmp = TempDir::new().unwrap();
    let first_dir = tmp.path().join("first");
    let second_dir = tmp.path().join("second");
    let input = write_input(tmp.path(), "stable.csv", "Front;Back\nchat;cat\n");

    let first = build(input.clone(), &first_dir).unwrap();
    let second = build(input, &second_dir).unwrap();

    assert_eq!(first.deck_id, second.deck_id);
    assert_eq!(first.model_id, second.model_id);
    assert_eq!(first.deck_id, generate_id("stable"));
}

#[test]
fn dump_writes_one_csv_per_model() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), "animals.csv", "Front;Back\nchat;cat\nchien;dog\n");
    let report = build(input, tmp.path()).unwrap();
    let collection = read_collection(&report.archive).unwrap();

    let files = dump_collection(&collection, &tmp.path().join("dump")).unwrap();

    assert_eq!(files.len(), 1);
    let content = fs::read_to_string(&files[0]).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, ["Front,Back,tags", "chat,cat,", "chien,dog,"]);
}
