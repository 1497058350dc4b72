//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
targets = "targets.json"
store_path = ".trialkit/settings.json"
output_dir = "out"
correct_delay_ms = 0
correction_delay_ms = 0
"#;

const TARGETS: &str = r#"[
  {"id": "cup", "deck": "nouns", "label": "cup", "exemplars": ["assets/cup.png"]},
  {"id": "ball", "deck": "nouns", "label": "ball", "exemplars": ["assets/ball.png"]},
  {"id": "hat", "deck": "nouns", "label": "hat", "exemplars": ["assets/hat.png"]}
]"#;

fn trialkit() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("trialkit").unwrap();
    cmd.env_remove("TRIALKIT_TARGETS").env_remove("TRIALKIT_STORE");
    cmd
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("trialkit.toml"), CONFIG).unwrap();
    std::fs::write(dir.path().join("targets.json"), TARGETS).unwrap();
    dir
}

fn exported(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let out = dir.join("out");
    if !out.exists() {
        return Vec::new();
    }
    std::fs::read_dir(out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == extension))
        .collect()
}

#[test]
fn help_output() {
    trialkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Discrete-trial drills"));
}

#[test]
fn version_output() {
    trialkit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("trialkit"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    trialkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created trialkit.toml"))
        .stdout(predicate::str::contains("Created targets.json"));

    assert!(dir.path().join("trialkit.toml").exists());
    assert!(dir.path().join("targets.json").exists());

    trialkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_starter_catalog() {
    let dir = TempDir::new().unwrap();
    trialkit().current_dir(dir.path()).arg("init").assert().success();

    trialkit()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("6 concepts"))
        .stdout(predicate::str::contains("prepositions: 1"))
        .stdout(predicate::str::contains("Catalog valid."));
}

#[test]
fn validate_nonexistent_file() {
    trialkit()
        .arg("validate")
        .arg("--targets")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_rejects_non_array() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("targets.json");
    std::fs::write(&path, r#"{"id": "cup"}"#).unwrap();

    trialkit()
        .arg("validate")
        .arg("--targets")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be an array"));
}

#[test]
fn validate_reports_missing_exemplars() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("targets.json");
    std::fs::write(
        &path,
        r#"[{"id": "cup", "deck": "nouns", "label": "cup", "exemplars": []}]"#,
    )
    .unwrap();

    trialkit()
        .arg("validate")
        .arg("--targets")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cup"));
}

#[test]
fn drill_scores_exports_and_saves_missed() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args([
            "drill",
            "--client",
            "Sam",
            "--decks",
            "nouns",
            "--set-size",
            "3",
            "--save-missed",
            "--html",
            "--seed",
            "1",
        ])
        .write_stdin("c\nx\nc\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 trials"))
        .stdout(predicate::str::contains("Overall: 67% (2/3)"))
        .stdout(predicate::str::contains("Missed (1)"))
        .stdout(predicate::str::contains("Saved 1 missed concepts"))
        .stdout(predicate::str::contains("Exported"));

    let csvs = exported(dir.path(), "csv");
    assert_eq!(csvs.len(), 1);
    let name = csvs[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("Sam_VBMAPP_Tacts_"));

    let content = std::fs::read_to_string(&csvs[0]).unwrap();
    let lines: Vec<&str> = content.split('\n').collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "session_id,client,created_at,deck,concept_id,concept_label,sd_text,exemplar_index,exemplar_total,src,result,timestamp"
    );
    assert!(lines[2].contains(",incorrect,"));
    assert_eq!(exported(dir.path(), "html").len(), 1);

    trialkit()
        .current_dir(dir.path())
        .arg("missed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved missed set (1)"));

    trialkit()
        .current_dir(dir.path())
        .arg("stats")
        .arg(&csvs[0])
        .assert()
        .success()
        .stdout(predicate::str::contains("client Sam"))
        .stdout(predicate::str::contains("Overall: 67% (2/3)"));

    trialkit()
        .current_dir(dir.path())
        .args(["stats", "--format", "json"])
        .arg(&csvs[0])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 3"));
}

#[test]
fn drill_missed_set_round_trip() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--set-size", "3", "--save-missed", "--no-export"])
        .write_stdin("x\nc\nc\n")
        .assert()
        .success();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--missed", "--no-export"])
        .write_stdin("c\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 trials from the saved missed set"))
        .stdout(predicate::str::contains("Overall: 100% (1/1)"));

    trialkit()
        .current_dir(dir.path())
        .args(["missed", "--clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared saved missed set."));

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--missed"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved missed set found"));
}

#[test]
fn missed_without_saved_set() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .arg("missed")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved missed set."));
}

#[test]
fn drill_remembers_last_settings() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--client", "Ari", "--set-size", "2", "--no-export"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 trials"));

    let settings =
        std::fs::read_to_string(dir.path().join(".trialkit").join("settings.json")).unwrap();
    assert!(settings.contains("vbmapp_tacts_last_settings_v1"));

    trialkit()
        .current_dir(dir.path())
        .arg("drill")
        .write_stdin("c\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 trials"));

    let csvs = exported(dir.path(), "csv");
    assert_eq!(csvs.len(), 1);
    assert!(csvs[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Ari_"));
}

fn saved_settings(dir: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(dir.join(".trialkit").join("settings.json")).unwrap();
    let store: serde_json::Value = serde_json::from_str(&raw).unwrap();
    serde_json::from_str(store["vbmapp_tacts_last_settings_v1"].as_str().unwrap()).unwrap()
}

#[test]
fn drill_remembers_toggles() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("targets.json"),
        r#"[{"id": "cup", "deck": "nouns", "label": "cup", "exemplars": ["a.png", "b.png", "c.png"]}]"#,
    )
    .unwrap();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--set-size", "1", "--generalization", "--no-shuffle", "--no-export"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 trials"));

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--no-export"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 trials"));

    let settings = saved_settings(dir.path());
    assert_eq!(settings["toggleGen"], true);
    assert_eq!(settings["toggleShuffleExemplars"], false);

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--no-generalization", "--no-export"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 trials"));

    let settings = saved_settings(dir.path());
    assert_eq!(settings["toggleGen"], false);
    assert_eq!(settings["toggleShuffleExemplars"], false);
}

#[test]
fn drill_without_responses_exports_nothing() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--set-size", "2"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall: 0% (0/0)"))
        .stdout(predicate::str::contains("No scored trials found yet"));

    assert!(exported(dir.path(), "csv").is_empty());
}

#[test]
fn drill_unknown_deck_fails() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--decks", "animals"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown deck"));
}

#[test]
fn drill_deck_without_items_fails() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args(["drill", "--decks", "actions"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no eligible items"));
}

#[test]
fn match_single_option_rounds() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args([
            "match",
            "--builtin",
            "--seed",
            "3",
            "--rounds",
            "2",
            "--array-size",
            "1",
        ])
        .write_stdin("1\n1\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Find the"))
        .stdout(predicate::str::contains("✅ Correct"))
        .stdout(predicate::str::contains(
            "Trials: 2 | Correct: 2 | Incorrect: 0 | Accuracy: 100%",
        ));
}

#[test]
fn match_expressive_from_catalog() {
    let dir = workspace();

    trialkit()
        .current_dir(dir.path())
        .args(["match", "--mode", "expressive", "--array-size", "3"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("What is it?"))
        .stdout(predicate::str::contains("Trials: 0"));
}

#[test]
fn stats_rejects_foreign_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other.csv");
    std::fs::write(&path, "a,b,c\n1,2,3").unwrap();

    trialkit()
        .arg("stats")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("header"));
}
