#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "Heure,Lundi,Mardi,Mercredi,Jeudi,Vendredi,Samedi";

const ROSTER: &str = "\
,,,16/09,23/09
Mathématiques,,,,
Dupont,Lu 12h15-13h15,Room3,3+7,1+2
";

fn write_sources(dir: &Path) {
    for idx in 0..3 {
        let csv = format!("{HEADER}\n08:00,Cours {idx}@B12,,,,,\n09:00,,,,,,\n");
        fs::write(dir.join(format!("{idx}.csv")), csv).unwrap();
    }
    fs::write(dir.join("collometre.csv"), ROSTER).unwrap();
}

fn colloscope() -> Command {
    Command::cargo_bin("colloscope").unwrap()
}

#[test]
fn groups_on_the_command_line() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let output = dir.path().join("out.ics");

    colloscope()
        .arg("a")
        .arg("7")
        .arg("--input-dir")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Génération du calendrier pour le groupe A"))
        .stdout(predicate::str::contains("16 cours, 1 colles"));

    let ics = fs::read_to_string(&output).unwrap();
    assert!(ics.contains("SUMMARY:COLLE Mathématiques\r\n"));
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 17);
}

#[test]
fn invalid_group_letter_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    colloscope()
        .arg("d")
        .arg("--input-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Groupe incorrect"));
}

#[test]
fn colle_group_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    colloscope()
        .args(["b", "19"])
        .arg("--input-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Groupe de colle incorrect"));
    assert!(!dir.path().join("schedule.ics").exists());
}

#[test]
fn groups_can_be_entered_interactively() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let output = dir.path().join("interactive.ics");

    colloscope()
        .arg("--input-dir")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .write_stdin("b\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Veuillez indiquer votre groupe"))
        .stdout(predicate::str::contains("16 cours, 0 colles"));
    assert!(output.exists());
}

#[test]
fn missing_tables_are_reported() {
    let dir = TempDir::new().unwrap();
    colloscope()
        .arg("c")
        .arg("--input-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Erreur"));
}

#[test]
fn all_groups_get_their_own_file() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let output = dir.path().join("planning.ics");

    colloscope()
        .args(["--all", "--no-colles"])
        .arg("--input-dir")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    for letter in ["a", "b", "c"] {
        let path = dir.path().join(format!("planning_{letter}.ics"));
        let ics = fs::read_to_string(&path).unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 16, "{}", path.display());
    }
}

#[test]
fn all_groups_rejects_conflicting_arguments() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path());
    let output = dir.path().join("planning.ics");

    colloscope()
        .args(["--all", "--no-schedule", "7"])
        .arg("--input-dir")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("--all et --no-schedule"));

    colloscope()
        .args(["--all", "b", "7"])
        .arg("--input-dir")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("n'indiquez pas de groupe"));

    assert!(!dir.path().join("planning_a.ics").exists());
}
