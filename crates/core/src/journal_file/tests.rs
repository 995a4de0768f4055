use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::*;
use crate::types::{Direction, EquipSlot, LevelUpChoice};

fn journal_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

#[test]
fn header_and_records_round_trip() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "roundtrip.jsonl");

    let mut writer = JournalWriter::create(&path, 42, "test-build").unwrap();
    assert_eq!(writer.append(0, &PlayerAction::Move(Direction::North)).unwrap(), 0);
    writer.append(1, &PlayerAction::LevelUp(LevelUpChoice::Attack)).unwrap();
    writer.append(1, &PlayerAction::UnequipSlot(EquipSlot::MainHand)).unwrap();

    let loaded = load_journal_from_file(&path).unwrap();
    assert_eq!(loaded.journal.format_version, JOURNAL_FORMAT_VERSION);
    assert_eq!(loaded.journal.build_id, "test-build");
    assert_eq!(loaded.journal.seed, 42);
    let actions: Vec<_> = loaded.journal.inputs.iter().map(|record| &record.action).collect();
    assert_eq!(actions, [
        &PlayerAction::Move(Direction::North),
        &PlayerAction::LevelUp(LevelUpChoice::Attack),
        &PlayerAction::UnequipSlot(EquipSlot::MainHand),
    ]);
    let seqs: Vec<_> = loaded.journal.inputs.iter().map(|record| record.seq).collect();
    assert_eq!(seqs, [0, 1, 2]);
    assert_eq!(loaded.next_seq, 3);
    assert_ne!(loaded.last_sha256_hex, INITIAL_HASH);
}

#[test]
fn hash_chain_detects_a_tampered_record() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "tampered.jsonl");

    let mut writer = JournalWriter::create(&path, 1, "dev").unwrap();
    writer.append(0, &PlayerAction::Wait).unwrap();
    writer.append(1, &PlayerAction::PickUp).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    assert_eq!(lines.len(), 3, "expected header + 2 records");
    lines[2] = lines[2].replace("\"PickUp\"", "\"UseStairs\"");
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::HashChainBroken { line: 3 })),
        "expected hash chain broken at line 3, got: {result:?}"
    );
}

#[test]
fn hash_chain_detects_a_deleted_record() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "deleted.jsonl");

    let mut writer = JournalWriter::create(&path, 1, "dev").unwrap();
    for turn in 0..3 {
        writer.append(turn, &PlayerAction::Wait).unwrap();
    }

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    fs::write(&path, format!("{}\n{}\n{}\n", lines[0], lines[1], lines[3])).unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::InvalidRecord { line: 3, .. })),
        "expected a sequence gap at line 3, got: {result:?}"
    );
}

#[test]
fn a_truncated_last_line_is_incomplete() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "truncated.jsonl");

    let mut writer = JournalWriter::create(&path, 1, "dev").unwrap();
    writer.append(0, &PlayerAction::Wait).unwrap();
    drop(writer);

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    write!(file, "{{\"seq\":1,\"tu").unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::IncompleteLine { line: 3 })),
        "expected incomplete line at line 3, got: {result:?}"
    );
}

#[test]
fn a_header_without_newline_is_incomplete() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "no_newline.jsonl");
    fs::write(&path, "{\"format_version\":1,\"build_id\":\"dev\",\"seed\":123}").unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::IncompleteLine { line: 1 })),
        "expected incomplete line at line 1, got: {result:?}"
    );
}

#[test]
fn empty_and_malformed_headers_are_rejected() {
    let dir = tempdir().unwrap();
    let empty = journal_path(dir.path(), "empty.jsonl");
    fs::write(&empty, "").unwrap();
    assert!(matches!(load_journal_from_file(&empty), Err(JournalLoadError::EmptyFile)));

    let garbage = journal_path(dir.path(), "garbage.jsonl");
    fs::write(&garbage, "not valid json\n").unwrap();
    assert!(matches!(
        load_journal_from_file(&garbage),
        Err(JournalLoadError::InvalidHeader { line: 1, .. })
    ));

    let future = journal_path(dir.path(), "future.jsonl");
    fs::write(&future, "{\"format_version\":7,\"build_id\":\"dev\",\"seed\":1}\n").unwrap();
    assert!(matches!(
        load_journal_from_file(&future),
        Err(JournalLoadError::UnsupportedVersion { found: 7, .. })
    ));
}

#[test]
fn a_header_only_file_loads_an_empty_journal() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "header_only.jsonl");
    let _writer = JournalWriter::create(&path, 555, "dev").unwrap();

    let loaded = load_journal_from_file(&path).unwrap();
    assert_eq!(loaded.journal.seed, 555);
    assert!(loaded.journal.inputs.is_empty());
    assert_eq!(loaded.next_seq, 0);
    assert_eq!(loaded.last_sha256_hex, INITIAL_HASH);
}

#[test]
fn resumed_writers_extend_the_same_chain() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "nested").join("resume.jsonl");

    let mut writer = JournalWriter::create(&path, 1, "dev").unwrap();
    writer.append(0, &PlayerAction::Wait).unwrap();
    drop(writer);

    let loaded = load_journal_from_file(&path).unwrap();
    let mut writer = JournalWriter::resume(&path, loaded.last_sha256_hex, loaded.next_seq).unwrap();
    assert_eq!(writer.append(1, &PlayerAction::Move(Direction::West)).unwrap(), 1);
    drop(writer);

    let reloaded = load_journal_from_file(&path).unwrap();
    assert_eq!(reloaded.journal.inputs.len(), 2);
    assert_eq!(reloaded.journal.inputs[1].action, PlayerAction::Move(Direction::West));
    assert_eq!(reloaded.next_seq, 2);
}
