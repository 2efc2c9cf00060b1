use linkdupe::duplicates::{DedupConfig, Deduplicator, KeepPolicy};
use linkdupe::scanner::recovery::recover_tree;
use linkdupe::scanner::{backup_path_for, Walker, WalkerConfig};
use std::fs;
use tempfile::tempdir;

use crate::{identity, write_file};

#[test]
fn test_interrupted_after_link_is_restored() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"survivor");
    let b = write_file(dir.path(), "b", b"survivor");
    let c = write_file(dir.path(), "c", b"survivor");
    let original = identity(&c);

    // Crash between link creation and backup removal
    fs::rename(&c, backup_path_for(&c)).unwrap();
    fs::hard_link(&a, &c).unwrap();

    let walker = Walker::new(dir.path(), WalkerConfig { min_size: 1 });
    let paths: Vec<_> = walker.walk().map(|e| e.unwrap().path).collect();

    assert_eq!(paths, vec![a.clone(), b, c.clone()]);
    assert!(!backup_path_for(&c).exists());
    assert_eq!(identity(&c), original);
    assert_ne!(identity(&c), identity(&a));
}

#[test]
fn test_interrupted_before_link_is_restored() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"payload");
    let b = write_file(dir.path(), "b", b"payload");
    fs::rename(&b, backup_path_for(&b)).unwrap();

    let walker = Walker::new(dir.path(), WalkerConfig { min_size: 1 });
    let count = walker.walk().filter(Result::is_ok).count();

    assert_eq!(count, 2);
    assert_eq!(fs::read(&b).unwrap(), b"payload");
}

#[test]
fn test_run_after_crash_deduplicates_restored_file() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"same same");
    let b = write_file(dir.path(), "b", b"same same");
    fs::rename(&b, backup_path_for(&b)).unwrap();

    let config = DedupConfig::default()
        .with_policy(KeepPolicy::KeepMinimum)
        .with_deduplicate(true)
        .with_min_size(1);
    let report = Deduplicator::with_native(config)
        .unwrap()
        .run(dir.path())
        .unwrap();

    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.summary.links_created, 1);
    assert_eq!(identity(&a), identity(&b));
    assert!(!backup_path_for(&b).exists());
}

#[test]
fn test_recover_tree_only_restores() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let a = write_file(dir.path(), "a", b"x");
    let nested = write_file(&dir.path().join("sub"), "n", b"y");
    fs::rename(&nested, backup_path_for(&nested)).unwrap();

    let summary = recover_tree(dir.path());

    assert_eq!(summary.restored, vec![nested.clone()]);
    assert!(summary.errors.is_empty());
    assert!(nested.exists());
    assert!(a.exists());
}
