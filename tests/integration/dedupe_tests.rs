use linkdupe::duplicates::{DedupConfig, Deduplicator, KeepPolicy, LinkStatus, RunReport};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use crate::{identity, write_file};

fn run(root: &Path, policy: KeepPolicy, deduplicate: bool) -> RunReport {
    let config = DedupConfig::default()
        .with_policy(policy)
        .with_deduplicate(deduplicate)
        .with_min_size(1);
    Deduplicator::with_native(config).unwrap().run(root).unwrap()
}

#[test]
fn test_three_copies_link_third_to_first() {
    let dir = tempdir().unwrap();
    let content = vec![7u8; 100];
    let a = write_file(dir.path(), "A", &content);
    let b = write_file(dir.path(), "B", &content);
    let c = write_file(dir.path(), "C", &content);
    let d = write_file(dir.path(), "D", &[7u8; 50]);

    let report = run(dir.path(), KeepPolicy::KeepExtra, true);

    assert_eq!(report.groups.len(), 1);
    let mains: Vec<_> = report.groups[0].mains.iter().map(|f| f.path.clone()).collect();
    assert_eq!(mains, vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(report.summary.links_created, 1);
    assert_eq!(report.summary.reclaimed_space, 100);

    assert_eq!(identity(&c), identity(&a));
    assert_ne!(identity(&b), identity(&a));
    assert_ne!(identity(&d), identity(&a));
    assert_eq!(fs::read(&c).unwrap(), content);
}

#[test]
fn test_two_copies_untouched_by_default() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"twin content");
    let b = write_file(dir.path(), "b", b"twin content");

    let report = run(dir.path(), KeepPolicy::KeepExtra, true);

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.links_created, 0);
    assert_ne!(identity(&a), identity(&b));
}

#[test]
fn test_keep_minimum_links_all_to_first() {
    let dir = tempdir().unwrap();
    let paths: Vec<_> = ["1", "2", "3", "4"]
        .iter()
        .map(|n| write_file(dir.path(), n, b"quadruplet"))
        .collect();

    let report = run(dir.path(), KeepPolicy::KeepMinimum, true);

    assert_eq!(report.summary.links_created, 3);
    let first = identity(&paths[0]);
    assert!(paths.iter().all(|p| identity(p) == first));
}

#[test]
fn test_keep_extra_alternates_between_two_sources() {
    let dir = tempdir().unwrap();
    let p: Vec<_> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|n| write_file(dir.path(), n, b"five of a kind"))
        .collect();

    run(dir.path(), KeepPolicy::KeepExtra, true);

    assert_ne!(identity(&p[0]), identity(&p[1]));
    assert_eq!(identity(&p[2]), identity(&p[0]));
    assert_eq!(identity(&p[3]), identity(&p[1]));
    assert_eq!(identity(&p[4]), identity(&p[0]));
}

#[test]
fn test_existing_links_are_respected() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"shared bytes");
    let a2 = dir.path().join("a2");
    fs::hard_link(&a, &a2).unwrap();
    let b = write_file(dir.path(), "b", b"shared bytes");
    let c = write_file(dir.path(), "c", b"shared bytes");

    let report = run(dir.path(), KeepPolicy::KeepExtra, true);

    // a2 is skipped without shifting parity, so c goes to the second source
    assert_eq!(report.summary.planned_links, 1);
    assert_eq!(identity(&c), identity(&b));
    assert_eq!(identity(&a2), identity(&a));
}

#[test]
fn test_second_run_is_a_no_op() {
    for policy in [KeepPolicy::KeepExtra, KeepPolicy::KeepMinimum] {
        let dir = tempdir().unwrap();
        for n in ["a", "b", "c", "d"] {
            write_file(dir.path(), n, b"idempotent");
        }

        let first = run(dir.path(), policy, true);
        assert!(first.summary.links_created > 0);

        let second = run(dir.path(), policy, true);
        assert_eq!(second.summary.planned_links, 0, "{policy:?}");
        assert!(second.groups.is_empty());
    }
}

#[test]
fn test_report_only_changes_nothing() {
    let dir = tempdir().unwrap();
    let p: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|n| write_file(dir.path(), n, b"look, don't touch"))
        .collect();

    let report = run(dir.path(), KeepPolicy::KeepMinimum, false);

    assert_eq!(report.summary.planned_links, 2);
    assert_eq!(report.summary.reclaimable_space, 2 * 17);
    assert!(report.groups[0]
        .links
        .iter()
        .all(|r| r.status == LinkStatus::Planned));
    assert_ne!(identity(&p[0]), identity(&p[1]));
    assert_ne!(identity(&p[0]), identity(&p[2]));
}

#[test]
fn test_equal_size_different_content_not_linked() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a", b"aaaa");
    let b = write_file(dir.path(), "b", b"bbbb");

    let report = run(dir.path(), KeepPolicy::KeepMinimum, true);

    assert_eq!(report.summary.size_groups, 1);
    assert!(report.groups.is_empty());
    assert_ne!(identity(&a), identity(&b));
}

#[test]
fn test_min_size_excludes_small_files() {
    let dir = tempdir().unwrap();
    for n in ["a", "b", "c"] {
        write_file(dir.path(), n, b"tiny");
    }

    let config = DedupConfig::default()
        .with_policy(KeepPolicy::KeepMinimum)
        .with_deduplicate(true)
        .with_min_size(5);
    let report = Deduplicator::with_native(config)
        .unwrap()
        .run(dir.path())
        .unwrap();

    assert_eq!(report.summary.total_files, 0);
    assert!(report.groups.is_empty());
}

#[test]
fn test_nested_directories_are_scanned() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("x/y")).unwrap();
    let a = write_file(dir.path(), "a", b"deep copy");
    let deep = write_file(&dir.path().join("x/y"), "z", b"deep copy");

    run(dir.path(), KeepPolicy::KeepMinimum, true);

    assert_eq!(identity(&a), identity(&deep));
}
