use linkdupe::platform::{FileIdentity, NativePlatform, Platform};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

mod integration {
    mod cli_tests;
    mod config_tests;
    mod dedupe_tests;
    mod recovery_tests;
}

/// Serializes tests that read or write `LINKDUPE_*` variables.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn identity(path: &Path) -> FileIdentity {
    NativePlatform::detect()
        .unwrap()
        .identity_of(path)
        .unwrap()
}
