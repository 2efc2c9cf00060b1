//! Unix identities: `(st_dev, st_ino)`.

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use super::FileIdentity;

pub(super) fn identity_of(path: &Path) -> io::Result<FileIdentity> {
    let metadata = fs::symlink_metadata(path)?;
    Ok(FileIdentity::new(metadata.dev(), metadata.ino()))
}
