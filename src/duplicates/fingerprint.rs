//! Fingerprint grouping: match identity classes by content digest.
//!
//! Only the representative of each [`IdentityClass`] is hashed; the other
//! members are the same storage object and cannot differ. Representatives
//! are hashed in parallel on the rayon pool, then folded into
//! [`FingerprintGroup`]s sequentially in class order, so the result is the
//! same as a single-threaded run.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use crate::scanner::{Fingerprinter, Hash, HashError};

use super::groups::FileRef;
use super::identity::{IdentityClass, VolumeClasses};
use super::policy::KeepPolicy;

/// Identity classes on one volume whose representatives share a digest.
#[derive(Debug, Clone)]
pub struct FingerprintGroup {
    /// Content digest shared by every member
    pub hash: Hash,
    /// File size in bytes
    pub size: u64,
    /// One representative per identity class, in class order
    pub mains: Vec<FileRef>,
    /// Files eligible to become links
    pub links: Vec<FileRef>,
}

impl FingerprintGroup {
    fn start(hash: Hash, size: u64, class: IdentityClass) -> Self {
        let mut files = class.files.into_iter();
        let mains: Vec<FileRef> = files.next().into_iter().collect();
        Self {
            hash,
            size,
            mains,
            links: files.collect(),
        }
    }

    fn absorb(&mut self, class: IdentityClass, policy: KeepPolicy) {
        let whole = policy.links_whole_class(self.mains.len());
        let mut files = class.files.into_iter();
        let Some(representative) = files.next() else {
            return;
        };

        if whole {
            self.links.push(representative.clone());
        }
        self.links.extend(files);
        self.mains.push(representative);
    }

    /// Hex form of the digest.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        crate::scanner::hash_to_hex(&self.hash)
    }
}

/// Hash one representative per class and group the classes by digest.
///
/// `on_hashed` is called once per class after its representative has been
/// hashed, possibly from several threads. A class whose representative
/// cannot be hashed is dropped and its error returned.
pub fn group_by_fingerprint<F>(
    volume: VolumeClasses,
    fingerprinter: &dyn Fingerprinter,
    policy: KeepPolicy,
    on_hashed: F,
) -> (Vec<FingerprintGroup>, Vec<HashError>)
where
    F: Fn(&Path) + Sync,
{
    let digests: Vec<Result<Hash, HashError>> = volume
        .classes
        .par_iter()
        .map(|class| {
            let path = &class.representative().path;
            let digest = fingerprinter.fingerprint(path);
            on_hashed(path);
            digest
        })
        .collect();

    let mut groups: Vec<FingerprintGroup> = Vec::new();
    let mut by_hash: HashMap<Hash, usize> = HashMap::new();
    let mut errors = Vec::new();

    for (class, digest) in volume.classes.into_iter().zip(digests) {
        let hash = match digest {
            Ok(hash) => hash,
            // Shutdown is reported by the caller, not per file
            Err(HashError::Interrupted(_)) => continue,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        match by_hash.get(&hash) {
            Some(&g) => groups[g].absorb(class, policy),
            None => {
                by_hash.insert(hash, groups.len());
                groups.push(FingerprintGroup::start(hash, volume.size, class));
            }
        }
    }

    (groups, errors)
}
