//! Identity grouping: partition a size group by storage object, per volume.
//!
//! Every member of a [`SizeGroup`] is asked for its (volume, object)
//! identity. Members sharing an identity are already hard links to each
//! other and form one [`IdentityClass`]. Classes are bucketed by volume,
//! since a hard link can never span two volumes.
//!
//! A file whose identity cannot be queried is dropped here and never takes
//! part in any later phase.

use std::collections::HashMap;

use crate::platform::{FileIdentity, Platform, PlatformError};

use super::groups::{FileRef, SizeGroup};

/// Files that all denote one storage object.
#[derive(Debug, Clone)]
pub struct IdentityClass {
    /// Shared identity of every member
    pub identity: FileIdentity,
    /// Members in discovery order; never empty
    pub files: Vec<FileRef>,
}

impl IdentityClass {
    fn new(identity: FileIdentity, first: FileRef) -> Self {
        Self {
            identity,
            files: vec![first],
        }
    }

    /// The member hashed on behalf of the whole class.
    #[must_use]
    pub fn representative(&self) -> &FileRef {
        &self.files[0]
    }

    /// Whether the class already holds several links to one object.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.files.len() > 1
    }
}

/// Identity classes of one size on one volume.
#[derive(Debug, Clone)]
pub struct VolumeClasses {
    /// Volume all classes live on
    pub volume: u64,
    /// Shared file size
    pub size: u64,
    /// Classes in order of first appearance
    pub classes: Vec<IdentityClass>,
}

/// Partition a size group into identity classes, per volume.
///
/// Volumes and classes keep the order in which they were first seen.
/// Returns the volumes together with the identity query failures.
pub fn group_by_identity(
    group: SizeGroup,
    platform: &dyn Platform,
) -> (Vec<VolumeClasses>, Vec<PlatformError>) {
    let mut volumes: Vec<VolumeClasses> = Vec::new();
    let mut volume_index: HashMap<u64, usize> = HashMap::new();
    let mut class_index: HashMap<FileIdentity, usize> = HashMap::new();
    let mut errors = Vec::new();
    let size = group.size;

    for mut file in group.files {
        let identity = match platform.identity_of(&file.path) {
            Ok(identity) => identity,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        file.identity = Some(identity);

        let v = *volume_index.entry(identity.volume).or_insert_with(|| {
            volumes.push(VolumeClasses {
                volume: identity.volume,
                size,
                classes: Vec::new(),
            });
            volumes.len() - 1
        });
        let classes = &mut volumes[v].classes;

        match class_index.get(&identity) {
            Some(&c) => classes[c].files.push(file),
            None => {
                class_index.insert(identity, classes.len());
                classes.push(IdentityClass::new(identity, file));
            }
        }
    }

    (volumes, errors)
}
