//! Keep policy: how many independent copies survive, and what gets linked.
//!
//! # Modes
//!
//! - [`KeepPolicy::KeepExtra`] (default) tolerates one extra independent
//!   copy. A set of identical files is only touched once it has three or
//!   more independent copies; two are retained and the rest are linked to
//!   them, alternating between the two so each ends up with a similar
//!   number of links.
//! - [`KeepPolicy::KeepMinimum`] links everything to a single retained copy
//!   as soon as there are two independent copies.
//!
//! # Example
//!
//! ```
//! use linkdupe::duplicates::KeepPolicy;
//!
//! assert_eq!(KeepPolicy::KeepExtra.min_mains(), 3);
//! assert_eq!(KeepPolicy::from_keep_minimum(true), KeepPolicy::KeepMinimum);
//! ```

use serde::{Deserialize, Serialize};

use super::fingerprint::FingerprintGroup;
use super::groups::FileRef;

/// How many independent copies of a duplicate set are retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Retain two independent copies.
    #[default]
    KeepExtra,
    /// Retain a single copy and link every other file to it.
    KeepMinimum,
}

/// One planned conversion of `destination` into a link to `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkPlan {
    /// Retained copy the link will point at
    pub source: FileRef,
    /// File to be replaced by the link
    pub destination: FileRef,
}

impl KeepPolicy {
    /// Map the `--all` / `keep_minimum` flag to a policy.
    #[must_use]
    pub const fn from_keep_minimum(keep_minimum: bool) -> Self {
        if keep_minimum {
            Self::KeepMinimum
        } else {
            Self::KeepExtra
        }
    }

    /// Independent copies needed before a group is acted on.
    #[must_use]
    pub const fn min_mains(self) -> usize {
        match self {
            Self::KeepExtra => 3,
            Self::KeepMinimum => 2,
        }
    }

    /// Number of retained copies links are spread across.
    #[must_use]
    pub const fn sources(self) -> usize {
        match self {
            Self::KeepExtra => 2,
            Self::KeepMinimum => 1,
        }
    }

    /// While building a fingerprint group: does a newly matched class join
    /// `links` with its representative, given the mains recorded so far?
    ///
    /// When this is false only the representative's co-links are taken and
    /// the representative stays an untouched extra copy.
    #[must_use]
    pub const fn links_whole_class(self, mains_so_far: usize) -> bool {
        match self {
            Self::KeepMinimum => true,
            Self::KeepExtra => mains_so_far >= 2,
        }
    }

    /// Whether a fingerprint group has enough independent copies to act on.
    #[must_use]
    pub fn is_actionable(self, group: &FingerprintGroup) -> bool {
        group.mains.len() >= self.min_mains()
    }

    /// Plan the link swaps for a group.
    ///
    /// Destinations at even positions in `links` go to `mains[0]`, odd ones
    /// to `mains[1]` under [`KeepPolicy::KeepExtra`]; everything goes to
    /// `mains[0]` under [`KeepPolicy::KeepMinimum`]. A destination of
    /// unknown identity, or one that already is its source's storage
    /// object, is skipped without shifting the alternation. Non-actionable
    /// groups yield no plans.
    #[must_use]
    pub fn plan_links(self, group: &FingerprintGroup) -> Vec<LinkPlan> {
        if !self.is_actionable(group) {
            return Vec::new();
        }

        let sources = &group.mains[..self.sources()];

        group
            .links
            .iter()
            .enumerate()
            .filter_map(|(i, destination)| {
                let source = &sources[i % sources.len()];
                if destination.identity.is_none() || source.same_object(destination) {
                    log::trace!(
                        "Not linking {} to {}: same object or unknown identity",
                        destination.path.display(),
                        source.path.display()
                    );
                    return None;
                }
                Some(LinkPlan {
                    source: source.clone(),
                    destination: destination.clone(),
                })
            })
            .collect()
    }
}
