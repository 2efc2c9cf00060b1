//! File actions module.
//!
//! Currently one action exists: replacing a duplicate by a hard link to a
//! retained copy. See [`link`] for the swap protocol and its rollback
//! guarantees.
//!
//! ```no_run
//! use linkdupe::actions::link_swap;
//! use linkdupe::platform::NativePlatform;
//! use std::path::Path;
//!
//! let platform = NativePlatform::detect().unwrap();
//! link_swap(&platform, Path::new("a.iso"), Path::new("b.iso")).unwrap();
//! ```

pub mod link;

pub use link::{
    link_batch, link_swap, link_verified, BatchLinkResult, LinkError, LinkOutcome,
    LinkProgressCallback, SwapState,
};
