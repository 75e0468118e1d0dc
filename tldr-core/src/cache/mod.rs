//! Local page cache
//!
//! - [`ContentStore`]: the on-disk page tree
//! - [`Synchronizer`]: staged, all-or-nothing refresh from a remote source
//! - [`StalenessMonitor`]: age check against the freshness window

mod staleness;
mod store;
mod sync;

pub use staleness::StalenessMonitor;
pub use store::ContentStore;
pub(crate) use store::copy_tree;
pub use sync::Synchronizer;
