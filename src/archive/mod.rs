//! Archive construction: entry filtering and staged tar.gz building.

pub mod builder;
pub mod filter;

pub use builder::{ArchiveBuilder, StagedArchive};
pub use filter::{should_exclude, EntryKind};
