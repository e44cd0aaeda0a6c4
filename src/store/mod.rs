//! Record types and the filesystem-backed durable store / offline queue.

pub mod filesystem;
pub mod record;

pub use filesystem::{FileSystemQueue, FileSystemStore};
pub use record::{ComplianceRecord, PendingWrite, QueueOrigin, PHOTO_ATTACHED_MARKER};
