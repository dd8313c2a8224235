pub mod context;
pub mod coordinator;
pub mod deletion;
pub mod loader;
pub mod progress;
pub mod walker;

pub use context::LoaderContext;
pub use coordinator::{RefreshCoordinator, RefreshHandle, RefreshResult, RefreshSummary};
pub use deletion::DeletionHandler;
pub use loader::{ContentHash, MetadataLoader};
pub use progress::{RefreshPhase, RefreshProgress};
pub use walker::{CollectReport, PathCollector};
