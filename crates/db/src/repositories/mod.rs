//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&SqlitePool` as the first argument.

pub mod destination_image_repo;
pub mod destination_repo;
pub mod pending_cleanup_repo;
pub mod user_repo;

pub use destination_image_repo::DestinationImageRepo;
pub use destination_repo::DestinationRepo;
pub use pending_cleanup_repo::PendingCleanupRepo;
pub use user_repo::UserRepo;
