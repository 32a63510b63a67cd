pub mod deletion;
pub mod posts;

pub use deletion::{DeletionCoordinator, DeletionError};
pub use posts::PostService;
