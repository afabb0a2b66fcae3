//! Resource lifecycle and on-disk persistence
pub mod resource;
pub mod storage;

pub use resource::GpgResource;
pub use storage::IdentityStore;
