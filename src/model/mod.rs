pub mod resource_state;

pub use resource_state::{GpgState, ResourceState};
