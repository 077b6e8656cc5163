//! Backend abstraction layer
//!
//! Provides the trait a scene manager renders through and the CPU
//! rasterizer that implements it.

pub mod software;
pub mod traits;
pub mod types;

pub use software::SoftwareBackend;
pub use traits::*;
pub use types::*;
