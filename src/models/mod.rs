//! Model loading and the shared model registry

pub mod bert;
pub mod hashing;
pub mod manager;
pub mod registry;
pub mod static_model;

pub use registry::{ModelRegistry, RegistryHealth};
