//! Component registration and discovery.

pub mod executor_registry;

pub use executor_registry::{ExecutorRegistry, RegistryError};
