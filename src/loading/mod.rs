//! Batched relation loading.

pub mod eager_loader;

pub use eager_loader::EagerLoader;
