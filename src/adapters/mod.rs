// Adapters layer: filesystem implementations of the domain ports.

pub mod local;

#[cfg(test)]
pub mod memory;

pub use local::{LocalImageLibrary, LocalTableStore};
