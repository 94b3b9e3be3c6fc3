//! Testing utilities and harness for Weft

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use weft_core::element::{text, Child, Component, Element, Props};
    pub use weft_core::hooks::Dep;
    pub use weft_core::host::{HostMutation, MemoryHost};
}
