//! Deep equality for document values.

mod deep_equal;

pub use deep_equal::deep_equal;
