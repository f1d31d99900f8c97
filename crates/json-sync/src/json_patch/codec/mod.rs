//! Wire codecs for operations.

pub mod json;
