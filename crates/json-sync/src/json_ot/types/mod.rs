//! OT type implementations.

pub mod ot_text;
