// Labelary client - Core Library
//
// Plain data describing what gets sent to Labelary. No I/O lives here.

pub mod models;

pub use models::*;
