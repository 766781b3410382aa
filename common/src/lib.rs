//! Configuration shared by the pgexport binary and its library crates.

pub mod config;
