pub mod args;
pub mod config;
pub mod op;
pub mod ops;

pub use ops::{Glob, Health, Lookup, Mkdir, Rm, Serve, WhichAccess};
