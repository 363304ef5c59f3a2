//! RPC modules.

mod remote;

pub use remote::*;
