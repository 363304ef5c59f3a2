//! Remote end-to-end tests
#![allow(unused)]

mod cases;
mod environment;
mod relay;
mod upstream;

pub use environment::*;
pub use relay::*;
pub use upstream::*;
