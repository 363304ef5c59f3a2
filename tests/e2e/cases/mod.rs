//! Remote end-to-end test cases

mod handshake;
mod headless;
mod persistence;
mod queue;
mod relay;
