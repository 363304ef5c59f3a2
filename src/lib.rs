//! # Remote
//!
//! Remote mediation layer for wallet requests.
//!
//! A requester talks to the wallet over a [`messenger::Messenger`]. Every request it sends is
//! resolved against the method policy table into one of two modes: headless requests are
//! executed by the wallet right away, dialog requests are queued until a human approves or
//! rejects them through [`actions::respond`] and [`actions::reject`].

pub mod actions;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dialog;
pub mod error;
pub mod messenger;
pub mod metrics;
pub mod mode;
pub mod policy;
pub mod queue;
pub mod remote;
pub mod requester;
pub mod rpc;
pub mod spawn;
pub mod state;
pub mod storage;
pub mod types;
pub mod wallet;
