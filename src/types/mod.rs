//! Shared primitive types.

mod calls;
pub use calls::*;

mod message;
pub use message::*;

mod policy;
pub use policy::*;

mod request;
pub use request::*;
