//! Domain model (identities, erased values, errors).

pub mod erased;
pub mod errors;
pub mod identity;

pub use self::erased::{BoxFuture, Payload, Response};
pub use self::errors::{BoxError, MediatorError};
pub use self::identity::{Capability, HandlerKey, MessageType};
