//! Inbound STUN/TURN message model consumed by the checklist entries.

mod attributes;
mod message;
pub mod stun_const;
mod stun_err;
mod transaction;

pub use attributes::StunAttribute;
pub use message::{MessageClass, MessageType, StunMessage};
pub use stun_const::{STALE_NONCE_ERROR_CODE, UNAUTHORISED_ERROR_CODE};
pub use stun_err::StunError;
pub use transaction::TransactionId;
