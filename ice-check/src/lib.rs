pub mod config;
pub mod ice;
pub mod logger;
pub mod stun;

pub use config::CheckConfig;
pub use ice::{CheckState, ChecklistEntry, IceCandidate};
pub use logger::Logger;
pub use stun::{StunMessage, TransactionId};
