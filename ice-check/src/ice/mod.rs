//! Module that groups the checklist entry and its collaborators.

mod candidate;
pub mod connectivity;
mod dispatcher;
mod entry;
mod ice_err;
mod priority;
mod transaction_cache;
mod turn_server;

pub use candidate::{CandidateType, IceCandidate};
pub use connectivity::{find_entry_by_transaction, share, sort_entries_by_priority, SharedEntry};
pub use dispatcher::RetryDecision;
pub use entry::{CheckState, ChecklistEntry};
pub use ice_err::IceError;
pub use priority::pair_priority;
pub use transaction_cache::{CacheMatch, TransactionCache, TRANSACTION_CACHE_CAPACITY};
pub use turn_server::TurnServer;
