//! Representations of local or remote ICE candidates.

use std::sync::{Arc, Mutex};

use super::turn_server::TurnServer;

/// ICE candidate with its basic properties and priority.
#[derive(Debug, Clone)]
pub struct IceCandidate {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub candidate_type: CandidateType,
    pub priority: u32,
    /// TURN server the candidate was allocated on, for relay candidates.
    pub relay_server: Option<Arc<Mutex<TurnServer>>>,
}

/// Types of candidates available during ICE negotiations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateType {
    Host,
    Srflx,
    Prflx,
    Relay,
}

impl IceCandidate {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        candidate_type: CandidateType,
        priority: u32,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            candidate_type,
            priority,
            relay_server: None,
        }
    }

    /// Attaches the TURN server that owns this candidate's allocation.
    pub fn with_relay_server(mut self, server: Arc<Mutex<TurnServer>>) -> Self {
        self.relay_server = Some(server);
        self
    }
}
