//! Long-term credentials and allocation state of a TURN server.

use std::time::Instant;

use crate::stun::{StunMessage, TransactionId};

/// TURN server a relay candidate was allocated on.
///
/// Realm and nonce are learned from 401/438 challenges; the transaction id is
/// the one the next authenticated request to the server must carry.
#[derive(Debug, Clone)]
pub struct TurnServer {
    pub url: String,
    username: String,
    password: String,
    realm: Option<String>,
    nonce: Option<String>,
    transaction_id: TransactionId,
    expiry: Option<Instant>,
}

impl TurnServer {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            realm: None,
            nonce: None,
            transaction_id: TransactionId::random(),
            expiry: None,
        }
    }

    /// Takes realm and nonce from an authentication challenge.
    ///
    /// Attributes missing from the challenge keep their previous value; a
    /// stale-nonce response usually carries only a new nonce.
    pub fn set_authentication_fields(&mut self, challenge: &StunMessage) {
        if let Some(realm) = challenge.realm() {
            self.realm = Some(realm.to_string());
        }
        if let Some(nonce) = challenge.nonce() {
            self.nonce = Some(nonce.to_string());
        }
    }

    /// Replaces the transaction id used for the next request to the server.
    pub fn generate_new_transaction_id(&mut self) -> TransactionId {
        self.transaction_id = TransactionId::random();
        self.transaction_id
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn set_expiry(&mut self, at: Instant) {
        self.expiry = Some(at);
    }

    pub fn expiry(&self) -> Option<Instant> {
        self.expiry
    }

    /// True once the allocation lifetime has run out. Unknown expiry counts as live.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiry.map_or(false, |at| now >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stun::{MessageType, StunAttribute};
    use std::time::Duration;

    #[test]
    fn test_challenge_updates_realm_and_nonce() {
        let mut server = TurnServer::new("turn:turn.example.org", "alice", "secret");
        let challenge = StunMessage::new(MessageType::AllocateErrorResponse, TransactionId::random())
            .with_attribute(StunAttribute::Realm("example.org".to_string()))
            .with_attribute(StunAttribute::Nonce("n-1".to_string()));

        server.set_authentication_fields(&challenge);
        assert_eq!(server.realm(), Some("example.org"));
        assert_eq!(server.nonce(), Some("n-1"));

        let stale = StunMessage::new(MessageType::AllocateErrorResponse, TransactionId::random())
            .with_attribute(StunAttribute::Nonce("n-2".to_string()));
        server.set_authentication_fields(&stale);
        assert_eq!(server.realm(), Some("example.org"));
        assert_eq!(server.nonce(), Some("n-2"));
    }

    #[test]
    fn test_generate_new_transaction_id() {
        let mut server = TurnServer::new("turn:turn.example.org", "alice", "secret");
        let before = server.transaction_id();

        let fresh = server.generate_new_transaction_id();
        assert_ne!(before, fresh);
        assert_eq!(server.transaction_id(), fresh);
    }

    #[test]
    fn test_expiry() {
        let mut server = TurnServer::new("turn:turn.example.org", "alice", "secret");
        let now = Instant::now();
        assert!(!server.is_expired(now));

        server.set_expiry(now + Duration::from_secs(600));
        assert!(!server.is_expired(now));
        assert!(server.is_expired(now + Duration::from_secs(600)));
    }
}
