//! Applies inbound STUN/TURN responses to a checklist entry.

use std::net::SocketAddr;
use std::time::Instant;

use super::entry::{CheckState, ChecklistEntry};
use crate::stun::{
    MessageClass, MessageType, StunMessage, TransactionId, STALE_NONCE_ERROR_CODE,
    UNAUTHORISED_ERROR_CODE,
};

/// Outcome of inspecting an error response for an authentication challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Credentials were refreshed; the request will be sent again.
    RetryPending,
    NoRetry,
}

impl ChecklistEntry {
    /// Processes a response matched to this pair, at the current time.
    pub fn handle_response(&mut self, message: &StunMessage, remote_endpoint: SocketAddr) {
        self.handle_response_at(message, remote_endpoint, Instant::now());
    }

    /// Processes a response matched to this pair, as if received at `now`.
    ///
    /// Outcomes are only visible through the entry's fields and its logger.
    pub fn handle_response_at(
        &mut self,
        message: &StunMessage,
        remote_endpoint: SocketAddr,
        now: Instant,
    ) {
        let retry = if message.class == MessageClass::ErrorResponse {
            self.handle_auth_challenge(message)
        } else {
            RetryDecision::NoRetry
        };

        match message.message_type {
            MessageType::RefreshSuccessResponse => self.on_refresh_success(message, now),
            MessageType::RefreshErrorResponse => {
                self.logger.warn(&format!(
                    "TURN refresh error response from {} (error code {:?})",
                    remote_endpoint,
                    message.error_code()
                ));
            }
            MessageType::BindingSuccessResponse => {
                if self.is_nominated() {
                    self.last_connected_response_at = Some(now);
                    self.checks_sent = 0;
                    self.record_outbound_transaction(TransactionId::random());
                } else {
                    self.logger.debug(&format!(
                        "binding success response from {}",
                        remote_endpoint
                    ));
                    self.set_succeeded();
                }
            }
            MessageType::BindingErrorResponse => {
                self.logger.warn(&format!(
                    "binding error response from {} (error code {:?})",
                    remote_endpoint,
                    message.error_code()
                ));
                self.state = CheckState::Failed;
            }
            MessageType::CreatePermissionSuccessResponse => {
                self.turn_permission_request_sent = 1;
                self.turn_permission_response_at = Some(now);
                if self.state == CheckState::InProgress {
                    // permission now exists, the check has to go out again
                    self.state = CheckState::Waiting;
                    self.first_check_sent_at = None;
                }
            }
            MessageType::CreatePermissionErrorResponse => {
                self.turn_permission_response_at = Some(now);
                match retry {
                    RetryDecision::RetryPending => {
                        self.logger.debug("CreatePermission rejected, retrying with fresh credentials");
                    }
                    RetryDecision::NoRetry => {
                        self.logger.warn(&format!(
                            "CreatePermission error response from {} (error code {:?})",
                            remote_endpoint,
                            message.error_code()
                        ));
                        self.state = CheckState::Failed;
                    }
                }
            }
            other => {
                self.logger.warn(&format!(
                    "unexpected {:?} ({:?}) from {}",
                    other, message.class, remote_endpoint
                ));
            }
        }
    }

    /// Refreshes the relay credentials on a 401/438 error response.
    fn handle_auth_challenge(&self, message: &StunMessage) -> RetryDecision {
        let code = match message.error_code() {
            Some(code) if code == UNAUTHORISED_ERROR_CODE || code == STALE_NONCE_ERROR_CODE => code,
            _ => return RetryDecision::NoRetry,
        };

        let server = match &self.local_candidate().relay_server {
            Some(server) => server,
            None => {
                self.logger
                    .warn(&format!("error {} without a relay server to authenticate", code));
                return RetryDecision::NoRetry;
            }
        };

        match server.lock() {
            Ok(mut server) => {
                server.set_authentication_fields(message);
                let id = server.generate_new_transaction_id();
                self.logger.debug(&format!(
                    "error {} from {}, credentials refreshed, next transaction {}",
                    code, server.url, id
                ));
                RetryDecision::RetryPending
            }
            Err(_) => {
                self.logger.error("relay server lock poisoned");
                RetryDecision::NoRetry
            }
        }
    }

    fn on_refresh_success(&self, message: &StunMessage, now: Instant) {
        let lifetime = match message.lifetime() {
            Some(lifetime) => lifetime,
            None => {
                self.logger.warn("TURN refresh success without a lifetime");
                return;
            }
        };

        match &self.local_candidate().relay_server {
            Some(server) => match server.lock() {
                Ok(mut server) => {
                    server.set_expiry(now + lifetime);
                    self.logger.debug(&format!(
                        "TURN allocation on {} refreshed for {}s",
                        server.url,
                        lifetime.as_secs()
                    ));
                }
                Err(_) => self.logger.error("relay server lock poisoned"),
            },
            None => self
                .logger
                .warn("TURN refresh success on a pair without a relay server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ice::candidate::{CandidateType, IceCandidate};
    use crate::ice::turn_server::TurnServer;
    use crate::logger::{LogLevel, Logger};
    use crate::stun::StunAttribute;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn remote_addr() -> SocketAddr {
        "198.51.100.2:3478".parse().unwrap()
    }

    fn relay_entry() -> (ChecklistEntry, Arc<Mutex<TurnServer>>) {
        let server = Arc::new(Mutex::new(TurnServer::new(
            "turn:turn.example.org:3478",
            "alice",
            "secret",
        )));
        let local = IceCandidate::new("relay-0", "203.0.113.7", 49152, CandidateType::Relay, 16777215)
            .with_relay_server(Arc::clone(&server));
        let remote = IceCandidate::new("host-0", "198.51.100.2", 5000, CandidateType::Host, 2130706431);
        let entry = ChecklistEntry::new(Arc::new(local), Arc::new(remote), true);
        (entry, server)
    }

    fn in_progress(entry: &mut ChecklistEntry, now: Instant) -> TransactionId {
        let id = TransactionId::random();
        entry.unfreeze();
        entry.check_sent(id, now);
        id
    }

    fn response(message_type: MessageType) -> StunMessage {
        StunMessage::new(message_type, TransactionId::random())
    }

    fn error_code(code: u32) -> StunAttribute {
        StunAttribute::ErrorCode {
            code,
            reason: String::new(),
        }
    }

    #[test]
    fn test_binding_success_not_nominated() {
        let (mut entry, _) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);

        entry.handle_response_at(&response(MessageType::BindingSuccessResponse), remote_addr(), now);

        assert_eq!(entry.state(), CheckState::Succeeded);
        assert_eq!(entry.checks_sent(), 0);
    }

    #[test]
    fn test_binding_success_nominated_is_keepalive() {
        let (mut entry, _) = relay_entry();
        let t0 = Instant::now();
        in_progress(&mut entry, t0);
        entry.handle_response_at(&response(MessageType::BindingSuccessResponse), remote_addr(), t0);
        entry.nominate().unwrap();

        let before = entry.transaction_cache().current();
        let t1 = t0 + Duration::from_secs(15);
        entry.handle_response_at(&response(MessageType::BindingSuccessResponse), remote_addr(), t1);

        assert_eq!(entry.last_connected_response_at(), Some(t1));
        assert_ne!(entry.transaction_cache().current(), before);
        assert_eq!(entry.transaction_cache().len(), 2);
        assert_eq!(entry.state(), CheckState::Succeeded);
    }

    #[test]
    fn test_binding_error_fails_from_any_state() {
        let now = Instant::now();
        let prepare: [fn(&mut ChecklistEntry, Instant); 5] = [
            |_, _| {},
            |entry, _| entry.unfreeze(),
            |entry, now| {
                in_progress(entry, now);
            },
            |entry, now| {
                in_progress(entry, now);
                entry.handle_response_at(&response(MessageType::BindingSuccessResponse), remote_addr(), now);
            },
            |entry, _| entry.fail(),
        ];
        let expected = [
            CheckState::Frozen,
            CheckState::Waiting,
            CheckState::InProgress,
            CheckState::Succeeded,
            CheckState::Failed,
        ];

        for (prepare, before) in prepare.iter().zip(expected) {
            let (mut entry, _) = relay_entry();
            prepare(&mut entry, now);
            assert_eq!(entry.state(), before);

            entry.handle_response_at(&response(MessageType::BindingErrorResponse), remote_addr(), now);
            assert_eq!(entry.state(), CheckState::Failed);
        }
    }

    #[test]
    fn test_answered_keepalives_never_time_out() {
        let config = crate::config::CheckConfig::default();
        let (mut entry, _) = relay_entry();
        let mut now = Instant::now();
        in_progress(&mut entry, now);
        entry.handle_response_at(&response(MessageType::BindingSuccessResponse), remote_addr(), now);
        entry.nominate().unwrap();

        for _ in 0..config.max_checks + 2 {
            now += config.keepalive_interval();
            entry.check_sent(TransactionId::random(), now);
            entry.handle_response_at(&response(MessageType::BindingSuccessResponse), remote_addr(), now);
        }

        assert_eq!(entry.state(), CheckState::Succeeded);
        assert_eq!(entry.checks_sent(), 0);
        assert_eq!(entry.last_connected_response_at(), Some(now));
        assert!(!crate::ice::connectivity::check_timed_out(&entry, &config));
    }

    #[test]
    fn test_permission_success_rolls_back_in_progress() {
        let (mut entry, _) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);

        entry.handle_response_at(
            &response(MessageType::CreatePermissionSuccessResponse),
            remote_addr(),
            now,
        );

        assert_eq!(entry.state(), CheckState::Waiting);
        assert_eq!(entry.first_check_sent_at(), None);
        assert_eq!(entry.turn_permission_request_sent(), 1);
        assert_eq!(entry.turn_permission_response_at(), Some(now));
    }

    #[test]
    fn test_permission_success_keeps_other_states() {
        let (mut entry, _) = relay_entry();
        let now = Instant::now();

        entry.handle_response_at(
            &response(MessageType::CreatePermissionSuccessResponse),
            remote_addr(),
            now,
        );

        assert_eq!(entry.state(), CheckState::Frozen);
        assert_eq!(entry.turn_permission_request_sent(), 1);
    }

    #[test]
    fn test_permission_error_without_challenge_fails() {
        let (mut entry, _) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);

        let message =
            response(MessageType::CreatePermissionErrorResponse).with_attribute(error_code(403));
        entry.handle_response_at(&message, remote_addr(), now);

        assert_eq!(entry.state(), CheckState::Failed);
        assert_eq!(entry.turn_permission_response_at(), Some(now));
    }

    #[test]
    fn test_permission_error_with_unauthorised_retries() {
        let (mut entry, server) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);
        let old_id = server.lock().unwrap().transaction_id();

        let message = response(MessageType::CreatePermissionErrorResponse)
            .with_attribute(error_code(UNAUTHORISED_ERROR_CODE))
            .with_attribute(StunAttribute::Realm("example.org".to_string()))
            .with_attribute(StunAttribute::Nonce("nonce-1".to_string()));
        entry.handle_response_at(&message, remote_addr(), now);

        assert_eq!(entry.state(), CheckState::InProgress);
        assert_eq!(entry.turn_permission_response_at(), Some(now));
        let server = server.lock().unwrap();
        assert_ne!(server.transaction_id(), old_id);
        assert_eq!(server.realm(), Some("example.org"));
        assert_eq!(server.nonce(), Some("nonce-1"));
    }

    #[test]
    fn test_permission_error_with_stale_nonce_retries() {
        let (mut entry, server) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);
        let old_id = server.lock().unwrap().transaction_id();

        let message = response(MessageType::CreatePermissionErrorResponse)
            .with_attribute(error_code(STALE_NONCE_ERROR_CODE))
            .with_attribute(StunAttribute::Nonce("nonce-2".to_string()));
        entry.handle_response_at(&message, remote_addr(), now);

        assert_eq!(entry.state(), CheckState::InProgress);
        assert_eq!(entry.turn_permission_response_at(), Some(now));
        let server = server.lock().unwrap();
        assert_ne!(server.transaction_id(), old_id);
        assert_eq!(server.nonce(), Some("nonce-2"));
    }

    #[test]
    fn test_retry_does_not_carry_over_calls() {
        let (mut entry, _) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);

        let challenge =
            response(MessageType::AllocateErrorResponse).with_attribute(error_code(STALE_NONCE_ERROR_CODE));
        entry.handle_response_at(&challenge, remote_addr(), now);
        assert_eq!(entry.state(), CheckState::InProgress);

        entry.handle_response_at(
            &response(MessageType::CreatePermissionErrorResponse),
            remote_addr(),
            now,
        );
        assert_eq!(entry.state(), CheckState::Failed);
    }

    #[test]
    fn test_challenge_without_relay_server_is_not_retried() {
        let local = IceCandidate::new("host-0", "10.0.0.1", 5000, CandidateType::Host, 2130706431);
        let remote = IceCandidate::new("host-1", "10.0.0.2", 5000, CandidateType::Host, 2130706430);
        let mut entry = ChecklistEntry::new(Arc::new(local), Arc::new(remote), false);

        let message = response(MessageType::CreatePermissionErrorResponse)
            .with_attribute(error_code(UNAUTHORISED_ERROR_CODE));
        entry.handle_response_at(&message, remote_addr(), Instant::now());

        assert_eq!(entry.state(), CheckState::Failed);
    }

    #[test]
    fn test_refresh_success_sets_expiry() {
        let (mut entry, server) = relay_entry();
        let now = Instant::now();

        let message = response(MessageType::RefreshSuccessResponse)
            .with_attribute(StunAttribute::Lifetime {
                seconds_be: [0x00, 0x00, 0x02, 0x58],
            });
        entry.handle_response_at(&message, remote_addr(), now);

        assert_eq!(
            server.lock().unwrap().expiry(),
            Some(now + Duration::from_secs(600))
        );
        assert_eq!(entry.state(), CheckState::Frozen);
    }

    #[test]
    fn test_refresh_error_only_logs() {
        let (logger, rx) = Logger::channel();
        let server = Arc::new(Mutex::new(TurnServer::new("turn:t", "u", "p")));
        let local = IceCandidate::new("relay-0", "203.0.113.7", 49152, CandidateType::Relay, 1)
            .with_relay_server(server);
        let remote = IceCandidate::new("host-0", "198.51.100.2", 5000, CandidateType::Host, 2);
        let mut entry = ChecklistEntry::with_logger(Arc::new(local), Arc::new(remote), true, &logger);
        let now = Instant::now();
        in_progress(&mut entry, now);

        entry.handle_response_at(
            &response(MessageType::RefreshErrorResponse).with_attribute(error_code(437)),
            remote_addr(),
            now,
        );

        assert_eq!(entry.state(), CheckState::InProgress);
        let record = rx.try_iter().find(|r| r.level == LogLevel::Warn).unwrap();
        assert!(record.message.contains("refresh error"));
    }

    #[test]
    fn test_unknown_message_leaves_state() {
        let (mut entry, _) = relay_entry();
        let now = Instant::now();
        in_progress(&mut entry, now);

        entry.handle_response_at(&response(MessageType::Unknown(0x0115)), remote_addr(), now);
        entry.handle_response_at(&response(MessageType::AllocateSuccessResponse), remote_addr(), now);

        assert_eq!(entry.state(), CheckState::InProgress);
        assert_eq!(entry.checks_sent(), 1);
    }
}
