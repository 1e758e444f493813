//! One local/remote candidate pair under connectivity test.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use super::candidate::IceCandidate;
use super::ice_err::IceError;
use super::priority::pair_priority;
use super::transaction_cache::TransactionCache;
use crate::logger::Logger;
use crate::stun::TransactionId;

/// Possible states during the life cycle of a checklist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Not checked until the checklist unfreezes it.
    Frozen,
    Waiting,
    InProgress,
    Succeeded,
    Failed,
}

/// Candidate pair as tracked by a checklist.
///
/// Candidate priorities are captured at creation, later changes to the
/// candidates do not move the pair in the checklist.
#[derive(Debug)]
pub struct ChecklistEntry {
    local_candidate: Arc<IceCandidate>,
    remote_candidate: Arc<IceCandidate>,
    is_local_controller: bool,
    local_priority: u32,
    remote_priority: u32,

    pub(crate) state: CheckState,
    has_succeeded: bool,
    is_default: bool,
    is_valid: bool,
    is_nominated: bool,

    pub(crate) first_check_sent_at: Option<Instant>,
    last_check_sent_at: Option<Instant>,
    pub(crate) checks_sent: u32,
    pub(crate) transaction_cache: TransactionCache,

    pub(crate) turn_permission_request_sent: u32,
    pub(crate) turn_permission_response_at: Option<Instant>,
    pub(crate) last_connected_response_at: Option<Instant>,
    last_binding_request_received_at: Option<Instant>,

    pub(crate) logger: Logger,
}

impl ChecklistEntry {
    pub fn new(
        local_candidate: Arc<IceCandidate>,
        remote_candidate: Arc<IceCandidate>,
        is_local_controller: bool,
    ) -> Self {
        Self::with_logger(
            local_candidate,
            remote_candidate,
            is_local_controller,
            &Logger::noop(),
        )
    }

    /// Same as [`Self::new`], logging through `logger` tagged with the pair.
    pub fn with_logger(
        local_candidate: Arc<IceCandidate>,
        remote_candidate: Arc<IceCandidate>,
        is_local_controller: bool,
        logger: &Logger,
    ) -> Self {
        let logger = logger.with_context(format!(
            "{}:{} -> {}:{}",
            local_candidate.address,
            local_candidate.port,
            remote_candidate.address,
            remote_candidate.port
        ));

        Self {
            local_priority: local_candidate.priority,
            remote_priority: remote_candidate.priority,
            local_candidate,
            remote_candidate,
            is_local_controller,
            state: CheckState::Frozen,
            has_succeeded: false,
            is_default: false,
            is_valid: false,
            is_nominated: false,
            first_check_sent_at: None,
            last_check_sent_at: None,
            checks_sent: 0,
            transaction_cache: TransactionCache::new(logger.clone()),
            turn_permission_request_sent: 0,
            turn_permission_response_at: None,
            last_connected_response_at: None,
            last_binding_request_received_at: None,
            logger,
        }
    }

    pub fn priority(&self) -> u64 {
        pair_priority(
            self.local_priority,
            self.remote_priority,
            self.is_local_controller,
        )
    }

    pub fn local_candidate(&self) -> &Arc<IceCandidate> {
        &self.local_candidate
    }

    pub fn remote_candidate(&self) -> &Arc<IceCandidate> {
        &self.remote_candidate
    }

    pub fn is_local_controller(&self) -> bool {
        self.is_local_controller
    }

    pub fn local_priority(&self) -> u32 {
        self.local_priority
    }

    pub fn remote_priority(&self) -> u32 {
        self.remote_priority
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn is_nominated(&self) -> bool {
        self.is_nominated
    }

    pub fn first_check_sent_at(&self) -> Option<Instant> {
        self.first_check_sent_at
    }

    pub fn last_check_sent_at(&self) -> Option<Instant> {
        self.last_check_sent_at
    }

    pub fn checks_sent(&self) -> u32 {
        self.checks_sent
    }

    pub fn transaction_cache(&self) -> &TransactionCache {
        &self.transaction_cache
    }

    pub fn turn_permission_request_sent(&self) -> u32 {
        self.turn_permission_request_sent
    }

    pub fn turn_permission_response_at(&self) -> Option<Instant> {
        self.turn_permission_response_at
    }

    pub fn last_connected_response_at(&self) -> Option<Instant> {
        self.last_connected_response_at
    }

    pub fn last_binding_request_received_at(&self) -> Option<Instant> {
        self.last_binding_request_received_at
    }

    /// Stores the id of a request sent on this pair.
    pub fn record_outbound_transaction(&mut self, id: TransactionId) {
        self.transaction_cache.record(id);
    }

    /// Whether a response carrying `id` belongs to this pair.
    pub fn matches_transaction(&self, id: &TransactionId) -> bool {
        self.transaction_cache.contains(id)
    }

    /// Frozen -> Waiting. Other states are left alone.
    pub fn unfreeze(&mut self) {
        if self.state == CheckState::Frozen {
            self.state = CheckState::Waiting;
        }
    }

    /// Bookkeeping for a connectivity check just sent by the scheduler.
    ///
    /// On a nominated pair the check is a keep-alive, see [`Self::keepalive_sent`].
    pub fn check_sent(&mut self, id: TransactionId, now: Instant) {
        if self.is_nominated {
            self.keepalive_sent(id, now);
            return;
        }
        self.state = CheckState::InProgress;
        if self.first_check_sent_at.is_none() {
            self.first_check_sent_at = Some(now);
        }
        self.last_check_sent_at = Some(now);
        self.checks_sent = self.checks_sent.saturating_add(1);
        self.record_outbound_transaction(id);
    }

    /// Keep-alive sent on a nominated pair. The state stays as it is; the
    /// request counts as outstanding until a binding success confirms the pair.
    pub fn keepalive_sent(&mut self, id: TransactionId, now: Instant) {
        self.last_check_sent_at = Some(now);
        self.checks_sent = self.checks_sent.saturating_add(1);
        self.record_outbound_transaction(id);
    }

    /// The peer sent us a binding request on this pair.
    pub fn record_binding_request_received(&mut self, now: Instant) {
        self.last_binding_request_received_at = Some(now);
    }

    /// Marks the pair as failed, e.g. when the scheduler gave up retransmitting.
    pub fn fail(&mut self) {
        self.logger.warn("connectivity check failed");
        self.state = CheckState::Failed;
    }

    pub fn mark_valid(&mut self) {
        self.is_valid = true;
    }

    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }

    /// Selects this pair for data. Only a pair that succeeded can be nominated.
    pub fn nominate(&mut self) -> Result<(), IceError> {
        if !self.has_succeeded {
            return Err(IceError::NominationBeforeSuccess(
                self.logger.context().to_string(),
            ));
        }
        self.is_nominated = true;
        self.logger.info("pair nominated");
        Ok(())
    }

    /// True once `max_checks` checks went unanswered.
    pub fn exceeded_check_budget(&self, max_checks: u32) -> bool {
        self.checks_sent >= max_checks
    }

    pub(crate) fn set_succeeded(&mut self) {
        self.state = CheckState::Succeeded;
        self.has_succeeded = true;
        self.checks_sent = 0;
    }
}

/// Equality and ordering only look at the pair priority.
impl PartialEq for ChecklistEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority() == other.priority()
    }
}

impl Eq for ChecklistEntry {}

impl PartialOrd for ChecklistEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Higher priority sorts first.
impl Ord for ChecklistEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority().cmp(&self.priority())
    }
}
