//! Bounded history of the transaction ids sent for one candidate pair.

use std::collections::VecDeque;

use crate::logger::Logger;
use crate::stun::TransactionId;

/// Number of ids kept per pair; older ones are forgotten.
pub const TRANSACTION_CACHE_CAPACITY: usize = 30;

/// Where in the history an inbound transaction id was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMatch {
    /// Response to the most recent request.
    Current,
    /// Response to a request that was superseded since, e.g. a retried check.
    Previous { position: usize },
}

/// Most-recent-first list of outbound transaction ids.
#[derive(Debug, Clone)]
pub struct TransactionCache {
    ids: VecDeque<TransactionId>,
    logger: Logger,
}

impl TransactionCache {
    pub fn new(logger: Logger) -> Self {
        Self {
            ids: VecDeque::with_capacity(TRANSACTION_CACHE_CAPACITY),
            logger,
        }
    }

    /// Most recently recorded id.
    pub fn current(&self) -> Option<TransactionId> {
        self.ids.front().copied()
    }

    /// Records `id` as the most recent transaction.
    ///
    /// Recording the current id again is a no-op.
    pub fn record(&mut self, id: TransactionId) {
        if self.current() == Some(id) {
            return;
        }
        while self.ids.len() >= TRANSACTION_CACHE_CAPACITY {
            self.ids.pop_back();
        }
        self.ids.push_front(id);
    }

    pub fn lookup(&self, id: &TransactionId) -> Option<CacheMatch> {
        self.ids
            .iter()
            .position(|cached| cached == id)
            .map(|position| match position {
                0 => CacheMatch::Current,
                position => CacheMatch::Previous { position },
            })
    }

    pub fn contains(&self, id: &TransactionId) -> bool {
        match self.lookup(id) {
            Some(CacheMatch::Current) => true,
            Some(CacheMatch::Previous { position }) => {
                self.logger.debug(&format!(
                    "transaction {} matched a previous id at position {}",
                    id, position
                ));
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &TransactionId> {
        self.ids.iter()
    }
}
