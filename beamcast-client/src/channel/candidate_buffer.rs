use beamcast_core::UserId;
use serde_json::Value;
use std::collections::HashMap;

/// Remote candidates held back until their endpoint has a remote description.
#[derive(Debug)]
pub struct CandidateBuffer {
    limit: usize,
    pending: HashMap<UserId, Vec<Value>>,
}

impl CandidateBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            pending: HashMap::new(),
        }
    }

    /// Returns false, dropping the candidate, once `remote` is at the limit.
    pub fn push(&mut self, remote: &UserId, candidate: Value) -> bool {
        let queue = self.pending.entry(remote.clone()).or_default();
        if queue.len() >= self.limit {
            return false;
        }
        queue.push(candidate);
        true
    }

    /// Hands out everything buffered for `remote`, in arrival order.
    pub fn take(&mut self, remote: &UserId) -> Vec<Value> {
        self.pending.remove(remote).unwrap_or_default()
    }

    pub fn discard(&mut self, remote: &UserId) {
        self.pending.remove(remote);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self, remote: &UserId) -> usize {
        self.pending.get(remote).map_or(0, Vec::len)
    }
}
