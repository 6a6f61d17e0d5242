//! Service configuration

/// Default upper bound on an uploaded evidence file: 10 MiB
pub const DEFAULT_MAX_EVIDENCE_BYTES: usize = 10 * 1024 * 1024;

/// Limits applied by the case service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Largest evidence file accepted, in bytes
    pub max_evidence_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_evidence_bytes: DEFAULT_MAX_EVIDENCE_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Override the evidence size limit
    pub fn with_max_evidence_bytes(mut self, max_evidence_bytes: usize) -> Self {
        self.max_evidence_bytes = max_evidence_bytes;
        self
    }
}
