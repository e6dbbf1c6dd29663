pub mod peer;
pub mod rendezvous;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod tests;

use std::time::Duration;

use crate::graph::GraphError;
use crate::graph::generator::GeneratorError;

pub use peer::{MatchOutcome, run_match};
pub use rendezvous::{Phase, Role};
pub use transport::{MemoryBroker, TransportError};
pub use wire::DecodeError;

/// Default pause between retransmissions.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(1000);
/// Default retransmissions of an unacknowledged payload.
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Decode(#[from] DecodeError),

    #[error("received puzzle is invalid: {0}")]
    Graph(#[from] GraphError),

    #[error("could not generate a puzzle: {0}")]
    Generator(#[from] GeneratorError),

    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("peer did not acknowledge after {attempts} retransmissions")]
    Unacknowledged { attempts: u32 },

    #[error("peer went silent for {intervals} retry intervals mid-transfer")]
    Silent { intervals: u32 },
}

/// Connection parameters for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSettings {
    pub role: Role,
    pub topic: String,
    pub retry_interval: Duration,
    pub max_retries: u32,
}

impl MatchSettings {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            topic: wire::TOPIC.to_string(),
            retry_interval: RETRY_INTERVAL,
            max_retries: MAX_RETRIES,
        }
    }
}
