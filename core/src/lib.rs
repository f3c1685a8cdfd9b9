pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod identity;
pub mod message;
pub mod status;

pub use diagnostics::{AttemptPhase, DiagnosticRecord, LedgerSummary};
pub use error::{ChatError, ErrorKind};
pub use formats::CandidateSchema;
pub use message::{ChatResponse, MessageContext, PayloadInput, Reply};
pub use status::{ConnectionStatus, HealthTier};
