//! Error taxonomy for the analysis pipeline.
//!
//! Only transport and setup failures are modeled as errors. A failure inside
//! the generated analysis code is expected and travels as data in the
//! execution outcome, so a query can still return partial output.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// The remote execution environment could not be created, either because
    /// the provider is unreachable or the credential is missing.
    #[error("sandbox provisioning failed: {0}")]
    Provisioning(String),

    /// An operation was attempted before `start()` or after `stop()`.
    #[error("sandbox not started")]
    NotStarted,

    /// No LLM credential was configured when the client was built.
    #[error("LLM client not initialized: OPENROUTER_API_KEY is not set")]
    GenerationUnavailable,

    /// The upstream chat-completion call failed (network, status, shape).
    #[error("code generation request failed: {0}")]
    GenerationRequest(String),

    /// Transport failure talking to the sandbox provider.
    #[error("sandbox transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_message_names_the_initialization() {
        assert!(Error::GenerationUnavailable
            .to_string()
            .contains("not initialized"));
    }

    #[test]
    fn variant_messages_carry_the_underlying_detail() {
        let err = Error::Provisioning("provider unreachable".into());
        assert!(err.to_string().contains("provider unreachable"));
        let err = Error::GenerationRequest("LLM error: 429".into());
        assert!(err.to_string().contains("429"));
        assert_eq!(Error::NotStarted.to_string(), "sandbox not started");
    }
}
