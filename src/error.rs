use crate::value::Exception;
use miette::Diagnostic;
use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;

pub type InvokeResult<T> = Result<T, InvocationError>;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Signature mismatch: {message}")]
    #[diagnostic(
        code(compose::signature_mismatch),
        help("argument count and types must match the callable's declared parameters")
    )]
    SignatureMismatch { message: String },
    #[error("Scope violation: {message}")]
    #[diagnostic(
        code(compose::scope_violation),
        help("variables of another function can only be used by a closure builder that captures them")
    )]
    ScopeViolation { message: String },
    #[error("Protocol violation: {message}")]
    #[diagnostic(code(compose::protocol_violation))]
    ProtocolViolation { message: String },
}

impl ComposeError {
    pub fn signature(message: impl Into<String>) -> Self {
        ComposeError::SignatureMismatch {
            message: message.into(),
        }
    }

    pub fn scope(message: impl Into<String>) -> Self {
        ComposeError::ScopeViolation {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        ComposeError::ProtocolViolation {
            message: message.into(),
        }
    }
}

/// Failure raised while a composed callable runs.
///
/// Wraps the thrown [`Exception`] without altering it, so the error a native
/// callable raised is the very same object the caller observes.
#[derive(Debug, Clone, Error)]
#[error("Invocation failed: {exception}")]
pub struct InvocationError {
    exception: Exception,
}

impl InvocationError {
    pub fn new(exception: Exception) -> Self {
        Self { exception }
    }

    pub fn exception(&self) -> &Exception {
        &self.exception
    }

    pub fn into_exception(self) -> Exception {
        self.exception
    }
}

impl From<Exception> for InvocationError {
    fn from(exception: Exception) -> Self {
        Self::new(exception)
    }
}
