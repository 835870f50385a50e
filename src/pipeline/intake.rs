//! Intake: validate the caller-supplied document and credential.
//!
//! Validation here is presence-only. The payload is not sniffed for PDF
//! structure — the remote service is the authority on whether it can read
//! the document, and rejecting borderline files locally would just hide the
//! service's more informative error.

use crate::error::IntakeError;

/// The raw uploaded document: bytes plus a display name.
///
/// Owned by the intake stage, borrowed by transcription, never mutated.
#[derive(Debug, Clone)]
pub struct SourceDocument<'a> {
    bytes: &'a [u8],
    display_name: &'a str,
}

impl<'a> SourceDocument<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn display_name(&self) -> &'a str {
        self.display_name
    }
}

/// A validated pipeline request: the document plus the credential that will
/// authenticate exactly one remote call.
#[derive(Debug, Clone)]
pub struct ValidatedRequest<'a> {
    pub document: SourceDocument<'a>,
    pub credential: &'a str,
}

/// Validate presence of the document payload and the credential.
///
/// # Errors
/// [`IntakeError::MissingDocument`] when `payload` is empty;
/// [`IntakeError::MissingCredential`] when `credential` is blank.
/// No side effects in either case.
pub fn intake<'a>(
    payload: &'a [u8],
    display_name: &'a str,
    credential: &'a str,
) -> Result<ValidatedRequest<'a>, IntakeError> {
    if payload.is_empty() {
        return Err(IntakeError::MissingDocument);
    }
    if credential.trim().is_empty() {
        return Err(IntakeError::MissingCredential);
    }

    Ok(ValidatedRequest {
        document: SourceDocument {
            bytes: payload,
            display_name,
        },
        credential,
    })
}
