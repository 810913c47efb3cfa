//! End-to-end message preparation
//!
//! Raw dictation plus the contact directory in, cleaned body plus resolved
//! target out. Correction happens first (AI or deterministic fallback), an
//! explicit recipient always wins over a detected one, and resolution is
//! centralized in the directory so the AI and fallback paths cannot
//! disagree about identity.

use crate::assemble::{strip_addressing, OutboundMessage};
use crate::correct::Corrector;
use crate::directory::{ContactDirectory, ResolvedTarget};
use crate::error::{Error, Result};
use tracing::debug;

/// Everything derived from one dictation, resolved or not
#[derive(Debug, Clone)]
pub struct PreparedMessage {
    pub original_text: String,
    pub corrected_text: String,
    pub body: String,
    pub recipient_hint: Option<String>,
    pub target: Option<ResolvedTarget>,
    pub confidence: f64,
    pub correction_error: Option<String>,
}

impl PreparedMessage {
    pub fn is_ready(&self) -> bool {
        self.target.is_some()
    }

    /// Surface resolution failure as the one user-visible pipeline error
    pub fn into_outbound(self) -> Result<OutboundMessage> {
        match self.target {
            Some(target) => Ok(OutboundMessage {
                body: self.body,
                target,
            }),
            None => Err(Error::RecipientNotFound(
                self.recipient_hint.unwrap_or_else(|| "<none>".to_string()),
            )),
        }
    }
}

/// Run the full pipeline: correct (unless disabled), pick the hint, resolve
/// it, strip addressing language. Never fails; an unresolved recipient shows
/// up as `target: None`.
pub async fn prepare(
    corrector: &Corrector,
    directory: &ContactDirectory,
    raw_text: &str,
    explicit_recipient: Option<&str>,
    fix_grammar: bool,
) -> PreparedMessage {
    let mut corrected = raw_text.to_string();
    let mut hint = explicit_recipient.map(|s| s.to_string());
    let mut confidence = 1.0;
    let mut correction_error = None;

    if fix_grammar {
        let known = directory.contact_ids();
        let result = corrector.correct(raw_text, &known).await;
        corrected = result.corrected_text;
        confidence = result.confidence;
        correction_error = result.error;
        if hint.is_none() {
            hint = result.detected_recipient;
        }
    }

    let target = directory.resolve(hint.as_deref());
    debug!(hint = ?hint, resolved = target.is_some(), "recipient resolution");

    let recipient_name = target.as_ref().map(|t| t.name.as_str()).unwrap_or("");
    let body = strip_addressing(&corrected, recipient_name);

    PreparedMessage {
        original_text: raw_text.to_string(),
        corrected_text: corrected,
        body,
        recipient_hint: hint,
        target,
        confidence,
        correction_error,
    }
}
