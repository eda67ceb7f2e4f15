//! Request validation and the summarize operation.
//!
//! Validation runs in a fixed order and stops at the first failure:
//! missing text, too short, too long, unknown style. Only a request that
//! passes all four reaches the provider.

use tracing::{error, info};

use crate::models::{text_len, SummarizeRequest, SummarizeResponse};
use crate::provider::{ProviderError, SummaryProvider};
use crate::style::Style;

pub const MIN_TEXT_CHARS: usize = 50;
pub const MAX_TEXT_CHARS: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizeError {
    #[error("Text input is required")]
    MissingText,
    #[error("Text must be at least 50 characters long")]
    TooShort,
    #[error("Text exceeds maximum length of 50,000 characters")]
    TooLong,
    #[error("Invalid summarization style: '{0}' (expected brief, detailed, or bullets)")]
    InvalidStyle(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub text: String,
    pub style: Style,
    pub original_length: usize,
}

pub fn validate(request: SummarizeRequest) -> Result<ValidatedRequest, SummarizeError> {
    let text = match request.text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(SummarizeError::MissingText),
    };

    let original_length = text_len(&text);
    if original_length < MIN_TEXT_CHARS {
        return Err(SummarizeError::TooShort);
    }
    if original_length > MAX_TEXT_CHARS {
        return Err(SummarizeError::TooLong);
    }

    let style = match request.style {
        None => Style::default(),
        Some(None) => return Err(SummarizeError::InvalidStyle("null".to_string())),
        Some(Some(s)) => s
            .parse::<Style>()
            .map_err(|_| SummarizeError::InvalidStyle(s))?,
    };

    Ok(ValidatedRequest {
        text,
        style,
        original_length,
    })
}

/// Validates `request`, sends the styled prompt to `provider`, and shapes the result.
pub async fn summarize(
    provider: &dyn SummaryProvider,
    request: SummarizeRequest,
) -> Result<SummarizeResponse, SummarizeError> {
    let req = validate(request)?;
    let prompt = req.style.prompt(&req.text);

    let summary = provider.generate(&prompt).await.map_err(|e| {
        error!(
            provider = provider.name(),
            model = provider.model(),
            error = %e,
            "summarization failed"
        );
        e
    })?;

    let response = SummarizeResponse::new(summary, req.style, req.original_length);
    info!(
        style = %req.style,
        original_length = response.original_length,
        summary_length = response.summary_length,
        "summary generated"
    );
    Ok(response)
}
