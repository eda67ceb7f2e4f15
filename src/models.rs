//! Wire types for the relay's JSON API.
//!
//! Field names follow the browser client's camelCase convention.

use serde::{Deserialize, Deserializer, Serialize};

use crate::style::Style;

/// Body of `POST /api/summarize`.
///
/// Both fields are optional at the wire level so that validation can
/// report a specific message instead of a generic deserialization error.
///
/// `style` keeps an omitted field (`None`) apart from an explicit `null`
/// (`Some(None)`): only the former falls back to the default style.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub style: Option<Option<String>>,
}

/// Marks a field as present, whatever its value (including `null`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeResponse {
    pub summary: String,
    pub style: Style,
    pub original_length: usize,
    pub summary_length: usize,
    pub reduction_percent: i64,
}

impl SummarizeResponse {
    pub fn new(summary: String, style: Style, original_length: usize) -> Self {
        let summary_length = text_len(&summary);
        Self {
            reduction_percent: reduction_percent(original_length, summary_length),
            summary,
            style,
            original_length,
            summary_length,
        }
    }
}

/// Body returned by `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub text: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// Text length as counted everywhere in the API: UTF-16 code units, the
/// unit browser clients measure `String.length` in.
///
/// Characters outside the Basic Multilingual Plane (most emoji) count as two.
pub fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// `1 - summary/original` as a percentage, rounded half up.
///
/// Negative when the summary is longer than the original. Zero for an
/// empty original.
pub fn reduction_percent(original_length: usize, summary_length: usize) -> i64 {
    if original_length == 0 {
        return 0;
    }
    let ratio = 1.0 - summary_length as f64 / original_length as f64;
    (ratio * 100.0 + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_for_quarter_length_summary() {
        assert_eq!(reduction_percent(1000, 250), 75);
    }

    #[test]
    fn reduction_rounds_half_up() {
        // 1 - 1/8 = 87.5%
        assert_eq!(reduction_percent(8, 1), 88);
        // 1 - 2/3 = 33.33%
        assert_eq!(reduction_percent(3, 2), 33);
    }

    #[test]
    fn reduction_edge_cases() {
        assert_eq!(reduction_percent(0, 10), 0);
        assert_eq!(reduction_percent(100, 100), 0);
        assert_eq!(reduction_percent(100, 150), -50);
    }

    #[test]
    fn response_uses_camel_case() {
        let resp = SummarizeResponse::new("Short.".to_string(), Style::Brief, 60);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["originalLength"], 60);
        assert_eq!(json["summaryLength"], 6);
        assert_eq!(json["reductionPercent"], 90);
        assert_eq!(json["style"], "brief");
    }

    #[test]
    fn text_len_counts_utf16_units_not_bytes() {
        assert_eq!(text_len("héllo"), 5);
        assert_eq!(text_len("•"), 1);
        assert_eq!(text_len("😀"), 2);
    }

    #[test]
    fn request_fields_are_optional() {
        let req: SummarizeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.text.is_none());
        assert!(req.style.is_none());
    }

    #[test]
    fn null_style_is_distinct_from_missing_style() {
        let req: SummarizeRequest = serde_json::from_str(r#"{"style":null}"#).unwrap();
        assert_eq!(req.style, Some(None));
        let req: SummarizeRequest = serde_json::from_str(r#"{"style":"bullets"}"#).unwrap();
        assert_eq!(req.style, Some(Some("bullets".to_string())));
    }
}
