//! Summarization styles and their prompt templates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the model should shape its summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Two to three sentences.
    #[default]
    Brief,
    /// A comprehensive narrative covering all key points.
    Detailed,
    /// A list of main ideas prefixed with `•`.
    Bullets,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Brief, Style::Detailed, Style::Bullets];

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Brief => "brief",
            Style::Detailed => "detailed",
            Style::Bullets => "bullets",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Style::Brief => {
                "Provide a brief, concise summary of the following text in 2-3 sentences. \
                 Do not use asterisks or special formatting characters:"
            }
            Style::Detailed => {
                "Provide a comprehensive and detailed summary of the following text, covering \
                 all key points and important details. Write in plain text without using \
                 asterisks, bold formatting, or any special characters:"
            }
            Style::Bullets => {
                "Summarize the following text as clear, concise bullet points. Use bullet \
                 points (•) to list the main ideas. Do not use asterisks or any markdown \
                 formatting:"
            }
        }
    }

    /// Wraps `text` in this style's instruction template.
    pub fn prompt(self, text: &str) -> String {
        format!("{}\n\n{}", self.instruction(), text)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style: '{0}'")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brief" => Ok(Style::Brief),
            "detailed" => Ok(Style::Detailed),
            "bullets" => Ok(Style::Bullets),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}
