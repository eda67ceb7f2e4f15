//! # Summa Relay
//!
//! A stateless HTTP relay that turns text or uploaded documents into
//! summaries using a remote large-language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  /api/upload   ┌──────────────┐
//! │ Browser  │───────────────▶│   extract    │  txt / pdf → text
//! │ client   │                └──────────────┘
//! │          │  /api/summarize ┌──────────────┐   ┌──────────┐
//! │          │───────────────▶│  summarize   │──▶│ provider │──▶ Gemini
//! └──────────┘                └──────────────┘   └──────────┘
//! ```
//!
//! Nothing is stored between requests.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`models`] | JSON request/response types and length statistics |
//! | [`style`] | Summary styles and prompt templates |
//! | [`summarize`] | Input validation and the summarize operation |
//! | [`extract`] | Upload validation and text extraction |
//! | [`provider`] | Remote model abstraction and the Gemini client |
//! | [`server`] | Axum HTTP server |

pub mod config;
pub mod extract;
pub mod models;
pub mod provider;
pub mod server;
pub mod style;
pub mod summarize;
