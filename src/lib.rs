//! AI Bathtub: a small web demo that charges every language-model exchange
//! against a session-scoped "bathtub" of tokens and shows the approximate
//! CO2 and water cost of the conversation.

pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod impact;
pub mod session;
pub mod state;
pub mod web;
