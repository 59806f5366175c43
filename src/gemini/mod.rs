pub mod client;


pub use client::{Completion, GeminiClient, GeminiError, UsageMetadata};
