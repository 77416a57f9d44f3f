//! Text-generation backends.
//!
//! [`TextBackend`] is the seam the classifier talks to. [`OpenAiBackend`]
//! implements it over any [`HttpClient`]; [`BasicClient`] is the plain
//! `reqwest` client and [`ApiKey`] decorates a client with credentials.

mod auth;
mod basic;
mod client;
mod openai;

pub use auth::ApiKey;
pub use basic::BasicClient;
pub use client::{HttpClient, TextBackend};
pub use openai::OpenAiBackend;
