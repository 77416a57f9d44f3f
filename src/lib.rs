pub mod aggregate;
pub mod backend;
pub mod category;
pub mod classification;
pub mod classify;
pub mod config;
pub mod error;
pub mod ledger;
pub mod output;
pub mod parser;
pub mod prompt;
pub mod reviews;
pub mod sentiment;
pub mod stats;
pub mod tabular;
