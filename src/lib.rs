pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod output;
pub mod record;
pub mod request;
pub mod search;
