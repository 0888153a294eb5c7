//! Sentiment classification and topic clustering for short text reviews.

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod nlp;
pub mod pipeline;
pub mod projection;
pub mod text;
pub mod topics;
