//! Multiple-choice quiz runner.
//!
//! Quiz content is loaded from untrusted JSON by [`quiz::loader::QuizLoader`],
//! which sanitizes and validates every question, and then played through a
//! [`quiz::session::Session`] over any [`quiz::channel::IoChannel`].

pub mod config;
pub mod quiz;
