//! Core extraction logic

pub mod chunker;
pub mod extract;
pub mod normalizer;
pub mod resolver;
pub mod state;
