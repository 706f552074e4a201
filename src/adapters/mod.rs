//! External system adapters

pub mod output;
pub mod soap;
