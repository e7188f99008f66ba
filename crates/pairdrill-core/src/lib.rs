//! pairdrill-core: deck loading, question generation, and the mistake book.
//!
//! This crate holds everything the `pairdrill` binary needs apart from
//! terminal I/O: reading A-B pairs from tabular files, building quiz
//! questions, and persisting weighted mistakes between sessions.

pub mod config;
pub mod error;
pub mod loader;
pub mod mistakes;
pub mod model;
pub mod normalize;
mod ooxml;
pub mod quiz;
pub mod session;
