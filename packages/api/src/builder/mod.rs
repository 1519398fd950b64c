//! Pulsewire builder API
//!
//! [`Pulsewire`] is the entry point; `ingestion()` and `research(query)`
//! return builders that validate their parameters before anything is sent.

pub mod core;
pub mod ingestion;
pub mod research;

pub use self::core::{Pulsewire, endpoints};
pub use ingestion::IngestionBuilder;
pub use research::ResearchBuilder;
