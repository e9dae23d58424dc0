//! In-memory repository implementations for testing and development.

mod stats;

pub use stats::InMemoryStatsRepository;
