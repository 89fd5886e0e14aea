//! In-process data-access client for tests/dev.

pub mod in_memory;

pub use in_memory::InMemoryDataClient;
