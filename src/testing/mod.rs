//! In-memory reference evaluator for checking translation semantics without a
//! database.

pub mod in_memory;

pub use in_memory::InMemoryDatabase;
