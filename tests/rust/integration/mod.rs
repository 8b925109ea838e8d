//! Integration tests - translation checked against the in-memory reference evaluator
//!
//! These tests verify that generated statements and the evaluator agree on query
//! semantics, without requiring a database.

#[path = "../common/blog_schema.rs"]
#[allow(dead_code)]
mod blog_schema;

mod blog_data;

mod fetch_assembly_tests;
mod in_memory_semantics_tests;
mod modification_tests;
