//! Unit tests - translation output checked as text, no database required

#[path = "../common/blog_schema.rs"]
#[allow(dead_code)]
mod blog_schema;

mod mapping_config_tests;
mod predicate_sql_tests;
mod writer_sql_tests;
