//! Translation building blocks shared by the writers: bound parameters, the join
//! tree, predicate translation and fetch planning.

pub mod errors;
pub mod fetch_plan;
pub mod join_tree;
pub mod params;
pub mod where_clause;

pub use errors::TranslationError;
pub use fetch_plan::{FetchPlan, FetchPlanner, FetchSegment, ProjectedColumn};
pub use join_tree::{JoinNode, JoinTree, JoinType};
pub use params::Parameters;
pub use where_clause::{push_negation, WhereClauseWriter};
