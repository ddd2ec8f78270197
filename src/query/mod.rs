// Submodules for separation of concerns
pub mod command;
mod builder;
mod condition;
mod constraint;
mod cursor;
mod parse;
mod types;

// Public API re-exports
pub use builder::Query;
pub use command::CommandKind;
pub use condition::{AND_KEY, Condition, OR_KEY};
pub use constraint::{CmpOp, Constraint};
pub use cursor::{ScanIterator, ScanPage};
pub use parse::{parse_where_json, where_from_json};
pub use types::{ConstraintMap, Order, QueryParams, Term, WhereArg};
