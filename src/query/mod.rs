//! Statement execution and result handling.
//!
//! - `parameter` - typed positional parameter values
//! - `prepared` - prepared statements: binding, execution and lifecycle
//! - `results` - forward-only cursors with typed, coercing getters

pub mod parameter;
pub mod prepared;
pub mod results;

pub use parameter::{Parameter, SqlArray};
pub use prepared::PreparedStatement;
pub use results::{Column, ResultCursor};
