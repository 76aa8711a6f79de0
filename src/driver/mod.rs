//! Driver and connection entry points.

mod connection;
mod entry;

pub use connection::Connection;
pub use entry::Driver;
