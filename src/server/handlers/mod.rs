//! Request handlers.

mod events;
mod status;
mod stream;

pub use events::{ingest_handler, query_handler};
pub use status::{metrics_handler, status_handler};
pub use stream::stream_handler;
