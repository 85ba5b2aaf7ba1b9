//! Process initialization.
//!
//! Currently this is logger setup; the service's other resources (store,
//! registry, resolver, pipeline) are built by the run entry point.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
