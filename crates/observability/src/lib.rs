//! plauder-observability – Structured Logging
//!
//! Der Kern meldet Ereignisse ueber `tracing`; dieses Crate richtet den
//! Subscriber ein. Korrektheit haengt nie am Logging.

pub mod logging;

pub use logging::logging_initialisieren;
