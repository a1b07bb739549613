//! Observability
//!
//! Structured logging through `tracing`. Lifecycle events carry a stable
//! `event` field taken from [`Event`]:
//!
//! ```ignore
//! tracing::info!(event = Event::RecordCreated.as_str(), blob = %name, "record stored");
//! ```

mod events;
mod logging;

pub use events::Event;
pub use logging::{init_logging, LogFormat};
