//! Shared domain types for spoticheck.
//!
//! Everything here is free of I/O: the listening record, the gateway wire
//! envelope and payload shapes, the watched and presence sets, the sink
//! contract, and the pure reporting transforms over stored records.

pub mod errors;
pub mod presence;
pub mod protocol;
pub mod record;
pub mod report;
pub mod sink;
pub mod watched;

pub use errors::{GatewayError, RecordError, SinkError};
pub use presence::ListenerPresence;
pub use record::{Listener, ListeningRecord, Track};
pub use sink::{MemorySink, Sink};
pub use watched::WatchedSet;
