//! Meteor Receiver
//!
//! Ingestion endpoint for a distributed meteor-camera network. Remote
//! cameras push detection events (JSON), raw FF capture binaries, and
//! nightly timelapse stacks over HTTP; the receiver organizes the files
//! on disk by observing night (12:00 UTC to 12:00 UTC the next day) so
//! downstream analysis finds a whole session in one directory.
//!
//! ## Architecture
//!
//! ```text
//! POST /event ──▶ event parser ──▶ structured log record
//!
//! POST /ff    ──▶ FileIngestor ──▶ CapturedFiles/{night}/{file} ──▶ detect trigger
//!
//! POST /stack ──▶ FileIngestor ──▶ Stacks/{night}/{file}
//! ```
//!
//! Night directories are named `YYYYMMDD_120000_000000` after the instant
//! the night started. Directory creation is idempotent under concurrent
//! uploads, and payloads are written atomically (temp file + rename).

pub mod config;
pub mod event;
pub mod ingest;
pub mod night;
pub mod server;

pub use config::ReceiverConfig;
pub use event::{record, parse_event, DetectionEvent, IvsCounters, MeteorCandidate};
pub use ingest::{
    filename_is_safe, DetectTrigger, FileIngestor, IngestError, IngestedFile, NightNotifier,
    NoopNotifier,
};
pub use night::night_dir_name;
pub use server::{create_router, AppState};
