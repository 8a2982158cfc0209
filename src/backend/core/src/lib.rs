#![allow(clippy::result_large_err)]
//! # Cephas Core
//!
//! Records and queries space-time events: things that happened at a point on
//! the globe, beginning (and optionally ending) at a given time.
//!
//! ## Architecture
//!
//! - **Validation**: Turns untrusted JSON into a typed event or a per-field error map
//! - **Events**: Event key, point, creation payload, partial update and stored document
//! - **Store**: Soft-delete visibility plus time, proximity and combined queries
//!   over a pluggable collection (in-memory, or MongoDB with the `mongodb` feature)
//! - **API**: Axum routes under `/cephas/api/v1.0`
//! - **Telemetry**: Structured logging and Prometheus metrics

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod geo;
pub mod telemetry;
pub mod validation;

pub use error::{CephasError, ErrorCode, ErrorDetails, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{build_router, ApiResponse, AppState};
    pub use crate::config::{Config, StorageBackend, StorageConfig};
    pub use crate::db::{
        CollectionError, EventCollection, EventStore, FieldUpdate, Filter, MemoryCollection,
        NearPoint, StoreError, TimeRange,
    };
    pub use crate::error::{CephasError, ErrorCode, ErrorDetails, ErrorSeverity, Result};
    pub use crate::events::{
        EventDocument, EventKey, EventPatch, EventRecord, GeoPoint, NewEvent,
    };
    pub use crate::validation::{
        validate_for_create, validate_for_update, ValidationErrorKind, ValidationErrors,
        ValidationResult,
    };
}
