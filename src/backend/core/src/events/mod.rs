//! Event model
//!
//! - **`event`**: event keys, validated inputs (`NewEvent`, `EventPatch`), the stored
//!   `EventDocument` and the rendered `EventRecord`.
//! - **`point`**: the GeoJSON `GeoPoint` location type.

pub mod event;
pub mod point;

pub use event::*;
pub use point::*;
