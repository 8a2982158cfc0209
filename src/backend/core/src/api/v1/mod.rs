//! V1 event API, mounted under `/cephas/api/v1.0`.

pub mod routes;

pub use routes::{paths, v1_router, V1_PREFIX};
