//! Types shared between the podlite runtime and its clients.
//!
//! - [`errors`]: the error taxonomy used across the runtime
//! - [`cri`]: generated Container Runtime Interface (v1) messages and services

pub mod errors;

/// Generated CRI v1 protocol (`runtime.v1`).
pub mod cri {
    #![allow(missing_docs)]
    #![allow(clippy::doc_markdown)]
    #![allow(clippy::large_enum_variant)]
    tonic::include_proto!("runtime.v1");
}

pub use errors::{PodliteError, PodliteResult};
