//! podlite: a minimal Container Runtime Interface (CRI) server.
//!
//! The runtime keeps sandbox, container and image records in memory and
//! delegates all real work to external OCI tools: an image copy tool
//! (skopeo), an unpack tool (umoci) and a low-level runtime (runc).
//!
//! ```text
//! kubelet ──gRPC/unix──▶ server ──▶ PodliteRuntime ──▶ workflow (pipeline)
//!                                        │                 ├─ images  → skopeo / umoci
//!                                        │                 ├─ bundle  → config.json
//!                                        │                 └─ engine  → runc
//!                                        └─ registry (in-memory records)
//! ```

pub mod bundle;
pub mod engine;
pub mod images;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod util;
mod workflow;

pub use podlite_shared::{PodliteError, PodliteResult};
pub use runtime::{PodliteOptions, PodliteRuntime};
