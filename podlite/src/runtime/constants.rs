//! Defaults and fixed names used by the runtime.

/// Runtime identity reported by `Version`.
pub mod version {
    /// CRI API version of the `Version` response.
    pub const KUBELET_API_VERSION: &str = "0.1.0";
    pub const RUNTIME_NAME: &str = "podlite";
    pub const RUNTIME_API_VERSION: &str = "v1";
    pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Default locations and images.
pub mod defaults {
    pub const RUNTIME_ROOT: &str = "/var/lib/podlite";
    pub const IMAGE_ROOT: &str = "/var/lib/podlite/images";
    pub const SOCKET_PATH: &str = "/var/run/podlite.sock";
    pub const SANDBOX_IMAGE: &str = "registry.k8s.io/pause:3.9";
}

/// External tool binaries, resolved through `PATH` unless overridden.
pub mod tools {
    pub const RUNC: &str = "runc";
    pub const SKOPEO: &str = "skopeo";
    pub const UMOCI: &str = "umoci";
}

/// File names inside a bundle directory.
pub mod filenames {
    /// OCI runtime config.
    pub const CONFIG_JSON: &str = "config.json";
    /// Log file handed to the low-level runtime via `--log`.
    pub const RUNTIME_LOG: &str = "runtime.log";
}

/// Runtime status condition types.
pub mod conditions {
    pub const RUNTIME_READY: &str = "RuntimeReady";
    pub const NETWORK_READY: &str = "NetworkReady";
}
