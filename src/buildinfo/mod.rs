//! Build metadata captured at compile time by `build.rs`.

use serde::Serialize;

/// Immutable description of the running binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub git_commit: &'static str,
    /// Seconds since the Unix epoch.
    pub build_timestamp: &'static str,
    pub rustc: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
}

/// Build information of this binary.
pub const BUILD_INFO: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git_commit: env!("CHAT_SERVICE_GIT_SHA"),
    build_timestamp: env!("CHAT_SERVICE_BUILD_EPOCH"),
    rustc: env!("CHAT_SERVICE_RUSTC"),
    target: env!("CHAT_SERVICE_TARGET"),
    profile: env!("CHAT_SERVICE_PROFILE"),
};
