//! Build identity for logs and `vcloudctl version`.
//!
//! Git fields come from `build.rs`; outside a checkout they read "unknown".

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA at build time.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

const SHORT_SHA_LEN: usize = 7;

/// Whether the working tree was dirty at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

/// Abbreviated commit SHA.
pub fn short_sha() -> &'static str {
    GIT_SHA.get(..SHORT_SHA_LEN).unwrap_or(GIT_SHA)
}

/// Version as printed by `vcloudctl version`.
///
/// Format is `{version}+{branch}.{sha}`, plus `.dirty` for a modified tree,
/// e.g. `vcloudctl 0.1.0+main.3f9c2ab`.
pub fn version_string() -> String {
    let dirty_suffix = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{GIT_BRANCH}.{}{dirty_suffix}", short_sha())
}
