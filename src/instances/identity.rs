//! Derive the instance identifier for a node.

use tracing::debug;

use crate::types::Node;

const SCHEME_SEPARATOR: &str = "://";

/// Identifier used as cache key and API path segment for `node`.
///
/// Fallback order: provider ID with its `scheme://` prefix stripped, the
/// provider ID verbatim (no scheme, or more than one separator), then the
/// node name. Never fails; the result is empty only if every input is.
pub fn extract_id(node: &Node) -> String {
    if node.provider_id.is_empty() {
        debug!(node = %node.name, "no provider ID set, falling back to node name");
        return node.name.clone();
    }

    match node.provider_id.split_once(SCHEME_SEPARATOR) {
        Some((_, id)) if !id.contains(SCHEME_SEPARATOR) => {
            debug!(node = %node.name, provider_id = %node.provider_id, id, "stripped provider scheme");
            id.to_string()
        }
        _ => node.provider_id.clone(),
    }
}
