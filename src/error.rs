//! VCloud provider error types

/// VCloud provider error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum VCloudError {
    // Transport/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid identifier for node '{0}': provider ID and node name are empty")]
    InvalidIdentifier(String),

    /// Typed absence signal for the node polling contract. Callers treat this
    /// as authoritative removal, not as a retryable failure.
    #[error("instance not found")]
    InstanceNotFound,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Lookup failure for a single instance, carrying the identifier.
    #[error("failed to get instance {id}: {source}")]
    Instance {
        id: String,
        #[source]
        source: Box<VCloudError>,
    },
}

impl VCloudError {
    /// Whether the error is worth retrying at a higher level.
    ///
    /// Transport failures and 5xx responses are transient; everything else
    /// (4xx, decode failures, bad identifiers, config) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            VCloudError::Http(_) => true,
            VCloudError::Api { status, .. } => *status >= 500,
            VCloudError::Instance { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Whether this is the typed "instance not found" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VCloudError::InstanceNotFound)
    }

    /// Wrap an error with the instance identifier it relates to.
    pub(crate) fn for_instance(self, id: &str) -> Self {
        VCloudError::Instance {
            id: id.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<reqwest::Error> for VCloudError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VCloudError::Decode(err.to_string())
        } else if err.is_builder() {
            VCloudError::Configuration(err.to_string())
        } else {
            VCloudError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VCloudError {
    fn from(err: serde_json::Error) -> Self {
        VCloudError::Decode(err.to_string())
    }
}

/// Result type alias for VCloud provider operations
pub type Result<T> = std::result::Result<T, VCloudError>;
