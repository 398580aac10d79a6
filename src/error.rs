use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GitHub rejected the credentials (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PulseError {
    /// Whether this error means no API call in the cycle can succeed.
    ///
    /// Rejected credentials and transport failures are not specific to one
    /// organization or repository, so a fetch cycle whose first call fails this
    /// way is aborted instead of being reported as a series of skipped units.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Unauthorized { .. } | Self::Config(_) => true,
            Self::Network(e) => e.is_connect() || e.is_timeout() || e.is_builder(),
            Self::Api { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_fatal() {
        let err = PulseError::Unauthorized {
            status: 401,
            message: "Bad credentials".to_string(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_api_error_is_not_fatal() {
        let err = PulseError::Api {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "GitHub API error (status 404): Not Found"
        );
    }
}
