//! Error types for the yr.no forecast client

use thiserror::Error;

/// Main error type for the forecast client
#[derive(Error, Debug)]
pub enum YrError {
    /// Lookup archive could not be downloaded or written to its cache file
    #[error("Failed to fetch lookup archive {url}: {message}")]
    ArchiveFetch { url: String, message: String },

    /// Lookup archive is present but cannot be read
    #[error("Unreadable lookup archive: {message}")]
    Archive { message: String },

    /// Place name is absent from every candidate table
    #[error("Location not found: {location} (searched {searched})")]
    LocationNotFound { location: String, searched: String },

    /// Place name is present in more than one table
    #[error("Multiple matches for {location} in {tables:?}")]
    AmbiguousLocation {
        location: String,
        tables: Vec<String>,
    },

    /// Matched row does not hold a `lat=..&lon=..&altitude=..` descriptor
    #[error("Malformed coordinate for {location}: expected lat=<f>&lon=<f>&altitude=<f>, got {descriptor:?}")]
    MalformedCoordinate {
        location: String,
        descriptor: String,
    },

    /// Forecast endpoint answered with something other than 200
    #[error("API error: {url} answered with status {status}")]
    Api { url: String, status: u16 },

    /// Transport failure other than a timeout
    #[error("Network error while requesting {url}: {message}")]
    Network { url: String, message: String },

    /// Request did not complete within the configured timeout
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// Forecast payload cannot be read into forecast entries
    #[error("Invalid forecast payload: {message}")]
    Payload { message: String },

    /// Configuration or language dictionary errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Coordinate store errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl YrError {
    pub fn archive_fetch<U: Into<String>, S: Into<String>>(url: U, message: S) -> Self {
        Self::ArchiveFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn archive<S: Into<String>>(message: S) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    pub fn payload<S: Into<String>>(message: S) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            YrError::ArchiveFetch { .. } | YrError::Network { .. } | YrError::Timeout { .. } => {
                "Unable to reach yr.no. Please check your internet connection.".to_string()
            }
            YrError::Archive { .. } => {
                "The cached place name archive is damaged. Remove it to download it again."
                    .to_string()
            }
            YrError::LocationNotFound { location, .. } => {
                format!("Unknown location: {location}")
            }
            YrError::AmbiguousLocation { location, .. } => {
                format!("Location {location} is ambiguous, please be more specific")
            }
            YrError::MalformedCoordinate { location, .. } => {
                format!("yr.no returned unusable coordinates for {location}")
            }
            YrError::Api { status, .. } => {
                format!("The forecast service rejected the request (HTTP {status})")
            }
            YrError::Payload { .. } => {
                "The forecast service returned data that could not be read.".to_string()
            }
            YrError::Config { message } => format!("Configuration error: {message}"),
            YrError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            YrError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<fjall::Error> for YrError {
    fn from(err: fjall::Error) -> Self {
        YrError::cache(err.to_string())
    }
}

impl From<postcard::Error> for YrError {
    fn from(err: postcard::Error) -> Self {
        YrError::cache(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = YrError::config("missing dictionary");
        assert!(matches!(config_err, YrError::Config { .. }));

        let archive_err = YrError::archive_fetch("https://example.test/a.zip", "status 404");
        assert!(matches!(archive_err, YrError::ArchiveFetch { .. }));
        assert!(archive_err.to_string().contains("status 404"));
    }

    #[test]
    fn test_user_messages() {
        let err = YrError::LocationNotFound {
            location: "norge/nowhere".into(),
            searched: "norge.csv".into(),
        };
        assert!(err.user_message().contains("norge/nowhere"));

        let err = YrError::Api {
            url: "https://api.met.no".into(),
            status: 403,
        };
        assert!(err.user_message().contains("403"));

        let err = YrError::Timeout {
            url: "https://api.met.no".into(),
            seconds: 10,
        };
        assert!(err.user_message().contains("internet connection"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: YrError = io_err.into();
        assert!(matches!(err, YrError::Io { .. }));
    }
}
