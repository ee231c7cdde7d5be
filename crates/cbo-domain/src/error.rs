//! Error handling types

use crate::value_objects::BootPhase;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CBO back office core
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (simple form)
    #[error("I/O error: {source}")]
    IoSimple {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// I/O operation error (with context)
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Missing or invalid settings, surfaced before any subsystem starts
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A service could not be resolved or constructed
    #[error("Resolution error for {service}: {message}")]
    Resolution {
        /// Display name of the service key being resolved
        service: String,
        /// What went wrong
        message: String,
    },

    /// A register-once service (collection builder) was registered twice
    #[error("Duplicate registration for {service}: collection builders must be registered exactly once")]
    DuplicateRegistration {
        /// Display name of the service key
        service: String,
    },

    /// Registration attempted after the container was frozen
    #[error("Cannot register {service}: the container is frozen")]
    ContainerFrozen {
        /// Display name of the service key
        service: String,
    },

    /// MainDom could not be acquired within the configured timeout
    #[error("Timed out after {timeout_ms}ms acquiring MainDom lock '{lock}'")]
    MainDomAcquisitionTimeout {
        /// Lock name
        lock: String,
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// The current MainDom holder did not release within its grace period
    #[error("MainDom lock '{lock}' was not released within the {grace_ms}ms grace period")]
    MainDomReleaseTimeout {
        /// Lock name
        lock: String,
        /// Grace period that elapsed, in milliseconds
        grace_ms: u64,
    },

    /// Type discovery failed
    #[error("Type discovery error: {message}")]
    TypeDiscovery {
        /// Description of the discovery failure
        message: String,
    },

    /// A configured provider is not linked into this build or cannot run here
    #[error("Provider '{provider}' is not available: {reason}")]
    ProviderUnavailable {
        /// Provider name
        provider: String,
        /// Why the provider is absent
        reason: String,
    },

    /// A fatal failure during a boot phase
    #[error("Boot failed during {phase} phase: {source}")]
    Boot {
        /// Phase in which boot failed
        phase: BootPhase,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// Infrastructure operation error
    #[error("Infrastructure error: {message}")]
    Infrastructure {
        /// Description of the infrastructure error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Basic error creation methods
impl Error {
    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an infrastructure error
    pub fn infrastructure<S: Into<String>>(message: S) -> Self {
        Self::Infrastructure {
            message: message.into(),
            source: None,
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Composition error creation methods
impl Error {
    /// Create a resolution error
    pub fn resolution<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Resolution {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate registration error
    pub fn duplicate_registration<S: Into<String>>(service: S) -> Self {
        Self::DuplicateRegistration {
            service: service.into(),
        }
    }

    /// Create a frozen container error
    pub fn container_frozen<S: Into<String>>(service: S) -> Self {
        Self::ContainerFrozen {
            service: service.into(),
        }
    }

    /// Create a type discovery error
    pub fn type_discovery<S: Into<String>>(message: S) -> Self {
        Self::TypeDiscovery {
            message: message.into(),
        }
    }

    /// Create a provider unavailable error
    pub fn provider_unavailable<P: Into<String>, R: Into<String>>(provider: P, reason: R) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

// Runtime error creation methods
impl Error {
    /// Wrap an error as a boot failure of the given phase
    ///
    /// Errors that are already boot failures keep their original phase.
    pub fn boot(phase: BootPhase, source: Error) -> Self {
        match source {
            boot @ Self::Boot { .. } => boot,
            other => Self::Boot {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Create a MainDom acquisition timeout error
    pub fn main_dom_acquisition_timeout<S: Into<String>>(lock: S, timeout_ms: u64) -> Self {
        Self::MainDomAcquisitionTimeout {
            lock: lock.into(),
            timeout_ms,
        }
    }

    /// Create a MainDom release timeout error
    pub fn main_dom_release_timeout<S: Into<String>>(lock: S, grace_ms: u64) -> Self {
        Self::MainDomReleaseTimeout {
            lock: lock.into(),
            grace_ms,
        }
    }

    /// Whether this error must halt startup
    ///
    /// MainDom timeouts degrade the process instead of stopping it.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MainDomAcquisitionTimeout { .. } | Self::MainDomReleaseTimeout { .. }
        )
    }

    /// Phase in which boot failed, if this is a boot failure
    pub fn boot_phase(&self) -> Option<BootPhase> {
        match self {
            Self::Boot { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Internal {
            message: s.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Internal { message: s }
    }
}
