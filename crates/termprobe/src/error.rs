//! Error taxonomy for the harness.
//!
//! Every variant carries a stable code (see [`HarnessError::code`]) that is
//! also exposed as the miette diagnostic code. Variants fall in two groups:
//!
//! - **fatal**: the backend or sandbox cannot be used, or a scenario does not
//!   fit the backend. The runner aborts the whole run after cleanup.
//! - **case-local**: the current case is recorded as failed and the run goes
//!   on (unless fail-fast is enabled).

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    /// A control chord or key notation could not be parsed.
    #[error("invalid key definition '{definition}': {reason}")]
    #[diagnostic(
        code(E_INVALID_KEY),
        help("control chords take a single lowercase letter, e.g. <ctrl+c>")
    )]
    InvalidKeyDefinition { definition: String, reason: String },

    /// The temporary sandbox root could not be allocated.
    #[error("failed to create sandbox root")]
    #[diagnostic(code(E_SANDBOX_INIT))]
    SandboxInit {
        #[source]
        source: std::io::Error,
    },

    /// The subject could not be spawned or its session never came up.
    #[error("failed to launch subject: {reason}")]
    #[diagnostic(code(E_LAUNCH))]
    Launch { reason: String },

    /// The automation capability is older than the supported floor.
    #[error("{capability} {detected} is too old, {required} or newer is required")]
    #[diagnostic(
        code(E_CAPABILITY_VERSION),
        help("upgrade the backend tool or select another backend with --backend")
    )]
    CapabilityVersion {
        capability: String,
        detected: String,
        required: String,
    },

    /// The key has no ASCII code and the backend cannot send it by name.
    #[error("key {key} cannot be sent by the {backend} backend")]
    #[diagnostic(
        code(E_UNSUPPORTED_KEY),
        help("use a key with an ASCII code or run the scenario on another backend")
    )]
    UnsupportedKey { key: String, backend: &'static str },

    /// The subject was expected to be running right after start.
    #[error("subject is not running after start ({runtime_info})")]
    #[diagnostic(code(E_SUBJECT_NOT_RUNNING))]
    SubjectNotRunning { runtime_info: String },

    /// Filesystem or process I/O failed while preparing or driving a case.
    #[error("{context}")]
    #[diagnostic(code(E_IO))]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A case path is absolute or climbs out of the sandbox with `..`.
    #[error("path {path} is outside the sandbox")]
    #[diagnostic(
        code(E_SANDBOX_PATH),
        help("case paths must be relative and must not contain `..`")
    )]
    PathOutsideSandbox { path: PathBuf },

    /// A scenario file could not be read or parsed.
    #[error("invalid scenario {path}: {message}")]
    #[diagnostic(code(E_SCENARIO))]
    Scenario { path: PathBuf, message: String },

    /// A case name passed to the selection list is not registered.
    #[error("unknown test case '{name}'")]
    #[diagnostic(code(E_UNKNOWN_CASE), help("run `termprobe list` to see registered cases"))]
    UnknownCase { name: String },

    /// Configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(E_CONFIG))]
    Config { message: String },
}

impl HarnessError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn launch(reason: impl Into<String>) -> Self {
        Self::Launch {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKeyDefinition { .. } => "E_INVALID_KEY",
            Self::SandboxInit { .. } => "E_SANDBOX_INIT",
            Self::Launch { .. } => "E_LAUNCH",
            Self::CapabilityVersion { .. } => "E_CAPABILITY_VERSION",
            Self::UnsupportedKey { .. } => "E_UNSUPPORTED_KEY",
            Self::SubjectNotRunning { .. } => "E_SUBJECT_NOT_RUNNING",
            Self::Io { .. } => "E_IO",
            Self::PathOutsideSandbox { .. } => "E_SANDBOX_PATH",
            Self::Scenario { .. } => "E_SCENARIO",
            Self::UnknownCase { .. } => "E_UNKNOWN_CASE",
            Self::Config { .. } => "E_CONFIG",
        }
    }

    /// Whether the error makes the backend or environment unusable for the
    /// remaining cases of a run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::SubjectNotRunning { .. } | Self::Io { .. } | Self::PathOutsideSandbox { .. }
        )
    }
}
