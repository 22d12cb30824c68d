// varwatch - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; all errors preserve the causal chain
// for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all varwatch operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum VarwatchError {
    /// Workspace discovery or artifact monitoring failed.
    Discovery(DiscoveryError),

    /// Dictionary extraction failed.
    Extract(ExtractError),

    /// Table export failed.
    Export(ExportError),

    /// Variable-to-source linking failed.
    Link(LinkError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for VarwatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Extract(e) => write!(f, "Extraction error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Link(e) => write!(f, "Link error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for VarwatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            Self::Extract(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Link(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to workspace discovery and artifact monitoring.
///
/// Ambiguous-workspace and not-yet-initialised conditions are *not* errors:
/// discovery reports them through `workspace::Discovery` and the monitor
/// keeps retrying. Only unrecoverable conditions surface here.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The temp root being scanned does not exist or cannot be listed.
    RootNotFound { path: PathBuf, source: io::Error },

    /// The monitored artifact vanished from disk mid-run. The analyser's run
    /// was aborted or cleaned up underneath the monitor; unrecoverable.
    ArtifactVanished { path: PathBuf },

    /// I/O error reading the artifact.
    ArtifactRead { path: PathBuf, source: io::Error },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path, source } => {
                write!(f, "Cannot list temp root '{}': {source}", path.display())
            }
            Self::ArtifactVanished { path } => {
                write!(
                    f,
                    "Log artifact '{}' disappeared while monitoring; the analyser run \
                     was aborted or cleaned up",
                    path.display()
                )
            }
            Self::ArtifactRead { path, source } => {
                write!(
                    f,
                    "Cannot read log artifact '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RootNotFound { source, .. } => Some(source),
            Self::ArtifactRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for VarwatchError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// Errors related to dictionary extraction.
///
/// Malformed declaration lines are deliberately NOT errors -- they are
/// silently skipped and counted in `ExtractStats`. The only hard failure is
/// being invoked with no input at all, which is a caller contract violation:
/// extraction must never run before the readiness markers have been seen.
#[derive(Debug)]
pub enum ExtractError {
    /// Extraction was invoked with an empty line sequence.
    EmptyInput,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => {
                write!(f, "Extraction invoked with no log lines to parse")
            }
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<ExtractError> for VarwatchError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to writing the variable table.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for VarwatchError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

/// Errors related to the variable-to-source linking tool.
#[derive(Debug)]
pub enum LinkError {
    /// The C source file does not exist or is not a regular file.
    SourceNotFound { path: PathBuf },

    /// The C source file exceeds the maximum accepted size.
    SourceTooLarge { path: PathBuf, size: u64, max: u64 },

    /// The variable table CSV does not exist.
    TableNotFound { path: PathBuf },

    /// The variable table CSV could not be parsed.
    TableParse { path: PathBuf, source: csv::Error },

    /// I/O error reading an input or writing the linked output.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound { path } => {
                write!(f, "Source file '{}' does not exist", path.display())
            }
            Self::SourceTooLarge { path, size, max } => write!(
                f,
                "Source file '{}' is {size} bytes, exceeds maximum of {max} bytes",
                path.display()
            ),
            Self::TableNotFound { path } => {
                write!(f, "Variable table '{}' does not exist", path.display())
            }
            Self::TableParse { path, source } => {
                write!(
                    f,
                    "Cannot parse variable table '{}': {source}",
                    path.display()
                )
            }
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TableParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<LinkError> for VarwatchError {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for VarwatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for varwatch results.
pub type Result<T> = std::result::Result<T, VarwatchError>;
