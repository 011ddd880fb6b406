//! Application error types using thiserror
//!
//! Error hierarchy:
//! - SpecError: Issues with dependency specifier parsing
//! - RegistryError: Issues with package registry communication
//! - ConstraintError: Issues with version constraint handling
//! - AggregateError: Issues reconciling bumps across references
//! - LockError: Issues with lockfile reading, validation, and synthesis
//! - VcsError: Issues running version-control subprocesses
//! - IoError: File system operation failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Specifier parsing errors
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Version constraint related errors
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// Bump reconciliation errors
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Import-map related errors
    #[error(transparent)]
    ImportMap(#[from] ImportMapError),

    /// Lockfile related errors
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Version control related errors
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to dependency specifier parsing
#[derive(Error, Debug)]
pub enum SpecError {
    /// The specifier does not match the `kind:name@constraint[/path]` shape
    #[error("failed to parse dependency specifier '{specifier}': {message}")]
    Parse { specifier: String, message: String },

    /// The protocol is not one of jsr/npm/http/https
    #[error("unsupported specifier kind '{kind}' in '{specifier}'")]
    UnsupportedKind { kind: String, specifier: String },
}

/// Errors related to package registry communication
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// Non-OK response from a registry endpoint
    #[error("request to {url} failed: {status}")]
    Http { url: String, status: String },

    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    Network {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors related to version constraints
#[derive(Error, Debug)]
pub enum ConstraintError {
    /// The constraint shape is not one of the recognized forms
    #[error("unsupported constraint format '{constraint}'")]
    UnsupportedFormat { constraint: String },

    /// A version string could not be parsed
    #[error("invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },
}

/// Errors detected while merging bumps across references
#[derive(Error, Debug)]
pub enum AggregateError {
    /// Two requirements for one dependency resolved to different targets
    #[error("conflicting bump targets for '{name}': {}", targets.join(", "))]
    ConflictingBumpTargets { name: String, targets: Vec<String> },
}

/// Errors related to import-map files
#[derive(Error, Debug)]
pub enum ImportMapError {
    /// Failed to parse import-map JSON
    #[error("failed to parse import map {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The addressed entry does not exist
    #[error("import map entry '{key}' not found")]
    KeyNotFound { key: String },
}

/// Errors related to lockfile operations
#[derive(Error, Debug)]
pub enum LockError {
    /// The lockfile schema version is not the supported one
    #[error("unsupported lockfile version '{found}' in {path} (expected \"3\")")]
    UnsupportedVersion { path: PathBuf, found: String },

    /// Failed to parse lockfile JSON
    #[error("failed to parse lockfile {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Failed to read lockfile
    #[error("failed to read lockfile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write lockfile
    #[error("failed to write lockfile {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from version-control and hook subprocesses
#[derive(Error, Debug)]
pub enum VcsError {
    /// The subprocess exited non-zero
    #[error("command '{command}' failed: {stderr}")]
    Command { command: String, stderr: String },

    /// The subprocess could not be spawned
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read a source file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a source file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpecError {
    /// Creates a new Parse error
    pub fn parse(specifier: impl Into<String>, message: impl Into<String>) -> Self {
        SpecError::Parse {
            specifier: specifier.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnsupportedKind error
    pub fn unsupported_kind(kind: impl Into<String>, specifier: impl Into<String>) -> Self {
        SpecError::UnsupportedKind {
            kind: kind.into(),
            specifier: specifier.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new Http error
    pub fn http(url: impl Into<String>, status: impl Into<String>) -> Self {
        RegistryError::Http {
            url: url.into(),
            status: status.into(),
        }
    }

    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::Network {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }
}

impl ConstraintError {
    /// Creates a new UnsupportedFormat error
    pub fn unsupported_format(constraint: impl Into<String>) -> Self {
        ConstraintError::UnsupportedFormat {
            constraint: constraint.into(),
        }
    }

    /// Creates a new InvalidVersion error
    pub fn invalid_version(version: impl Into<String>, message: impl Into<String>) -> Self {
        ConstraintError::InvalidVersion {
            version: version.into(),
            message: message.into(),
        }
    }
}

impl AggregateError {
    /// Creates a new ConflictingBumpTargets error
    pub fn conflicting_bump_targets(name: impl Into<String>, targets: Vec<String>) -> Self {
        AggregateError::ConflictingBumpTargets {
            name: name.into(),
            targets,
        }
    }
}

impl ImportMapError {
    /// Creates a new Parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ImportMapError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new KeyNotFound error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        ImportMapError::KeyNotFound { key: key.into() }
    }
}

impl LockError {
    /// Creates a new UnsupportedVersion error
    pub fn unsupported_version(path: impl Into<PathBuf>, found: impl Into<String>) -> Self {
        LockError::UnsupportedVersion {
            path: path.into(),
            found: found.into(),
        }
    }

    /// Creates a new Parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LockError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl VcsError {
    /// Creates a new Command error
    pub fn command(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        VcsError::Command {
            command: command.into(),
            stderr: stderr.into(),
        }
    }
}

impl IoError {
    /// Creates a new Read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_parse() {
        let err = SpecError::parse("jsr:@std/fs", "missing version constraint");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse dependency specifier"));
        assert!(msg.contains("jsr:@std/fs"));
        assert!(msg.contains("missing version constraint"));
    }

    #[test]
    fn test_spec_error_unsupported_kind() {
        let err = SpecError::unsupported_kind("file", "file:./mod.ts");
        let msg = format!("{}", err);
        assert!(msg.contains("unsupported specifier kind 'file'"));
    }

    #[test]
    fn test_registry_error_http() {
        let err =
            RegistryError::http("https://jsr.io/@std/fs/meta.json", "500 Internal Server Error");
        let msg = format!("{}", err);
        assert!(msg.contains("https://jsr.io/@std/fs/meta.json"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent", "npm");
        let msg = format!("{}", err);
        assert!(msg.contains("package 'nonexistent' not found"));
        assert!(msg.contains("npm"));
    }

    #[test]
    fn test_constraint_error_unsupported_format() {
        let err = ConstraintError::unsupported_format(">=1.0.0 <2.0.0");
        let msg = format!("{}", err);
        assert!(msg.contains("unsupported constraint format"));
        assert!(msg.contains(">=1.0.0 <2.0.0"));
    }

    #[test]
    fn test_aggregate_error_conflicting_targets() {
        let err = AggregateError::conflicting_bump_targets(
            "@std/fs",
            vec!["1.0.0".to_string(), "2.0.0".to_string()],
        );
        let msg = format!("{}", err);
        assert!(msg.contains("conflicting bump targets for '@std/fs'"));
        assert!(msg.contains("1.0.0, 2.0.0"));
    }

    #[test]
    fn test_lock_error_unsupported_version() {
        let err = LockError::unsupported_version("/proj/deno.lock", "2");
        let msg = format!("{}", err);
        assert!(msg.contains("unsupported lockfile version '2'"));
        assert!(msg.contains("expected \"3\""));
    }

    #[test]
    fn test_vcs_error_command() {
        let err = VcsError::command("git commit", "nothing to commit");
        let msg = format!("{}", err);
        assert!(msg.contains("git commit"));
        assert!(msg.contains("nothing to commit"));
    }

    #[test]
    fn test_app_error_from_spec_error() {
        let err: AppError = SpecError::parse("npm:chalk", "no version").into();
        assert!(format!("{}", err).contains("npm:chalk"));
    }

    #[test]
    fn test_app_error_from_aggregate_error() {
        let err: AppError =
            AggregateError::conflicting_bump_targets("pkg", vec!["1.0.0".into()]).into();
        assert!(format!("{}", err).contains("conflicting bump targets"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = SpecError::parse("x", "y");
        assert!(format!("{:?}", err).contains("Parse"));
    }
}
