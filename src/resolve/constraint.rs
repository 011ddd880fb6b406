//! Version constraint shapes and widening
//!
//! Exactly five constraint shapes are recognized:
//! - bare equality (`1.2.3`)
//! - caret (`^1.2.3`)
//! - tilde (`~1.2.3`)
//! - partial (`1`, `1.2`)
//! - wildcard (`1.2.x`, `1.x`, `1.2.*`, `1.*`)
//!
//! Any other shape is an [UnsupportedFormat](crate::error::ConstraintError)
//! error: guessing a widening for an unrecognized range could silently
//! produce a too-narrow or too-wide result.

use crate::error::ConstraintError;
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static PARTIAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?$").unwrap());

static WILDCARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?\.([x*])$").unwrap());

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Bare equality, e.g. `1.2.3` or `1.0.0-rc.1`
    Exact(Version),
    /// Caret range, e.g. `^1.2.3`
    Caret(Version),
    /// Tilde range, e.g. `~1.2.3`
    Tilde(Version),
    /// Numeric prefix, e.g. `1` or `1.2`
    Partial { major: u64, minor: Option<u64> },
    /// Numeric prefix with a wildcard suffix, e.g. `1.2.x` or `1.*`
    Wildcard {
        major: u64,
        minor: Option<u64>,
        star: char,
    },
}

/// Parse a version string into a semver Version with a typed error
pub fn parse_version(s: &str) -> Result<Version, ConstraintError> {
    Version::parse(s).map_err(|e| ConstraintError::invalid_version(s, e.to_string()))
}

impl Constraint {
    /// Parse a constraint string into one of the five recognized shapes
    pub fn parse(raw: &str) -> Result<Self, ConstraintError> {
        if let Some(rest) = raw.strip_prefix('^') {
            let version = Version::parse(rest)
                .map_err(|_| ConstraintError::unsupported_format(raw))?;
            return Ok(Constraint::Caret(version));
        }
        if let Some(rest) = raw.strip_prefix('~') {
            let version = Version::parse(rest)
                .map_err(|_| ConstraintError::unsupported_format(raw))?;
            return Ok(Constraint::Tilde(version));
        }
        if let Ok(version) = Version::parse(raw) {
            return Ok(Constraint::Exact(version));
        }
        if let Some(captures) = WILDCARD_RE.captures(raw) {
            return Ok(Constraint::Wildcard {
                major: captures[1].parse().unwrap(),
                minor: captures.get(2).map(|m| m.as_str().parse().unwrap()),
                star: captures[3].chars().next().unwrap(),
            });
        }
        if let Some(captures) = PARTIAL_RE.captures(raw) {
            return Ok(Constraint::Partial {
                major: captures[1].parse().unwrap(),
                minor: captures.get(2).map(|m| m.as_str().parse().unwrap()),
            });
        }
        Err(ConstraintError::unsupported_format(raw))
    }

    /// The inclusive lower anchor of this constraint
    pub fn anchor(&self) -> Version {
        match self {
            Constraint::Exact(v) | Constraint::Caret(v) | Constraint::Tilde(v) => v.clone(),
            Constraint::Partial { major, minor } | Constraint::Wildcard { major, minor, .. } => {
                Version::new(*major, minor.unwrap_or(0), 0)
            }
        }
    }

    /// Returns true if the constraint itself names a pre-release version
    pub fn is_prerelease(&self) -> bool {
        !self.anchor().pre.is_empty()
    }

    /// Returns true if `version` satisfies this constraint
    ///
    /// Pre-release versions only satisfy ranges anchored at a pre-release of
    /// the same major.minor.patch triple (npm semantics), or an exact match.
    pub fn satisfies(&self, version: &Version) -> bool {
        match self {
            Constraint::Exact(pinned) => version == pinned,
            Constraint::Caret(anchor) => {
                self.admits_prerelease_of(anchor, version)
                    && *version >= *anchor
                    && *version < caret_upper(anchor)
            }
            Constraint::Tilde(anchor) => {
                self.admits_prerelease_of(anchor, version)
                    && *version >= *anchor
                    && *version < tilde_upper(anchor)
            }
            Constraint::Partial { major, minor } | Constraint::Wildcard { major, minor, .. } => {
                version.pre.is_empty()
                    && version.major == *major
                    && minor.map(|m| version.minor == m).unwrap_or(true)
            }
        }
    }

    /// Returns true if `version` lies strictly beyond this constraint
    pub fn allows_above(&self, version: &Version) -> bool {
        !self.satisfies(version) && *version > self.anchor()
    }

    /// Widen this constraint just enough to admit `target`
    ///
    /// `raw` is returned unchanged when `target` already satisfies the
    /// constraint; otherwise each shape widens by its fixed rule, producing
    /// the minimal same-shaped constraint that admits `target`.
    pub fn widen(&self, raw: &str, target: &Version) -> String {
        if self.satisfies(target) {
            return raw.to_string();
        }
        match self {
            Constraint::Exact(_) => target.to_string(),
            Constraint::Caret(_) => {
                if target.major > 0 {
                    format!("^{}.0.0", target.major)
                } else if target.minor > 0 {
                    format!("^0.{}.0", target.minor)
                } else {
                    format!("^0.0.{}", target.patch)
                }
            }
            Constraint::Tilde(_) => {
                if target.major == 0 {
                    format!("~0.{}.{}", target.minor, target.patch)
                } else {
                    format!("~{}.{}.0", target.major, target.minor)
                }
            }
            Constraint::Partial { minor: None, .. } => format!("{}", target.major),
            Constraint::Partial { minor: Some(_), .. } => {
                format!("{}.{}", target.major, target.minor)
            }
            Constraint::Wildcard {
                minor: None, star, ..
            } => format!("{}.{}", target.major, star),
            Constraint::Wildcard {
                minor: Some(_),
                star,
                ..
            } => format!("{}.{}.{}", target.major, target.minor, star),
        }
    }

    fn admits_prerelease_of(&self, anchor: &Version, version: &Version) -> bool {
        version.pre.is_empty()
            || (!anchor.pre.is_empty()
                && version.major == anchor.major
                && version.minor == anchor.minor
                && version.patch == anchor.patch)
    }
}

/// Widen `constraint` just enough to admit `target`
pub fn increase(constraint: &str, target: &Version) -> Result<String, ConstraintError> {
    Ok(Constraint::parse(constraint)?.widen(constraint, target))
}

/// Returns true if `version` satisfies `constraint`
pub fn satisfies(version: &Version, constraint: &str) -> Result<bool, ConstraintError> {
    Ok(Constraint::parse(constraint)?.satisfies(version))
}

fn caret_upper(anchor: &Version) -> Version {
    if anchor.major > 0 {
        Version::new(anchor.major + 1, 0, 0)
    } else if anchor.minor > 0 {
        Version::new(0, anchor.minor + 1, 0)
    } else {
        Version::new(0, 0, anchor.patch + 1)
    }
}

fn tilde_upper(anchor: &Version) -> Version {
    Version::new(anchor.major, anchor.minor + 1, 0)
}
