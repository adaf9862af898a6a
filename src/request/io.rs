//! IO redirection of spawned build processes

use crate::error::{SrcdepsError, SrcdepsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where one standard stream of a child process goes
///
/// Textual forms: `inherit`, `discard`, `capture`, `read:<path>`,
/// `write:<path>`, `append:<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Redirect {
    /// Share the stream of the current process
    #[default]
    Inherit,
    /// Connect to the null device
    Discard,
    /// Collect into memory; shows up in command output and failures
    Capture,
    /// Read stdin from a file
    Read(PathBuf),
    /// Truncate and write to a file
    Write(PathBuf),
    /// Append to a file
    Append(PathBuf),
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => write!(f, "inherit"),
            Self::Discard => write!(f, "discard"),
            Self::Capture => write!(f, "capture"),
            Self::Read(p) => write!(f, "read:{}", p.display()),
            Self::Write(p) => write!(f, "write:{}", p.display()),
            Self::Append(p) => write!(f, "append:{}", p.display()),
        }
    }
}

impl FromStr for Redirect {
    type Err = SrcdepsError;

    fn from_str(s: &str) -> SrcdepsResult<Self> {
        match s {
            "inherit" => return Ok(Self::Inherit),
            "discard" | "null" => return Ok(Self::Discard),
            "capture" | "pipe" => return Ok(Self::Capture),
            _ => {}
        }

        let (scheme, path) = s
            .split_once(':')
            .ok_or_else(|| SrcdepsError::parse(s, "unknown redirect"))?;
        if path.is_empty() {
            return Err(SrcdepsError::parse(s, "redirect path is empty"));
        }
        let path = PathBuf::from(path);
        match scheme {
            "read" => Ok(Self::Read(path)),
            "write" => Ok(Self::Write(path)),
            "append" => Ok(Self::Append(path)),
            _ => Err(SrcdepsError::parse(s, "unknown redirect")),
        }
    }
}

impl TryFrom<String> for Redirect {
    type Error = SrcdepsError;

    fn try_from(value: String) -> SrcdepsResult<Self> {
        value.parse()
    }
}

impl From<Redirect> for String {
    fn from(value: Redirect) -> Self {
        value.to_string()
    }
}

/// Redirects for stdin, stdout and stderr of a child process
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IoRedirects {
    pub stdin: Redirect,
    pub stdout: Redirect,
    pub stderr: Redirect,
    /// Send stderr wherever stdout goes, ignoring `stderr`
    pub err2out: bool,
}

impl IoRedirects {
    pub fn inherit_all() -> Self {
        Self::default()
    }

    pub fn discard_all() -> Self {
        Self {
            stdin: Redirect::Discard,
            stdout: Redirect::Discard,
            stderr: Redirect::Discard,
            err2out: false,
        }
    }

    /// Check that each redirect makes sense for its stream
    pub fn validate(&self) -> SrcdepsResult<()> {
        if matches!(
            self.stdin,
            Redirect::Write(_) | Redirect::Append(_) | Redirect::Capture
        ) {
            return Err(SrcdepsError::configuration(
                "io_redirects.stdin",
                format!("'{}' cannot be used for stdin", self.stdin),
            ));
        }
        for (field, redirect) in [
            ("io_redirects.stdout", &self.stdout),
            ("io_redirects.stderr", &self.stderr),
        ] {
            if matches!(redirect, Redirect::Read(_)) {
                return Err(SrcdepsError::configuration(
                    field,
                    format!("'{}' cannot be used for an output stream", redirect),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for IoRedirects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stdin={}, stdout={}, ", self.stdin, self.stdout)?;
        if self.err2out {
            write!(f, "stderr=err2out")
        } else {
            write!(f, "stderr={}", self.stderr)
        }
    }
}
