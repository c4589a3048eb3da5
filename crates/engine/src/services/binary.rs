//! Auxiliary binaries built from source
//!
//! The smart filter and the shared cache ship as Go sources next to the hooks.
//! When the compiled binary is missing it is built once, while the orchestrator
//! is being initialized. A failed build leaves the service unavailable.

use crate::process;
use hookflow_core::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;

/// A binary that can be compiled from a Go source file
#[derive(Debug, Clone)]
pub struct AuxBinary {
    service: &'static str,
    binary: PathBuf,
    source: PathBuf,
}

impl AuxBinary {
    /// Describe the binary for `service`
    pub fn new(service: &'static str, binary: PathBuf, source: PathBuf) -> Self {
        Self {
            service,
            binary,
            source,
        }
    }

    /// Make sure the binary exists
    ///
    /// Builds it from source with `go build` when it is missing and
    /// `build_missing` is set.
    #[tracing::instrument(skip(self), fields(service = self.service))]
    pub fn prepare(&self, build_missing: bool) -> Result<PathBuf> {
        if self.binary.is_file() {
            return Ok(self.binary.clone());
        }

        if !build_missing {
            return Err(Error::auxiliary(
                self.service,
                format!("binary not found at {}", self.binary.display()),
            ));
        }

        if !self.source.is_file() {
            return Err(Error::auxiliary(
                self.service,
                format!(
                    "binary not found at {} and no source at {}",
                    self.binary.display(),
                    self.source.display()
                ),
            ));
        }

        let go = which::which("go")
            .map_err(|e| Error::auxiliary(self.service, format!("go toolchain not found: {e}")))?;

        tracing::info!("Building {} from {}", self.service, self.source.display());

        let args: Vec<OsString> = vec![
            "build".into(),
            "-o".into(),
            self.binary.clone().into_os_string(),
            self.source.clone().into_os_string(),
        ];
        let mut expression = duct::cmd(go, args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked();
        if let Some(dir) = self.source.parent().filter(|d| !d.as_os_str().is_empty()) {
            expression = expression.dir(dir);
        }

        let output = expression
            .run()
            .map_err(|e| Error::auxiliary(self.service, format!("go build failed to start: {e}")))?;

        if !output.status.success() {
            return Err(Error::auxiliary(
                self.service,
                format!("go build failed: {}", process::lossy(&output.stdout).trim()),
            ));
        }

        if !self.binary.is_file() {
            return Err(Error::auxiliary(
                self.service,
                format!("go build produced no binary at {}", self.binary.display()),
            ));
        }

        Ok(self.binary.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_existing_binary_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("smart-filter");
        std::fs::write(&binary, "").unwrap();
        let aux = AuxBinary::new("smart filter", binary.clone(), dir.path().join("x.go"));
        assert_eq!(aux.prepare(false).unwrap(), binary);
    }

    #[test]
    fn test_missing_binary_without_build() {
        let dir = tempfile::tempdir().unwrap();
        let aux = AuxBinary::new(
            "smart filter",
            dir.path().join("smart-filter"),
            dir.path().join("smart-filter.go"),
        );
        let err = aux.prepare(false).unwrap_err();
        assert!(err.to_string().contains("binary not found"));
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let aux = AuxBinary::new(
            "shared cache",
            dir.path().join("shared-cache"),
            dir.path().join("cache/shared-cache.go"),
        );
        let err = aux.prepare(true).unwrap_err();
        assert!(err.to_string().contains("no source"));
    }
}
