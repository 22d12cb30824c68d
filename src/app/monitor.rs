// varwatch - app/monitor.rs
//
// Top-level monitoring procedure: resolve the live log artifact, wait for
// the data-dictionary section to complete, extract once, persist the table.
//
// Single-threaded, synchronous, cooperative polling. The whole run is
// bounded by the analyser's progress, not CPU work, so the only blocking
// operations are fixed-duration sleeps and whole-file reads. File handles
// are scoped per read so nothing interferes with the rename-based liveness
// probe or the analyser's own writes.

use crate::app::config::AppConfig;
use crate::app::workspace::{Discovery, LivenessProbe, WorkspaceScanner};
use crate::core::{export, extract};
use crate::util::constants::{
    DICT_START_MARKER, OUTPUT_FILE_NAME, RESULT_SUMMARY_MARKER, SHARED_MEMORY_MARKER,
};
use crate::util::error::{DiscoveryError, Result, VarwatchError};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// How a monitor run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The dictionary was extracted and the table written.
    Completed { output: PathBuf, variables: usize },
    /// The artifact completed but yielded no variables; no output written.
    NoData,
    /// No live workspace resolved within the discovery budget; no output
    /// written.
    TimedOut { waited_secs: u64 },
}

/// One monitoring session against one analyser run.
pub struct Monitor {
    config: AppConfig,
    scanner: WorkspaceScanner,
    output_dir: PathBuf,
}

impl Monitor {
    pub fn new(config: AppConfig, output_dir: PathBuf, probe: Box<dyn LivenessProbe>) -> Self {
        let scanner = WorkspaceScanner::new(config.temp_root.clone(), probe);
        Self {
            config,
            scanner,
            output_dir,
        }
    }

    /// Run the full monitor sequence.
    ///
    /// 1. Remove a leftover output table so each run starts clean.
    /// 2. Retry workspace discovery on a fixed cadence until the overall
    ///    budget is exhausted.
    /// 3. Ensure the output directory exists.
    /// 4. Poll the artifact until all readiness markers are present, then
    ///    extract once and serialise a non-empty table.
    pub fn run(&mut self) -> Result<MonitorOutcome> {
        tracing::info!(
            temp_root = %self.config.temp_root.display(),
            output = %self.output_dir.display(),
            "Monitoring started"
        );

        // --- 1. Start clean ---
        let output_file = self.output_dir.join(OUTPUT_FILE_NAME);
        if output_file.exists() {
            std::fs::remove_file(&output_file).map_err(|e| VarwatchError::Io {
                path: output_file.clone(),
                operation: "removing previous output",
                source: e,
            })?;
            tracing::info!(path = %output_file.display(), "Previous output removed");
        }

        // --- 2. Discovery loop (bounded) ---
        let started = Instant::now();
        let artifact = loop {
            match self.scanner.find_artifact()? {
                Discovery::Found(path) => break path,
                Discovery::Ambiguous { live } => {
                    tracing::warn!(live, "Ambiguous workspaces; retrying");
                }
                Discovery::NotFound => {
                    tracing::debug!("No live workspace yet; retrying");
                }
            }

            let waited = started.elapsed();
            if waited >= self.config.discovery_timeout {
                tracing::error!(
                    waited_secs = waited.as_secs(),
                    "Workspace discovery timed out"
                );
                return Ok(MonitorOutcome::TimedOut {
                    waited_secs: waited.as_secs(),
                });
            }
            std::thread::sleep(self.config.discovery_retry);
        };

        // --- 3. Output directory ---
        std::fs::create_dir_all(&self.output_dir).map_err(|e| VarwatchError::Io {
            path: self.output_dir.clone(),
            operation: "creating output directory",
            source: e,
        })?;

        // --- 4. Readiness wait loop (unbounded: the analyser will reach the
        //        terminal markers or the process is killed externally) ---
        self.wait_and_extract(&artifact, &output_file)
    }

    fn wait_and_extract(
        &self,
        artifact: &Path,
        output_file: &Path,
    ) -> Result<MonitorOutcome> {
        loop {
            let content = read_artifact(artifact)?;

            if !content.contains(DICT_START_MARKER) {
                // The dictionary section has not begun.
                tracing::trace!("Dictionary section not started; coarse wait");
                std::thread::sleep(self.config.coarse_poll);
                continue;
            }
            if !content.contains(RESULT_SUMMARY_MARKER)
                || !content.contains(SHARED_MEMORY_MARKER)
            {
                // The section is actively being written; poll tighter.
                tracing::trace!("Dictionary section incomplete; fine wait");
                std::thread::sleep(self.config.fine_poll);
                continue;
            }

            let lines: Vec<&str> = content.lines().collect();
            let extraction = extract::extract(&lines)?;

            return match extraction {
                Some(extraction) if !extraction.table.is_empty() => {
                    let variables = export::write_table_file(&extraction.table, output_file)?;
                    tracing::info!(variables, "Monitoring finished");
                    Ok(MonitorOutcome::Completed {
                        output: output_file.to_path_buf(),
                        variables,
                    })
                }
                _ => {
                    tracing::warn!("Dictionary section yielded no variables; no output written");
                    Ok(MonitorOutcome::NoData)
                }
            };
        }
    }
}

/// Read the whole artifact, decoding lossily -- the analyser may be
/// mid-write, so a torn multi-byte sequence at the tail must not abort the
/// poll.
fn read_artifact(path: &Path) -> Result<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DiscoveryError::ArtifactVanished {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => Err(DiscoveryError::ArtifactRead {
            path: path.to_path_buf(),
            source: e,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_artifact_missing_file_is_vanished() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_artifact(&dir.path().join("gone.txt"));
        assert!(matches!(
            result,
            Err(VarwatchError::Discovery(
                DiscoveryError::ArtifactVanished { .. }
            ))
        ));
    }

    #[test]
    fn test_read_artifact_decodes_torn_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        // Valid content followed by the first byte of a multi-byte sequence.
        std::fs::write(&path, [b'#', b'o', b'k', b'\n', 0xE2]).unwrap();
        let content = read_artifact(&path).unwrap();
        assert!(content.starts_with("#ok\n"));
    }
}
