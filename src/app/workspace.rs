// varwatch - app/workspace.rs
//
// Analyser workspace discovery: find the one live transient directory the
// analyser is currently writing into, and the log artifact inside it.
//
// The analyser holds an OS-level lock on its live workspace for the whole
// run, but there is no portable "is this directory open elsewhere" query.
// The default probe therefore lists the directory, opens the analysis log
// for read, and attempts a rename round-trip; any failure is taken as the
// lock conflict that marks the workspace live. The probe is a trait so
// tests (or platforms with advisory-lock queries) can substitute their own
// check.
//
// The probe result is authoritative only for the call that made it -- a
// workspace can transition between calls, so nothing is cached across calls
// except the set of workspaces already confirmed stale and deleted.

use crate::util::constants::{
    ANALYSIS_LOG_NAME, ARTIFACT_NAME, PERSISTENT_DIR_NAME, PROBE_RENAME_SUFFIX, WORKSPACE_TOKEN,
};
use crate::util::error::DiscoveryError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// =============================================================================
// Liveness probe
// =============================================================================

/// Decides whether a candidate workspace is currently held open by the
/// analyser.
pub trait LivenessProbe {
    /// Returns `true` when `workspace` is judged live (locked by the
    /// analyser), `false` when it is stale and safe to delete.
    ///
    /// `analysis_log` is the workspace's `persistent/astree.log`, already
    /// confirmed to exist.
    fn is_locked(&self, workspace: &Path, analysis_log: &Path) -> bool;
}

/// Default probe: rename round-trip.
///
/// Lists the workspace, opens the analysis log for read, renames the
/// workspace directory to a sibling name and immediately renames it back.
/// If every step succeeds the OS holds no lock and the workspace is stale;
/// if any step fails the analyser still owns it.
#[derive(Debug, Default)]
pub struct RenameProbe;

impl LivenessProbe for RenameProbe {
    fn is_locked(&self, workspace: &Path, analysis_log: &Path) -> bool {
        if let Err(e) = list_entries(workspace) {
            tracing::trace!(workspace = %workspace.display(), error = %e, "Listing refused");
            return true;
        }
        if let Err(e) = std::fs::File::open(analysis_log) {
            tracing::trace!(log = %analysis_log.display(), error = %e, "Open refused");
            return true;
        }

        let mut probe_name = match workspace.file_name() {
            Some(name) => name.to_os_string(),
            None => return true,
        };
        probe_name.push(PROBE_RENAME_SUFFIX);
        let sibling = workspace.with_file_name(probe_name);

        match std::fs::rename(workspace, &sibling) {
            Err(e) => {
                tracing::trace!(workspace = %workspace.display(), error = %e, "Rename refused");
                true
            }
            Ok(()) => {
                if let Err(e) = std::fs::rename(&sibling, workspace) {
                    // The workspace is stranded under the probe name; it will
                    // be rescanned (the token is still in the name) but the
                    // condition is worth surfacing.
                    tracing::warn!(
                        workspace = %sibling.display(),
                        error = %e,
                        "Cannot rename workspace back after probe"
                    );
                }
                false
            }
        }
    }
}

/// Force a full listing so permission errors on the directory surface here
/// rather than silently producing zero entries.
fn list_entries(dir: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        entry?;
    }
    Ok(())
}

// =============================================================================
// Workspace scanner
// =============================================================================

/// Outcome of one discovery pass over the temp root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Exactly one live workspace; path of its log artifact.
    Found(PathBuf),
    /// More than one workspace judged live at once. Non-fatal; the caller
    /// retries until its time budget runs out.
    Ambiguous { live: usize },
    /// No live workspace (or the live one has no artifact yet).
    NotFound,
}

/// Scans the analyser's temp root for the live workspace.
///
/// Owns the removed-set for one monitoring session: workspaces confirmed
/// stale are deleted outright and never rescanned.
pub struct WorkspaceScanner {
    temp_root: PathBuf,
    probe: Box<dyn LivenessProbe>,
    removed: HashSet<PathBuf>,
}

impl WorkspaceScanner {
    pub fn new(temp_root: PathBuf, probe: Box<dyn LivenessProbe>) -> Self {
        Self {
            temp_root,
            probe,
            removed: HashSet::new(),
        }
    }

    /// One discovery pass.
    ///
    /// Enumerates temp-root entries whose name contains the workspace token,
    /// skips entries already confirmed removed, requires the analysis log to
    /// exist (otherwise the workspace is not yet initialised), and judges
    /// liveness via the probe. Stale workspaces are deleted and recorded.
    ///
    /// Returns `Err` only when the temp root itself cannot be listed.
    pub fn find_artifact(&mut self) -> Result<Discovery, DiscoveryError> {
        let entries =
            std::fs::read_dir(&self.temp_root).map_err(|e| DiscoveryError::RootNotFound {
                path: self.temp_root.clone(),
                source: e,
            })?;

        let mut live_workspace: Option<PathBuf> = None;
        let mut live_count = 0usize;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(root = %self.temp_root.display(), error = %e, "Unreadable entry");
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.contains(WORKSPACE_TOKEN) {
                continue;
            }

            let workspace = entry.path();
            if self.removed.contains(&workspace) {
                continue;
            }

            let analysis_log = workspace
                .join(PERSISTENT_DIR_NAME)
                .join(ANALYSIS_LOG_NAME);
            if !analysis_log.is_file() {
                tracing::trace!(workspace = %workspace.display(), "Not yet initialised; skipped");
                continue;
            }

            if self.probe.is_locked(&workspace, &analysis_log) {
                tracing::debug!(workspace = %workspace.display(), "Workspace judged live");
                live_count += 1;
                live_workspace = Some(workspace);
            } else {
                // Stale leftover from an earlier run: remove it so it cannot
                // shadow the live workspace on later passes.
                match std::fs::remove_dir_all(&workspace) {
                    Ok(()) => {
                        tracing::info!(workspace = %workspace.display(), "Stale workspace removed")
                    }
                    Err(e) => {
                        tracing::warn!(
                            workspace = %workspace.display(),
                            error = %e,
                            "Cannot remove stale workspace"
                        );
                    }
                }
                self.removed.insert(workspace);
            }
        }

        match (live_count, live_workspace) {
            (1, Some(workspace)) => {
                let artifact = workspace.join(PERSISTENT_DIR_NAME).join(ARTIFACT_NAME);
                if artifact.is_file() {
                    tracing::info!(artifact = %artifact.display(), "Log artifact found");
                    Ok(Discovery::Found(artifact))
                } else {
                    tracing::error!(
                        workspace = %workspace.display(),
                        "Live workspace has no log artifact"
                    );
                    Ok(Discovery::NotFound)
                }
            }
            (0, _) => {
                tracing::debug!(root = %self.temp_root.display(), "No live workspace");
                Ok(Discovery::NotFound)
            }
            (count, _) => {
                tracing::error!(live = count, "More than one live workspace detected");
                Ok(Discovery::Ambiguous { live: count })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Probe whose verdict is fixed per workspace name, so tests control
    /// liveness without OS locks.
    struct FixedProbe {
        live_names: Vec<&'static str>,
    }

    impl LivenessProbe for FixedProbe {
        fn is_locked(&self, workspace: &Path, _analysis_log: &Path) -> bool {
            let name = workspace.file_name().unwrap().to_str().unwrap();
            self.live_names.iter().any(|live| name.contains(live))
        }
    }

    fn make_workspace(root: &Path, name: &str, with_artifact: bool) -> PathBuf {
        let workspace = root.join(name);
        let persistent = workspace.join(PERSISTENT_DIR_NAME);
        fs::create_dir_all(&persistent).unwrap();
        fs::write(persistent.join(ANALYSIS_LOG_NAME), "analysis\n").unwrap();
        if with_artifact {
            fs::write(persistent.join(ARTIFACT_NAME), "#log\n").unwrap();
        }
        workspace
    }

    fn scanner(root: &Path, live_names: Vec<&'static str>) -> WorkspaceScanner {
        WorkspaceScanner::new(root.to_path_buf(), Box::new(FixedProbe { live_names }))
    }

    #[test]
    fn test_single_live_workspace_yields_artifact_path() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = make_workspace(dir.path(), "a3c-run1", true);

        let result = scanner(dir.path(), vec!["a3c-run1"]).find_artifact().unwrap();
        assert_eq!(
            result,
            Discovery::Found(
                workspace
                    .join(PERSISTENT_DIR_NAME)
                    .join(ARTIFACT_NAME)
            )
        );
    }

    #[test]
    fn test_two_live_workspaces_are_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        make_workspace(dir.path(), "a3c-run1", true);
        make_workspace(dir.path(), "a3c-run2", true);

        let result = scanner(dir.path(), vec!["a3c-run1", "a3c-run2"])
            .find_artifact()
            .unwrap();
        assert_eq!(result, Discovery::Ambiguous { live: 2 });
    }

    #[test]
    fn test_stale_workspace_is_deleted_and_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let stale = make_workspace(dir.path(), "a3c-old", true);
        let live = make_workspace(dir.path(), "a3c-new", true);

        let mut scanner = scanner(dir.path(), vec!["a3c-new"]);
        let result = scanner.find_artifact().unwrap();

        assert!(!stale.exists(), "stale workspace should be deleted");
        assert!(scanner.removed.contains(&stale));
        assert_eq!(
            result,
            Discovery::Found(live.join(PERSISTENT_DIR_NAME).join(ARTIFACT_NAME))
        );
    }

    #[test]
    fn test_live_workspace_without_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        make_workspace(dir.path(), "a3c-run1", false);

        let result = scanner(dir.path(), vec!["a3c-run1"]).find_artifact().unwrap();
        assert_eq!(result, Discovery::NotFound);
    }

    #[test]
    fn test_uninitialised_workspace_is_skipped_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("a3c-early");
        fs::create_dir_all(&bare).unwrap(); // no persistent/ yet

        let result = scanner(dir.path(), vec![]).find_artifact().unwrap();
        assert_eq!(result, Discovery::NotFound);
        assert!(bare.exists(), "uninitialised workspace must not be deleted");
    }

    #[test]
    fn test_directories_without_token_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("unrelated");
        let persistent = other.join(PERSISTENT_DIR_NAME);
        fs::create_dir_all(&persistent).unwrap();
        fs::write(persistent.join(ANALYSIS_LOG_NAME), "x").unwrap();

        let result = scanner(dir.path(), vec!["unrelated"]).find_artifact().unwrap();
        assert_eq!(result, Discovery::NotFound);
        assert!(other.exists());
    }

    #[test]
    fn test_missing_temp_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = scanner(&missing, vec![]).find_artifact();
        assert!(matches!(result, Err(DiscoveryError::RootNotFound { .. })));
    }

    #[test]
    fn test_rename_probe_judges_unheld_workspace_stale() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = make_workspace(dir.path(), "a3c-idle", true);
        let analysis_log = workspace
            .join(PERSISTENT_DIR_NAME)
            .join(ANALYSIS_LOG_NAME);

        let probe = RenameProbe;
        assert!(!probe.is_locked(&workspace, &analysis_log));
        // The round-trip must leave the workspace in place under its
        // original name.
        assert!(workspace.exists());
        assert!(analysis_log.exists());
    }
}
