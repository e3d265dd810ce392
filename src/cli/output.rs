//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::{EditError, WorkspaceError};

/// Map workspace errors to a message for stderr, with a hint where one helps.
pub fn map_error(e: &WorkspaceError) -> String {
    match e {
        WorkspaceError::Edit(EditError::ConcurrentModification { .. }) => format!(
            "{}\nhint: another process published first; re-run the command against the new head",
            e
        ),
        WorkspaceError::Edit(EditError::WorkingCopy(_)) => format!(
            "{}\nhint: the commit exists; run `snaptree status` to see what the directory is missing",
            e
        ),
        _ => e.to_string(),
    }
}
