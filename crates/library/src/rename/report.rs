use crate::rename::{Action, RenameEvent};
use serde::Serialize;
use std::fmt;

/// Error messages kept in a [`BatchReport`]; the rest are only counted.
pub const MAX_REPORTED_ERRORS: usize = 3;

/// A successful move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub file_id: i64,
    pub from: String,
    pub to: String,
}

/// Outcome of a rename batch. Always produced, however many items failed.
///
/// ```
/// use renamarr_library::BatchReport;
///
/// let report = BatchReport { total: 2, succeeded: 1, failed: 1, ..Default::default() };
/// assert_eq!(report.to_string(), "File renaming completed: 1 successful, 1 failed");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Files whose flag said they were already correct.
    pub skipped: u64,
    /// The first [`MAX_REPORTED_ERRORS`] error messages.
    pub errors: Vec<String>,
    /// Errors beyond the first [`MAX_REPORTED_ERRORS`].
    pub suppressed_errors: u64,
    pub renamed: Vec<RenamedFile>,
}

impl BatchReport {
    /// Folds one executor event into the report.
    pub fn record(&mut self, event: RenameEvent) {
        match event {
            RenameEvent::Started(total) => self.total = total,
            RenameEvent::Processed { file_id, result } => match result {
                Ok(Action::Skipped(_)) => self.skipped += 1,
                Ok(Action::Renamed { from, file }) => {
                    self.succeeded += 1;
                    if let Some(to) = file.path {
                        self.renamed.push(RenamedFile { file_id, from, to });
                    }
                },
                Ok(Action::AlreadyCorrect(_)) => self.succeeded += 1,
                Err(err) => self.push_error(format!("file {file_id}: {}", &*err)),
            },
            RenameEvent::Complete => {},
        }
    }

    fn push_error(&mut self, message: String) {
        self.failed += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(message);
        } else {
            self.suppressed_errors += 1;
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File renaming completed: {} successful, {} failed", self.succeeded, self.failed)?;
        if !self.errors.is_empty() {
            write!(f, " (Errors: {})", self.errors.join("; "))?;
        }
        if self.suppressed_errors > 0 {
            write!(f, " and {} more...", self.suppressed_errors)?;
        }
        Ok(())
    }
}
