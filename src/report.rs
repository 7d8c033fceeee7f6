//! Plain-text rendering of lint results for the command line.

use crate::lint::Diagnostic;

/// `<line>:<col> <message>  (<code>)` with one-based positions.
#[must_use]
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{} {}  ({})",
        diagnostic.line + 1,
        diagnostic.col + 1,
        diagnostic.message,
        diagnostic.code
    )
}

/// The file path followed by one line per diagnostic.
#[must_use]
pub fn format_file(path: &str, diagnostics: &[Diagnostic]) -> String {
    let mut out = String::from(path);
    out.push('\n');
    for diagnostic in diagnostics {
        out.push_str(&format_diagnostic(diagnostic));
        out.push('\n');
    }
    out
}

/// Running totals over every linted file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub files_with_errors: usize,
    pub errors: usize,
}

impl Summary {
    pub const fn add(&mut self, diagnostics: &[Diagnostic]) {
        self.files += 1;
        if !diagnostics.is_empty() {
            self.files_with_errors += 1;
            self.errors += diagnostics.len();
        }
    }

    /// Closing line printed after all files.
    #[must_use]
    pub fn message(&self) -> String {
        if self.files == 0 {
            "please specify a file".to_string()
        } else if self.errors > 0 {
            format!(
                "found {} error(s) in {} file(s)",
                self.errors, self.files_with_errors
            )
        } else {
            format!("processed {} file(s), no error found", self.files)
        }
    }

    /// No file was linted, or some diagnostic fired.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.files == 0 || self.errors > 0
    }
}
