/// Input and settings for [`crate::lint`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintOptions {
    /// Script source to lint.
    pub code: String,
    /// Return parse errors to the caller instead of reporting them as a
    /// `syntax-error` diagnostic.
    pub throw_parse_error: bool,
    /// Rule codes that should not run.
    pub disabled: Vec<String>,
}

impl LintOptions {
    /// Options for linting `code` with every rule enabled.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Propagate parse errors from [`crate::lint`].
    #[must_use]
    pub const fn throw_parse_error(mut self, throw: bool) -> Self {
        self.throw_parse_error = throw;
        self
    }

    /// Turn off the rule with the given code.
    #[must_use]
    pub fn disable(mut self, code: impl Into<String>) -> Self {
        self.disabled.push(code.into());
        self
    }

    /// Whether the rule with the given code should run.
    #[must_use]
    pub fn is_enabled(&self, code: &str) -> bool {
        !self.disabled.iter().any(|disabled| disabled == code)
    }
}
