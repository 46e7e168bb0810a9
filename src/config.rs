//! Rewrite settings.

use std::path::{Path, PathBuf};

use crate::geometry::MatchPolicy;

/// Settings for one rewrite run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteConfig {
    /// Appended to the first line (the geometry title).
    /// Default: "_WithSurvey"
    pub title_suffix: String,

    /// Extension of the output file when no output path is given.
    /// Default: "g99"
    pub output_extension: String,

    /// How survey keys are compared with the geometry file.
    /// Default: `MatchPolicy::Legacy`
    pub match_policy: MatchPolicy,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            title_suffix: "_WithSurvey".to_string(),
            output_extension: "g99".to_string(),
            match_policy: MatchPolicy::Legacy,
        }
    }
}

impl RewriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.title_suffix = suffix.into();
        self
    }

    pub fn with_output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Output path next to `input`, with the extension replaced.
    pub fn default_output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.output_extension)
    }
}
