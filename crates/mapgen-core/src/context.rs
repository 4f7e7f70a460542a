use mapgen_config::{Config, SourceSystemProfile};
use mapgen_model::DataCaptureMode;

/// Read-only inputs shared by every step of one table's build.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub config: &'a Config,
    /// Qualified target table; scopes violations and warnings.
    pub table: &'a str,
    pub capture_mode: DataCaptureMode,
    pub profile: Option<&'a SourceSystemProfile>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Config, table: &'a str) -> Self {
        Self {
            config,
            table,
            capture_mode: DataCaptureMode::default(),
            profile: None,
        }
    }

    pub fn with_capture_mode(mut self, capture_mode: DataCaptureMode) -> Self {
        self.capture_mode = capture_mode;
        self
    }

    pub fn with_profile(mut self, profile: &'a SourceSystemProfile) -> Self {
        self.profile = Some(profile);
        self
    }
}
