//! Configuration types for directory-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConverterConfig`], built
//! via its [`ConverterConfigBuilder`]. The credential is deliberately not a
//! field here: it is loaded separately (see [`crate::credentials`]) and handed
//! to the HTTP client, so a config value can be logged or cloned freely.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Configuration for a conversion run.
///
/// # Example
/// ```rust
/// use cloudconvert_pdf::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .wait_timeout_secs(300)
///     .poll_interval_ms(1000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConverterConfig {
    /// Extension (without the dot) a file name must end with to be converted.
    /// Default: `pdf`.
    ///
    /// Matching is case-sensitive on the file name suffix, so `report.PDF`
    /// is not picked up by the default.
    pub target_extension: String,

    /// Extension of the converted output. Default: `pdf`.
    pub output_format: String,

    /// Pin the input format sent to the convert task. Default: None
    /// (the service detects it from the uploaded file name).
    pub input_format: Option<String>,

    /// How long and how often to poll the export task.
    pub wait: WaitPolicy,

    /// Per-request HTTP timeout in seconds. Default: 120.
    ///
    /// Applies to every API call and to the upload and download bodies.
    pub request_timeout_secs: u64,

    /// What to do when the input already has the output extension.
    /// Default: [`SameExtensionPolicy::Overwrite`].
    pub same_extension: SameExtensionPolicy,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            target_extension: "pdf".to_string(),
            output_format: "pdf".to_string(),
            input_format: None,
            wait: WaitPolicy::default(),
            request_timeout_secs: 120,
            same_extension: SameExtensionPolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("target_extension", &self.target_extension)
            .field("output_format", &self.output_format)
            .field("input_format", &self.input_format)
            .field("wait", &self.wait)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("same_extension", &self.same_extension)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for [`ConverterConfig`].
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn target_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.target_extension = normalise_extension(ext.into());
        self
    }

    pub fn output_format(mut self, ext: impl Into<String>) -> Self {
        self.config.output_format = normalise_extension(ext.into());
        self
    }

    pub fn input_format(mut self, ext: impl Into<String>) -> Self {
        self.config.input_format = Some(normalise_extension(ext.into()));
        self
    }

    /// Overall wait timeout in seconds; `0` waits forever.
    pub fn wait_timeout_secs(mut self, secs: u64) -> Self {
        self.config.wait.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.wait.poll_interval = Duration::from_millis(ms);
        self
    }

    pub fn max_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.wait.max_poll_interval = Duration::from_millis(ms);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn same_extension(mut self, policy: SameExtensionPolicy) -> Self {
        self.config.same_extension = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, ConvertError> {
        let c = &self.config;
        if c.target_extension.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Target extension must not be empty".into(),
            ));
        }
        if c.output_format.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Output format must not be empty".into(),
            ));
        }
        if c.wait.poll_interval.is_zero() {
            return Err(ConvertError::InvalidConfig(
                "Poll interval must be > 0".into(),
            ));
        }
        if c.wait.max_poll_interval < c.wait.poll_interval {
            return Err(ConvertError::InvalidConfig(format!(
                "Max poll interval ({}ms) is shorter than the poll interval ({}ms)",
                c.wait.max_poll_interval.as_millis(),
                c.wait.poll_interval.as_millis()
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

fn normalise_extension(ext: String) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

// ── Policies ─────────────────────────────────────────────────────────────

/// Polling behaviour while waiting for the export task.
///
/// The interval doubles after every non-terminal poll, up to
/// `max_poll_interval`. With the defaults that is 1 s → 2 s → 4 s → 5 s → 5 s …
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Give up after this long; `None` waits forever. Default: 15 minutes.
    pub timeout: Option<Duration>,
    /// Delay before the second poll. Default: 1 s.
    pub poll_interval: Duration,
    /// Upper bound for the doubled delay. Default: 5 s.
    pub max_poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(15 * 60)),
            poll_interval: Duration::from_secs(1),
            max_poll_interval: Duration::from_secs(5),
        }
    }
}

impl WaitPolicy {
    /// Delay to use after `polls` unfinished polls (1-based).
    pub fn delay_after(&self, polls: u32) -> Duration {
        let factor = 2u32.saturating_pow(polls.saturating_sub(1));
        self.poll_interval
            .saturating_mul(factor)
            .min(self.max_poll_interval)
    }
}

/// Behaviour when the derived output path equals the input path
/// (input already has the output extension, e.g. `a.pdf` → `a.pdf`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameExtensionPolicy {
    /// Re-convert and replace the source file in place. (default)
    ///
    /// The replacement happens by rename after the download completes, so a
    /// failed run leaves the original untouched.
    #[default]
    Overwrite,
    /// Leave such files alone; they are reported as skipped.
    Skip,
}
