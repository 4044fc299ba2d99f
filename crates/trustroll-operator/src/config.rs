//! Operator configuration from flags and environment

use std::time::Duration;

use clap::{Args, ValueEnum};
use trustroll_common::config::{
    DEFAULT_BUNDLE_NAMESPACE, DEFAULT_GATEWAY_CREDENTIAL_NAME, DEFAULT_GATEWAY_NAMESPACE,
    DEFAULT_ROOT_CREDENTIAL_NAME, DEFAULT_TRUST_BUNDLE_NAME,
};
use trustroll_common::retry::RetryConfig;
use trustroll_common::telemetry::{LogConfig, LogFormat};
use trustroll_common::{AnnotationKeys, ObjectKey, RotationConfig};

/// Log output format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// One JSON object per line
    Json,
    /// Human-readable text
    Text,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Text => LogFormat::Text,
        }
    }
}

/// Settings shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct OperatorArgs {
    /// Name of the upstream root credential Secret
    #[arg(long, env = "TRUSTROLL_ROOT_NAME", default_value = DEFAULT_ROOT_CREDENTIAL_NAME)]
    pub root_name: String,

    /// Namespace of the upstream root credential Secret
    #[arg(long, env = "TRUSTROLL_ROOT_NAMESPACE", default_value = DEFAULT_GATEWAY_NAMESPACE)]
    pub root_namespace: String,

    /// Name of the trust bundle Secret
    #[arg(long, env = "TRUSTROLL_BUNDLE_NAME", default_value = DEFAULT_TRUST_BUNDLE_NAME)]
    pub bundle_name: String,

    /// Namespace of the trust bundle Secret
    #[arg(long, env = "TRUSTROLL_BUNDLE_NAMESPACE", default_value = DEFAULT_BUNDLE_NAMESPACE)]
    pub bundle_namespace: String,

    /// Name of the gateway credential Secret
    #[arg(long, env = "TRUSTROLL_GATEWAY_NAME", default_value = DEFAULT_GATEWAY_CREDENTIAL_NAME)]
    pub gateway_name: String,

    /// Namespace of the gateway credential Secret
    #[arg(long, env = "TRUSTROLL_GATEWAY_NAMESPACE", default_value = DEFAULT_GATEWAY_NAMESPACE)]
    pub gateway_namespace: String,

    /// Seconds between passes when nothing triggers one
    #[arg(long, env = "TRUSTROLL_RESYNC_SECS", default_value_t = 300)]
    pub resync_secs: u64,

    /// Seconds before retrying after a transient failure
    #[arg(long, env = "TRUSTROLL_TRANSIENT_REQUEUE_SECS", default_value_t = 10)]
    pub transient_requeue_secs: u64,

    /// Seconds before retrying after any other failure
    #[arg(long, env = "TRUSTROLL_ERROR_REQUEUE_SECS", default_value_t = 60)]
    pub error_requeue_secs: u64,

    /// Upper bound on a single pass, in seconds
    #[arg(long, env = "TRUSTROLL_PASS_TIMEOUT_SECS", default_value_t = 30)]
    pub pass_timeout_secs: u64,

    /// Attempts per pass when a write loses to a concurrent writer
    #[arg(long, env = "TRUSTROLL_CONFLICT_ATTEMPTS", default_value_t = 5)]
    pub conflict_attempts: u32,

    /// Log output format
    #[arg(long, env = "TRUSTROLL_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Json)]
    pub log_format: LogFormatArg,

    /// Log filter directive (overrides RUST_LOG)
    #[arg(long, env = "TRUSTROLL_LOG")]
    pub log_filter: Option<String>,
}

impl OperatorArgs {
    /// Object locations for the reconcilers
    pub fn rotation_config(&self) -> RotationConfig {
        RotationConfig {
            root_credential: ObjectKey::new(&self.root_name, &self.root_namespace),
            trust_bundle: ObjectKey::new(&self.bundle_name, &self.bundle_namespace),
            gateway_credential: ObjectKey::new(&self.gateway_name, &self.gateway_namespace),
            annotations: AnnotationKeys::default(),
        }
    }

    /// Timing for the watch driver
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            resync_interval: Duration::from_secs(self.resync_secs),
            transient_requeue: Duration::from_secs(self.transient_requeue_secs),
            error_requeue: Duration::from_secs(self.error_requeue_secs),
            pass_timeout: Duration::from_secs(self.pass_timeout_secs),
            conflict_retry: RetryConfig::with_max_attempts(self.conflict_attempts.max(1)),
        }
    }

    /// Logging setup
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.log_format.into(),
            filter: self.log_filter.clone(),
        }
    }
}

/// Timing for [`Driver`](crate::driver::Driver)
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Interval between passes when no watch event arrives
    pub resync_interval: Duration,
    /// Delay after a not-found or conflict failure
    pub transient_requeue: Duration,
    /// Delay after any other failure
    pub error_requeue: Duration,
    /// Upper bound on a single pass
    pub pass_timeout: Duration,
    /// Redo policy for passes that lost a conditional write
    pub conflict_retry: RetryConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            resync_interval: Duration::from_secs(300),
            transient_requeue: Duration::from_secs(10),
            error_requeue: Duration::from_secs(60),
            pass_timeout: Duration::from_secs(30),
            conflict_retry: RetryConfig::with_max_attempts(5),
        }
    }
}
