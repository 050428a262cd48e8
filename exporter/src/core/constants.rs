// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "emf-exporter";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".emf-exporter";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "emf-exporter.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "EMF_EXPORTER_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "EMF_EXPORTER_LOG";

// =============================================================================
// Environment Variables - EMF
// =============================================================================

/// Environment variable for the metric namespace
pub const ENV_NAMESPACE: &str = "EMF_EXPORTER_NAMESPACE";

/// Environment variable for the log group name template
pub const ENV_LOG_GROUP_NAME: &str = "EMF_EXPORTER_LOG_GROUP_NAME";

/// Environment variable for the log stream name template
pub const ENV_LOG_STREAM_NAME: &str = "EMF_EXPORTER_LOG_STREAM_NAME";

/// Environment variable for the dimension rollup option
pub const ENV_DIMENSION_ROLLUP: &str = "EMF_EXPORTER_DIMENSION_ROLLUP";

/// Environment variable for EKS Fargate Container Insights enrichment
pub const ENV_EKS_FARGATE_CONTAINER_INSIGHTS: &str = "EMF_EXPORTER_EKS_FARGATE_CONTAINER_INSIGHTS";

// =============================================================================
// EMF Defaults
// =============================================================================

/// Default log group name template
pub const DEFAULT_LOG_GROUP_NAME: &str = "/metrics/default";

/// Namespace used when neither config nor resource attributes provide one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Marker substituted for placeholders that could not be resolved
pub const UNDEFINED_MARKER: &str = "undefined";

/// Label carrying the serialized Kubernetes metadata object
pub const KUBERNETES_LABEL: &str = "kubernetes";

/// Label carrying the instrumentation scope name
pub const OTEL_LIB_LABEL: &str = "OTelLib";

/// Units accepted in metric descriptors
pub const CLOUDWATCH_UNITS: &[&str] = &[
    "Seconds",
    "Microseconds",
    "Milliseconds",
    "Bytes",
    "Kilobytes",
    "Megabytes",
    "Gigabytes",
    "Terabytes",
    "Bits",
    "Kilobits",
    "Megabits",
    "Gigabits",
    "Terabits",
    "Percent",
    "Count",
    "Bytes/Second",
    "Kilobytes/Second",
    "Megabytes/Second",
    "Gigabytes/Second",
    "Terabytes/Second",
    "Bits/Second",
    "Kilobits/Second",
    "Megabits/Second",
    "Gigabits/Second",
    "Terabits/Second",
    "Count/Second",
    "None",
];
