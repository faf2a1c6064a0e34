//! Typed arguments of the well-known exporters.
//!
//! Factories for these exporters receive the usual [`ComponentArgs`] and
//! type them with [`ComponentArgs::parse`]. Durations are milliseconds.
//!
//! [`ComponentArgs`]: super::ComponentArgs
//! [`ComponentArgs::parse`]: super::ComponentArgs::parse

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Arguments of the OTLP exporter, shared by every signal.
///
/// The two metric-only preferences are absent for spans and log records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtlpExporterArgs {
    endpoint: Option<String>,
    insecure: Option<bool>,
    certificate: Option<String>,
    client_key: Option<String>,
    client_certificate: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    compression: Option<String>,
    timeout: Option<u64>,
    protocol: Option<String>,
    temporality_preference: Option<String>,
    default_histogram_aggregation: Option<String>,
}

impl OtlpExporterArgs {
    /// Collector endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Whether to skip transport security.
    #[must_use]
    pub const fn insecure(&self) -> Option<bool> {
        self.insecure
    }

    /// Trusted certificate file.
    #[must_use]
    pub fn certificate(&self) -> Option<&str> {
        self.certificate.as_deref()
    }

    /// Client private key file for mutual TLS.
    #[must_use]
    pub fn client_key(&self) -> Option<&str> {
        self.client_key.as_deref()
    }

    /// Client certificate file for mutual TLS.
    #[must_use]
    pub fn client_certificate(&self) -> Option<&str> {
        self.client_certificate.as_deref()
    }

    /// Extra request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Compression, such as `gzip`.
    #[must_use]
    pub fn compression(&self) -> Option<&str> {
        self.compression.as_deref()
    }

    /// Export timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }

    /// Wire protocol, such as `grpc` or `http/protobuf`.
    #[must_use]
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Preferred aggregation temporality for metrics.
    #[must_use]
    pub fn temporality_preference(&self) -> Option<&str> {
        self.temporality_preference.as_deref()
    }

    /// Default aggregation for histogram instruments.
    #[must_use]
    pub fn default_histogram_aggregation(&self) -> Option<&str> {
        self.default_histogram_aggregation.as_deref()
    }
}

/// Arguments of the Zipkin span exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZipkinExporterArgs {
    endpoint: Option<String>,
    timeout: Option<u64>,
}

impl ZipkinExporterArgs {
    /// Collector endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Export timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }
}

/// Arguments of the Jaeger span exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JaegerExporterArgs {
    protocol: Option<String>,
    endpoint: Option<String>,
    timeout: Option<u64>,
    user: Option<String>,
    password: Option<String>,
    agent_host: Option<String>,
    agent_port: Option<u16>,
}

impl JaegerExporterArgs {
    /// Transport, such as `http/thrift.binary` or `udp/thrift.compact`.
    #[must_use]
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// Collector endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Export timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }

    /// Collector user name.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Collector password.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Agent host for UDP transports.
    #[must_use]
    pub fn agent_host(&self) -> Option<&str> {
        self.agent_host.as_deref()
    }

    /// Agent port for UDP transports.
    #[must_use]
    pub const fn agent_port(&self) -> Option<u16> {
        self.agent_port
    }
}
