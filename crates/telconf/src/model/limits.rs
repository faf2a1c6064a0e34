//! Limits applied to spans recorded through the tracer provider.

use serde::{Deserialize, Serialize};

/// Bounds on the size of recorded spans.
///
/// Every limit is optional; an absent limit leaves that dimension
/// unbounded. Spans carry attributes only, so the event and link limits are
/// kept for components that record those.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpanLimits {
    attribute_count_limit: Option<usize>,
    attribute_value_length_limit: Option<usize>,
    attribute_count_per_event_limit: Option<usize>,
    attribute_count_per_link_limit: Option<usize>,
    event_count_limit: Option<usize>,
    link_count_limit: Option<usize>,
}

impl SpanLimits {
    /// Creates a set of limits with every dimension unbounded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attribute_count_limit: None,
            attribute_value_length_limit: None,
            attribute_count_per_event_limit: None,
            attribute_count_per_link_limit: None,
            event_count_limit: None,
            link_count_limit: None,
        }
    }

    /// Bounds the number of attributes per span.
    #[must_use]
    pub const fn with_attribute_count_limit(mut self, limit: usize) -> Self {
        self.attribute_count_limit = Some(limit);
        self
    }

    /// Bounds the length, in characters, of string attribute values.
    #[must_use]
    pub const fn with_attribute_value_length_limit(mut self, limit: usize) -> Self {
        self.attribute_value_length_limit = Some(limit);
        self
    }

    /// Maximum number of attributes per span.
    #[must_use]
    pub const fn attribute_count_limit(&self) -> Option<usize> {
        self.attribute_count_limit
    }

    /// Maximum length of a string attribute value.
    #[must_use]
    pub const fn attribute_value_length_limit(&self) -> Option<usize> {
        self.attribute_value_length_limit
    }

    /// Maximum number of attributes per span event.
    #[must_use]
    pub const fn attribute_count_per_event_limit(&self) -> Option<usize> {
        self.attribute_count_per_event_limit
    }

    /// Maximum number of attributes per span link.
    #[must_use]
    pub const fn attribute_count_per_link_limit(&self) -> Option<usize> {
        self.attribute_count_per_link_limit
    }

    /// Maximum number of events per span.
    #[must_use]
    pub const fn event_count_limit(&self) -> Option<usize> {
        self.event_count_limit
    }

    /// Maximum number of links per span.
    #[must_use]
    pub const fn link_count_limit(&self) -> Option<usize> {
        self.link_count_limit
    }
}
