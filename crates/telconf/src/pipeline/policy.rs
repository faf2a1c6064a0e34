//! Per-record rules a provider applies before handing items to its stages.

use regex::Regex;
use tracing::{debug, warn};

use crate::component::{MeterScope, MetricPoint, SpanData};
use crate::model::{Aggregation, SignalSpec, SpanLimits, ViewSpec};

/// Span limits and metric views of one signal.
///
/// Views are tried in declared order and the first one selecting a point
/// rewrites it; a view whose aggregation is `drop` discards the point.
#[derive(Debug, Clone, Default)]
pub struct RecordPolicy {
    span_limits: SpanLimits,
    views: Vec<SelectedView>,
}

#[derive(Debug, Clone)]
struct SelectedView {
    name: Option<Regex>,
    spec: ViewSpec,
}

impl RecordPolicy {
    /// Creates a policy that leaves every item unchanged.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            span_limits: SpanLimits::new(),
            views: Vec::new(),
        }
    }

    /// Derives the policy declared by `spec`.
    ///
    /// A view whose instrument name pattern cannot be compiled is skipped
    /// with a warning.
    #[must_use]
    pub fn from_spec(spec: &SignalSpec) -> Self {
        let views = spec
            .views()
            .iter()
            .enumerate()
            .filter_map(|(index, view)| {
                let pattern = view.selector().instrument_name();
                match pattern.map(wildcard).transpose() {
                    Ok(name) => Some(SelectedView {
                        name,
                        spec: view.clone(),
                    }),
                    Err(error) => {
                        warn!(view = index, %error, "skipping view with unusable instrument name");
                        None
                    }
                }
            })
            .collect();
        Self {
            span_limits: *spec.span_limits(),
            views,
        }
    }

    /// Returns the span limits.
    #[must_use]
    pub const fn span_limits(&self) -> &SpanLimits {
        &self.span_limits
    }

    pub(crate) fn limit_span(&self, mut span: SpanData) -> Option<SpanData> {
        span.apply_limits(&self.span_limits);
        Some(span)
    }

    pub(crate) fn view_metric(&self, mut point: MetricPoint) -> Option<MetricPoint> {
        let Some(view) = self.views.iter().find(|view| view.selects(&point)) else {
            return Some(point);
        };
        let stream = view.spec.stream();
        if stream.aggregation().is_some_and(Aggregation::is_drop) {
            debug!(instrument = point.name(), "metric point dropped by view");
            return None;
        }
        point.apply_view(stream);
        Some(point)
    }
}

impl SelectedView {
    fn selects(&self, point: &MetricPoint) -> bool {
        let selector = self.spec.selector();
        let meter = point.meter();
        self.name.as_ref().is_none_or(|name| name.is_match(point.name()))
            && criterion(selector.instrument_type(), point.instrument_type())
            && criterion(selector.meter_name(), meter.map(MeterScope::name))
            && criterion(selector.meter_version(), meter.and_then(MeterScope::version))
            && criterion(selector.meter_schema_url(), meter.and_then(MeterScope::schema_url))
    }
}

/// An absent criterion matches anything; a present one needs an equal value.
fn criterion(expected: Option<&str>, actual: Option<&str>) -> bool {
    expected.is_none_or(|wanted| actual == Some(wanted))
}

/// Compiles an instrument name pattern where `*` matches any run of
/// characters and `?` exactly one.
fn wildcard(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("^");
    for symbol in pattern.chars() {
        match symbol {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source)
}
