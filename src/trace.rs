//! Trace correlation for log lines.
//!
//! Google front ends attach an `X-Cloud-Trace-Context: TRACE_ID/SPAN_ID;o=OPTIONS`
//! header to incoming requests. Logging the trace as
//! `projects/<project>/traces/<trace>` under [`crate::TRACE_KEY`] groups the
//! request's log lines in the console.
//! See <https://cloud.google.com/trace/docs/troubleshooting#force-trace>

/// HTTP header carrying the trace context on Google Cloud.
pub const TRACE_HEADER: &str = "X-Cloud-Trace-Context";

/// The parts of an `X-Cloud-Trace-Context` header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext<'a> {
    /// Text before the `/`.
    pub trace_id: &'a str,
    /// Text between the `/` and the first `;`, if not empty.
    pub span_id: Option<&'a str>,
    /// `true` when the options carry `o=1`.
    pub sampled: bool,
}

impl<'a> TraceContext<'a> {
    /// Parse a raw header value.
    ///
    /// # Arguments
    /// * `header` - The header value, e.g. `105445aa7843bc8bf206b120001000/0;o=1`
    ///
    /// # Returns
    /// The parsed context, or `None` when the value has no `/` or no trace id
    pub fn parse(header: &'a str) -> Option<Self> {
        let (trace_id, rest) = header.split_once('/')?;
        if trace_id.is_empty() {
            return None;
        }

        let (span_id, options) = match rest.split_once(';') {
            Some((span, options)) => (span, options),
            None => (rest, ""),
        };
        let sampled = options
            .split(';')
            .any(|option| option.trim() == "o=1");

        Some(Self {
            trace_id,
            span_id: (!span_id.is_empty()).then_some(span_id),
            sampled,
        })
    }
}

/// Builds trace names for one Google Cloud project.
///
/// An empty project id never produces a trace name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracer {
    /// Google Cloud project the traces belong to.
    pub project_id: String,
}

impl Tracer {
    /// Create a tracer for `project_id`.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    /// Build `projects/<project>/traces/<trace>` from a trace header value.
    ///
    /// # Arguments
    /// * `header` - The raw `X-Cloud-Trace-Context` value
    ///
    /// # Returns
    /// The trace name, or `None` if the project id is empty or the header
    /// does not carry a trace id
    pub fn trace_name(&self, header: &str) -> Option<String> {
        if self.project_id.is_empty() {
            return None;
        }
        let context = TraceContext::parse(header)?;
        Some(format!(
            "projects/{}/traces/{}",
            self.project_id, context.trace_id
        ))
    }
}
