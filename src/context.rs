//! Per-request state owned by the presentation pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use crate::routing::RequestTarget;

/// Backend calls and stages whose duration is recorded per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackendCall {
    Mapping,
    Content,
    Assets,
    Search,
    ControlSha,
    Layout,
    ErrorLayout,
    Render,
}

impl BackendCall {
    /// Field name used in log events and metric labels.
    pub fn field_name(self) -> &'static str {
        match self {
            BackendCall::Mapping => "mapping_req_duration",
            BackendCall::Content => "content_req_duration",
            BackendCall::Assets => "asset_req_duration",
            BackendCall::Search => "search_req_duration",
            BackendCall::ControlSha => "control_sha_req_duration",
            BackendCall::Layout => "layout_req_duration",
            BackendCall::ErrorLayout => "error_layout_req_duration",
            BackendCall::Render => "template_render_duration",
        }
    }
}

impl fmt::Display for BackendCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Durations recorded while a request is processed.
///
/// Concurrent pipeline branches record through a shared reference.
#[derive(Debug, Default)]
pub struct Timings {
    inner: Mutex<BTreeMap<BackendCall, Duration>>,
}

impl Timings {
    pub fn record(&self, call: BackendCall, elapsed: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.insert(call, elapsed);
        }
    }

    pub fn get(&self, call: BackendCall) -> Option<Duration> {
        self.inner.lock().ok()?.get(&call).copied()
    }

    /// Recorded durations in milliseconds, keyed by field name.
    pub fn summary(&self) -> BTreeMap<&'static str, u128> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .iter()
                    .map(|(call, elapsed)| (call.field_name(), elapsed.as_millis()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Created at request entry, dropped when the response is complete.
#[derive(Debug)]
pub struct RequestContext {
    target: RequestTarget,
    request_id: String,
    pub timings: Timings,
}

impl RequestContext {
    pub fn new(target: RequestTarget, request_id: impl Into<String>) -> Self {
        Self {
            target,
            request_id: request_id.into(),
            timings: Timings::default(),
        }
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    pub fn host(&self) -> &str {
        self.target.host()
    }

    pub fn presented_path(&self) -> &str {
        self.target.presented_path()
    }

    pub fn presented_url(&self) -> String {
        self.target.presented_url()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}
