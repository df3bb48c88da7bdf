/// Controls per-entry decision logging during tree walks and status scans.
///
/// Events are emitted through `tracing`; the installed subscriber is the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceOptions {
    pub enabled: bool,
}

impl From<&crate::TraceConfig> for TraceOptions {
    fn from(config: &crate::TraceConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }
}
