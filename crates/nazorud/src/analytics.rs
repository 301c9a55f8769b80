use crate::state_machine::AnalyticsEvent;
use tracing::info;

/// Fire-and-forget sink for usage events.
pub trait AnalyticsHook: Send {
    fn record(&self, event: &AnalyticsEvent);
}

/// Records events as structured log lines on the `nazorud::analytics` target.
pub struct LogHook;

impl AnalyticsHook for LogHook {
    fn record(&self, event: &AnalyticsEvent) {
        info!(
            target: "nazorud::analytics",
            action = event.action,
            event_category = %event.category,
            "event"
        );
    }
}

/// Hand an event to the hook if one is installed.
pub fn emit(hook: Option<&dyn AnalyticsHook>, event: &AnalyticsEvent) {
    if let Some(hook) = hook {
        hook.record(event);
    }
}
