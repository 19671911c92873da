use std::env;

/// What the notification job does when a sweep hits an unexpected error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the error and remove the job; an administrator has to re-enable the service
    #[default]
    FailStop,
    /// Leave the failing event unmarked and continue with the rest of the sweep
    SkipEvent,
}

impl FailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fail-stop" | "fail_stop" | "stop" => Some(Self::FailStop),
            "skip-event" | "skip_event" | "skip" => Some(Self::SkipEvent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Resume a persisted notification job on startup
    pub resume_on_start: bool,
    pub failure_policy: FailurePolicy,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            resume_on_start: env::var("REMINDER_SCHEDULER_RESUME")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            failure_policy: env::var("REMINDER_NOTIFY_FAILURE_POLICY")
                .ok()
                .and_then(|v| FailurePolicy::parse(&v))
                .unwrap_or_default(),
        }
    }
}
