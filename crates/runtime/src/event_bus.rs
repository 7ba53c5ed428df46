/// What a notice means for the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// Shown to the user as an alert (e.g. geolocation denied).
    Alert,
    /// One view is running without its data; the rest keep working.
    Degraded,
}

/// Notice emitted during a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub generation: u64,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, generation: u64, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            NoticeKind::Alert => tracing::info!(generation, "alert: {message}"),
            NoticeKind::Degraded => tracing::warn!(generation, "degraded: {message}"),
        }
        self.events.push(Event {
            generation,
            kind,
            message,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
