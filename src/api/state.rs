use chrono::{DateTime, Utc};

use crate::meeting::MeetingRegistry;

#[derive(Clone)]
pub struct AppState {
    pub meetings: MeetingRegistry,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(meetings: MeetingRegistry) -> Self {
        Self {
            meetings,
            started_at: Utc::now(),
        }
    }
}
