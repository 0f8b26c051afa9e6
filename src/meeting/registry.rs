//! Open meeting views, keyed by meeting id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use super::{JoinRequest, Meeting, MeetingError, MeetingInfo};
use crate::attendance::FaceVerifier;
use crate::capture::CaptureDevice;
use crate::config::RollcallConfig;
use crate::storage::Pool;

/// What every meeting view is built from.
#[derive(Clone)]
pub struct MeetingDeps {
    pub pool: Pool,
    pub device: Arc<dyn CaptureDevice>,
    pub verifier: Arc<dyn FaceVerifier>,
    pub config: Arc<RollcallConfig>,
}

#[derive(Clone)]
pub struct MeetingRegistry {
    deps: MeetingDeps,
    meetings: Arc<RwLock<HashMap<String, Meeting>>>,
}

impl MeetingRegistry {
    pub fn new(deps: MeetingDeps) -> Self {
        Self {
            deps,
            meetings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate the join form and open a view for it. A view already open
    /// under the same meeting id is left and replaced.
    pub async fn open(&self, req: JoinRequest) -> Result<Meeting, MeetingError> {
        let req = req.validate()?;
        let meeting = Meeting::open(MeetingInfo::from_request(req, Utc::now()), self.deps.clone())?;

        let previous = self
            .meetings
            .write()
            .await
            .insert(meeting.id().to_string(), meeting.clone());
        if let Some(previous) = previous {
            info!(meeting_id = %previous.id(), "replacing open meeting view");
            previous.leave();
        }
        Ok(meeting)
    }

    pub async fn get(&self, meeting_id: &str) -> Option<Meeting> {
        self.meetings.read().await.get(meeting_id).cloned()
    }

    /// Leave and forget a meeting view. Returns `false` if none was open.
    pub async fn close(&self, meeting_id: &str) -> bool {
        match self.meetings.write().await.remove(meeting_id) {
            Some(meeting) => {
                meeting.leave();
                true
            }
            None => false,
        }
    }

    pub async fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.meetings.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
