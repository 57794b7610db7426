//! In-memory session registry. Each session sits behind its own async mutex so a
//! generate or submit action runs to completion before the next one on that session
//! observes the state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::interview::session::SessionState;

pub type SharedSession = Arc<Mutex<SessionState>>;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    daily_limit: u32,
}

impl SessionStore {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            daily_limit,
        }
    }

    pub async fn create(&self) -> (Uuid, SharedSession) {
        let state = SessionState::new(self.daily_limit, Local::now().date_naive());
        let id = state.id;
        let session = Arc::new(Mutex::new(state));
        self.sessions.write().await.insert(id, session.clone());
        info!("Session {id} created");
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
