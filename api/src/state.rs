use std::sync::Arc;

use crate::approvals::ApprovalStore;
use crate::clients::prefs::PrefsClient;
use crate::clients::rag::RagClient;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rag: RagClient,
    pub prefs: PrefsClient,
    pub approvals: Arc<ApprovalStore>,
}
