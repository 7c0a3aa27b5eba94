use opensourcehire_server::sync::SyncSummary;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the sync trigger: the OAuth token the UI obtained for the user,
/// plus optional name/email fallbacks from the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub access_token: Option<String>,
    pub fallback_name: Option<String>,
    pub fallback_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub repo_count: usize,
    pub private_repo_count: usize,
    pub public_repo_count: usize,
    pub repos_with_files: usize,
}

impl From<SyncSummary> for SyncResponse {
    fn from(summary: SyncSummary) -> Self {
        Self {
            repo_count: summary.repo_count,
            private_repo_count: summary.private_repo_count,
            public_repo_count: summary.public_repo_count,
            repos_with_files: summary.repos_with_files,
        }
    }
}
