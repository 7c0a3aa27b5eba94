use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::collect;
use crate::db::types::{DashboardDocument, GithubIdentityDocument, ProfileDocument};
use crate::db::DB;
use crate::fixture;
use crate::github::{GithubClient, GithubError};
use crate::token::{NoCredential, TokenResolver};

/// Where the snapshot comes from: the live GitHub API, or the built-in demo
/// fixture that bypasses the network entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Live,
    Fixture,
}

/// Pipeline-level failures. Everything below this tier degrades in place
/// instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    NoCredential(#[from] NoCredential),
    #[error("failed to build github client")]
    Client(#[source] anyhow::Error),
    #[error("github viewer lookup failed")]
    Viewer(#[from] GithubError),
    #[error("failed to persist synthesized documents")]
    Persistence(#[source] anyhow::Error),
}

/// Best-effort counts reported back to the caller after a successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub repo_count: usize,
    pub private_repo_count: usize,
    pub public_repo_count: usize,
    pub repos_with_files: usize,
}

/// Serializes sync triggers per identity: a duplicate trigger while one is
/// in flight coalesces to a no-op instead of queueing.
#[derive(Debug, Default)]
pub struct SyncGuard {
    in_flight: Mutex<HashSet<String>>,
}

/// Held while a sync runs. Release is tied to drop, so a sync that panics
/// or bails early cannot leave its identity locked out.
#[derive(Debug)]
pub struct SyncPermit<'a> {
    guard: &'a SyncGuard,
    identity: String,
}

impl SyncGuard {
    /// None when a sync for this identity is already running.
    pub fn acquire(&self, identity: &str) -> Option<SyncPermit<'_>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string())
            .then(|| SyncPermit {
                guard: self,
                identity: identity.to_string(),
            })
    }
}

impl Drop for SyncPermit<'_> {
    fn drop(&mut self) {
        self.guard
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.identity);
    }
}

/// Process-level sync configuration, threaded through Rocket state. The
/// fallback credential lives here explicitly instead of in ambient globals.
#[derive(Debug, Default)]
pub struct SyncContext {
    pub fallback_token: Option<String>,
    pub source: DataSource,
    pub guard: SyncGuard,
}

impl SyncContext {
    pub fn new(fallback_token: Option<String>, source: DataSource) -> Self {
        Self {
            fallback_token: fallback_token.filter(|token| !token.is_empty()),
            source,
            guard: SyncGuard::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions<'a> {
    pub identity: &'a str,
    pub access_token: Option<&'a str>,
    pub fallback_name: Option<&'a str>,
    pub fallback_email: Option<&'a str>,
}

/// The full pipeline: resolve credential, collect the snapshot, synthesize
/// metrics, and persist the three documents. Collectors degrade on their
/// own; only a missing credential, a failed viewer lookup, or the final
/// write aborts the sync, leaving previously persisted data untouched.
#[instrument(skip(db, context, options), fields(identity = options.identity))]
pub async fn run_sync(
    db: &DB,
    context: &SyncContext,
    options: SyncOptions<'_>,
) -> Result<SyncSummary, SyncError> {
    let now = Utc::now();

    let (viewer, repos, counters, samples) = match context.source {
        DataSource::Fixture => {
            info!("serving fixture snapshot instead of live github data");
            fixture::snapshot(now)
        }
        DataSource::Live => {
            let resolver =
                TokenResolver::new(options.access_token, context.fallback_token.as_deref())?;
            let client = GithubClient::new(&resolver).map_err(SyncError::Client)?;

            let viewer = collect::viewer(&client).await?;
            info!("syncing github insights for {}", viewer.login);

            let (repos, counters) = tokio::join!(
                collect::repositories(&client, &viewer.login),
                collect::activity(&client, &viewer.login),
            );
            let samples = collect::file_samples(&client, &repos).await;
            (viewer, repos, counters, samples)
        }
    };

    let metrics = shared::metrics::synthesize(&repos, &counters, &samples, now);

    let private_repo_count = repos.iter().filter(|repo| repo.is_private).count();
    let public_repo_count = repos.len() - private_repo_count;
    let repos_with_files = metrics
        .repos
        .iter()
        .filter(|glimpse| !glimpse.files.is_empty())
        .count();

    let profile = ProfileDocument::build(&viewer, &metrics, options.fallback_name, repos.len(), now);
    let dashboard = DashboardDocument::build(
        profile.name.clone(),
        &metrics,
        &counters,
        &viewer,
        private_repo_count,
        public_repo_count,
        now,
    );
    let identity = GithubIdentityDocument::build(
        &viewer,
        options.fallback_email,
        private_repo_count,
        public_repo_count,
        now,
    );

    db.upsert_documents(options.identity, &profile, &dashboard, &identity)
        .await
        .map_err(SyncError::Persistence)?;

    info!(
        "sync finished for {}: {} repositories ({} private, {} public), {} with file samples",
        viewer.login,
        repos.len(),
        private_repo_count,
        public_repo_count,
        repos_with_files
    );

    Ok(SyncSummary {
        repo_count: repos.len(),
        private_repo_count,
        public_repo_count,
        repos_with_files,
    })
}
