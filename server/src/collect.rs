use std::collections::HashSet;
use std::future::Future;

use futures::future::join_all;
use shared::metrics::GLIMPSE_LIMIT;
use shared::{ActivityCounters, ContributionCalendar, GithubViewer, RemoteRepository, RepoFileSample};
use tracing::{debug, info, instrument, warn};

use crate::github::{
    BranchInfo, CalendarEnvelope, ContentEntry, GithubClient, GithubError, SearchHits, TreeListing,
    CONTRIBUTION_CALENDAR_QUERY,
};

const PAGE_SIZE: usize = 100;
/// Hard cap on listing pagination, so a misbehaving upstream cannot keep us
/// walking pages forever.
const PAGE_CAP: u32 = 10;
/// How many of the glimpse-listed repositories get a file listing fetched.
const SAMPLE_LIMIT: usize = 8;
const TREE_PATH_LIMIT: usize = 80;
const SHALLOW_ENTRY_LIMIT: usize = 20;

pub async fn viewer(client: &GithubClient) -> Result<GithubViewer, GithubError> {
    client.rest("/user").await
}

/// Repositories visible to the login, de-duplicated by qualified name.
/// The privileged listing (owned + collaborator + org-member, private
/// included) is tried first; on failure the public listing for the same
/// login is paged with the same discipline. Both failing yields an empty
/// set, which degrades the sync instead of aborting it.
#[instrument(skip(client))]
pub async fn repositories(client: &GithubClient, login: &str) -> Vec<RemoteRepository> {
    listing_with_fallback(
        |page| {
            let route = format!(
                "/user/repos?visibility=all&affiliation=owner,collaborator,organization_member&sort=updated&per_page={PAGE_SIZE}&page={page}"
            );
            async move { client.rest(&route).await }
        },
        |page| {
            let route =
                format!("/users/{login}/repos?sort=updated&per_page={PAGE_SIZE}&page={page}");
            async move { client.rest(&route).await }
        },
    )
    .await
}

async fn listing_with_fallback<P, PF, S, SF>(privileged: P, public: S) -> Vec<RemoteRepository>
where
    P: Fn(u32) -> PF,
    PF: Future<Output = Result<Vec<RemoteRepository>, GithubError>>,
    S: Fn(u32) -> SF,
    SF: Future<Output = Result<Vec<RemoteRepository>, GithubError>>,
{
    match paginate(privileged).await {
        Ok(repos) => {
            info!("fetched {} repositories via the privileged listing", repos.len());
            repos
        }
        Err(err) => {
            warn!("privileged repository listing failed ({err}), falling back to public listing");
            match paginate(public).await {
                Ok(repos) => {
                    info!("fetched {} public repositories via fallback", repos.len());
                    repos
                }
                Err(err) => {
                    warn!("public repository listing failed as well ({err}), continuing without repositories");
                    Vec::new()
                }
            }
        }
    }
}

async fn paginate<F, Fut>(fetch: F) -> Result<Vec<RemoteRepository>, GithubError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Vec<RemoteRepository>, GithubError>>,
{
    let mut seen = HashSet::new();
    let mut repos = Vec::new();

    for page in 1..=PAGE_CAP {
        let batch = fetch(page).await?;
        let batch_len = batch.len();
        for repo in batch {
            if seen.insert(repo.full_name.clone()) {
                repos.push(repo);
            }
        }
        if batch_len < PAGE_SIZE {
            break;
        }
    }

    Ok(repos)
}

/// Three bounded search counts and the contribution calendar, fetched
/// concurrently. Every leg collapses failure to its safe default: search
/// quota exhaustion must not abort the sync.
#[instrument(skip(client))]
pub async fn activity(client: &GithubClient, login: &str) -> ActivityCounters {
    counters_from(
        search_count(client, format!("author:{login} is:pr is:merged")),
        search_count(client, format!("author:{login} is:issue is:closed")),
        search_count(client, format!("reviewed-by:{login} is:pr")),
        contribution_calendar(client),
    )
    .await
}

async fn counters_from<F1, F2, F3, C>(
    prs: F1,
    issues: F2,
    reviews: F3,
    calendar: C,
) -> ActivityCounters
where
    F1: Future<Output = Result<u64, GithubError>>,
    F2: Future<Output = Result<u64, GithubError>>,
    F3: Future<Output = Result<u64, GithubError>>,
    C: Future<Output = ContributionCalendar>,
{
    let (prs_merged, issues_closed, code_reviews, calendar) =
        tokio::join!(prs, issues, reviews, calendar);

    ActivityCounters {
        prs_merged: count_or_zero("merged PRs", prs_merged),
        issues_closed: count_or_zero("closed issues", issues_closed),
        code_reviews: count_or_zero("reviewed PRs", code_reviews),
        calendar,
    }
}

async fn search_count(client: &GithubClient, query: String) -> Result<u64, GithubError> {
    let endpoint = format!("/search/issues?q={}&per_page=1", query.replace(' ', "+"));
    let hits: SearchHits = client.rest(&endpoint).await?;
    Ok(hits.total_count)
}

fn count_or_zero(label: &str, result: Result<u64, GithubError>) -> u64 {
    result.unwrap_or_else(|err| {
        warn!("search for {label} skipped: {err}");
        0
    })
}

async fn contribution_calendar(client: &GithubClient) -> ContributionCalendar {
    match client
        .graphql::<CalendarEnvelope>(CONTRIBUTION_CALENDAR_QUERY)
        .await
    {
        Ok(envelope) => envelope.into_calendar(),
        Err(err) => {
            warn!("contribution calendar skipped: {err}");
            ContributionCalendar::default()
        }
    }
}

/// File listings for the most recently pushed repositories. Only the first
/// `SAMPLE_LIMIT` fan out actual requests; the rest of the glimpse list gets
/// an empty sample by design, keeping the request count bounded against
/// rate limits.
#[instrument(skip(client, repos))]
pub async fn file_samples(client: &GithubClient, repos: &[RemoteRepository]) -> Vec<RepoFileSample> {
    let mut recent: Vec<&RemoteRepository> = repos.iter().collect();
    recent.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
    recent.truncate(GLIMPSE_LIMIT);

    let futures = recent.into_iter().enumerate().map(|(index, repo)| async move {
        if index < SAMPLE_LIMIT {
            RepoFileSample {
                full_name: repo.full_name.clone(),
                paths: repo_paths(client, repo).await,
            }
        } else {
            RepoFileSample::empty(repo.full_name.clone())
        }
    });

    join_all(futures).await
}

async fn repo_paths(client: &GithubClient, repo: &RemoteRepository) -> Vec<String> {
    match sampled_paths(client, repo).await {
        Ok(paths) => paths,
        Err(err) => {
            warn!("file listing skipped for {}: {err}", repo.full_name);
            Vec::new()
        }
    }
}

/// Recursive tree first; when the tree SHA cannot be resolved, the fetch
/// fails, or it yields no blobs, fall back to the shallow contents listing.
async fn sampled_paths(
    client: &GithubClient,
    repo: &RemoteRepository,
) -> Result<Vec<String>, GithubError> {
    match recursive_paths(client, repo).await {
        Ok(paths) if !paths.is_empty() => return Ok(paths),
        Ok(_) => debug!("no blob paths for {}, trying shallow contents", repo.full_name),
        Err(err) => debug!("tree listing failed for {} ({err}), trying shallow contents", repo.full_name),
    }

    shallow_paths(client, repo).await
}

async fn recursive_paths(
    client: &GithubClient,
    repo: &RemoteRepository,
) -> Result<Vec<String>, GithubError> {
    let branch: BranchInfo = client
        .rest(&format!(
            "/repos/{}/branches/{}",
            repo.full_name, repo.default_branch
        ))
        .await?;

    let Some(sha) = branch.tree_sha() else {
        return Ok(Vec::new());
    };

    let listing: TreeListing = client
        .rest(&format!(
            "/repos/{}/git/trees/{sha}?recursive=1",
            repo.full_name
        ))
        .await?;

    Ok(listing.blob_paths(TREE_PATH_LIMIT))
}

async fn shallow_paths(
    client: &GithubClient,
    repo: &RemoteRepository,
) -> Result<Vec<String>, GithubError> {
    let entries: Vec<ContentEntry> = client
        .rest(&format!(
            "/repos/{}/contents?ref={}",
            repo.full_name, repo.default_branch
        ))
        .await?;

    Ok(entries
        .into_iter()
        .filter(ContentEntry::is_visible)
        .map(|entry| entry.name)
        .take(SHALLOW_ENTRY_LIMIT)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::future::ready;

    fn repo(full_name: &str) -> RemoteRepository {
        RemoteRepository {
            name: full_name.split('/').next_back().unwrap().to_string(),
            full_name: full_name.to_string(),
            html_url: format!("https://github.com/{full_name}"),
            is_private: false,
            default_branch: "main".to_string(),
            language: None,
            stars: 0,
            forks: 0,
            size: 1,
            pushed_at: None,
        }
    }

    fn rejected(status: u16) -> GithubError {
        GithubError::Upstream {
            status,
            endpoint: "/test".to_string(),
        }
    }

    #[test]
    fn failed_privileged_listing_falls_back_to_the_public_one() {
        let repos = block_on(listing_with_fallback(
            |_page| ready(Err::<Vec<RemoteRepository>, _>(rejected(403))),
            |page| {
                let batch = if page == 1 {
                    vec![repo("dev/a"), repo("dev/b")]
                } else {
                    Vec::new()
                };
                ready(Ok(batch))
            },
        ));

        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].full_name, "dev/a");
        assert_eq!(repos[1].full_name, "dev/b");
    }

    #[test]
    fn both_listings_failing_degrade_to_an_empty_set() {
        let repos = block_on(listing_with_fallback(
            |_page| ready(Err::<Vec<RemoteRepository>, _>(rejected(500))),
            |_page| ready(Err::<Vec<RemoteRepository>, _>(rejected(404))),
        ));
        assert!(repos.is_empty());
    }

    #[test]
    fn pagination_dedupes_and_stops_at_the_cap() {
        let calls = Cell::new(0u32);
        let repos = block_on(paginate(|page| {
            calls.set(calls.get() + 1);
            // full pages overlapping by half, so duplicates show up
            let start = (page - 1) * 50;
            let batch: Vec<_> = (start..start + PAGE_SIZE as u32)
                .map(|i| repo(&format!("dev/r{i}")))
                .collect();
            ready(Ok(batch))
        }))
        .unwrap();

        assert_eq!(calls.get(), PAGE_CAP);
        assert_eq!(repos.len(), 50 * PAGE_CAP as usize + 50);
    }

    #[test]
    fn a_short_page_ends_the_listing() {
        let calls = Cell::new(0u32);
        let repos = block_on(paginate(|_page| {
            calls.set(calls.get() + 1);
            ready(Ok(vec![repo("dev/only")]))
        }))
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(repos.len(), 1);
    }

    #[test]
    fn failed_searches_collapse_to_zero_counters() {
        let counters = block_on(counters_from(
            ready(Err::<u64, _>(rejected(422))),
            ready(Err::<u64, _>(rejected(403))),
            ready(Err::<u64, _>(rejected(500))),
            ready(ContributionCalendar::default()),
        ));

        assert_eq!(counters.prs_merged, 0);
        assert_eq!(counters.issues_closed, 0);
        assert_eq!(counters.code_reviews, 0);
        assert!(counters.calendar.is_empty());
    }

    #[test]
    fn partial_search_failure_keeps_the_successful_counts() {
        let counters = block_on(counters_from(
            ready(Ok(12u64)),
            ready(Err::<u64, _>(rejected(403))),
            ready(Ok(4u64)),
            ready(ContributionCalendar::default()),
        ));

        assert_eq!(counters.prs_merged, 12);
        assert_eq!(counters.issues_closed, 0);
        assert_eq!(counters.code_reviews, 4);
    }
}
