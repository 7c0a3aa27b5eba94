use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{ActivityCounters, DerivedMetrics, GithubViewer, LanguageShare, RepoGlimpse, RepoHighlight};

/// `profile` document: who the developer is, as shown on their public page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub name: String,
    pub headline: String,
    pub bio: String,
    pub links: Vec<ProfileLink>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileLink {
    pub label: String,
    pub url: String,
}

impl ProfileDocument {
    pub fn build(
        viewer: &GithubViewer,
        metrics: &DerivedMetrics,
        fallback_name: Option<&str>,
        repo_count: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let name = viewer
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| fallback_name.map(str::to_string))
            .unwrap_or_else(|| viewer.login.clone());

        let bio = viewer
            .bio
            .clone()
            .filter(|bio| !bio.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "Building with {} across {} repositories.",
                    metrics.primary_language, repo_count
                )
            });

        let mut links = vec![ProfileLink {
            label: "GitHub".to_string(),
            url: viewer.html_url.clone(),
        }];
        if let Some(blog) = viewer.blog.as_deref().filter(|blog| !blog.is_empty()) {
            links.push(ProfileLink {
                label: "Portfolio".to_string(),
                url: blog.to_string(),
            });
        }

        Self {
            headline: format!("{} Developer", metrics.primary_language),
            name,
            bio,
            links,
            updated_at: now,
        }
    }
}

/// `dashboard` document: the synthesized metrics payload the UI renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    pub heading: String,
    pub subheading: String,
    pub contribution_strength: u32,
    pub consistency_score: f64,
    pub consistency_bars: Vec<u32>,
    pub heatmap_weeks: Vec<Vec<u8>>,
    pub collaboration: Collaboration,
    pub languages: Vec<LanguageShare>,
    pub summary: String,
    pub repo_intelligence: Vec<RepoHighlight>,
    pub repos: Vec<RepoGlimpse>,
    pub contribution_streak: u32,
    pub open_source_impact: Vec<String>,
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    pub prs_merged: u64,
    pub code_reviews: u64,
    pub issues_closed: u64,
}

impl DashboardDocument {
    pub fn build(
        display_name: String,
        metrics: &DerivedMetrics,
        counters: &ActivityCounters,
        viewer: &GithubViewer,
        private_repo_count: usize,
        public_repo_count: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let repo_count = private_repo_count + public_repo_count;

        let summary = format!(
            "{display_name} maintains {repo_count} repositories ({private_repo_count} private, \
             {public_repo_count} public) with a primary focus on {}. Contribution strength: \
             {}/100. {} PRs merged, {} issues closed, {} code reviews — strong engineering \
             collaboration signal.",
            metrics.primary_language,
            metrics.contribution_strength,
            counters.prs_merged,
            counters.issues_closed,
            counters.code_reviews,
        );

        let mut open_source_impact = vec![
            format!("{} pull requests merged across repositories.", counters.prs_merged),
            format!(
                "{private_repo_count} private repositories contributing to experience depth."
            ),
            format!(
                "{} followers, {} following on GitHub.",
                viewer.followers, viewer.following
            ),
        ];
        if counters.code_reviews > 0 {
            open_source_impact.push(format!(
                "{} pull requests reviewed — active code review culture.",
                counters.code_reviews
            ));
        }
        if metrics.contribution_streak > 1 {
            open_source_impact.push(format!(
                "{}-day contribution streak on record.",
                metrics.contribution_streak
            ));
        }

        Self {
            heading: format!("Welcome back, {display_name}"),
            subheading: format!(
                "Insights from {repo_count} repositories ({private_repo_count} private, \
                 {public_repo_count} public)."
            ),
            contribution_strength: metrics.contribution_strength,
            consistency_score: metrics.consistency_score,
            consistency_bars: metrics.consistency_bars.clone(),
            heatmap_weeks: metrics.heatmap_weeks.clone(),
            collaboration: Collaboration {
                prs_merged: counters.prs_merged,
                code_reviews: counters.code_reviews,
                issues_closed: counters.issues_closed,
            },
            languages: metrics.languages.clone(),
            summary,
            repo_intelligence: metrics.repo_intelligence.clone(),
            repos: metrics.repos.clone(),
            contribution_streak: metrics.contribution_streak,
            open_source_impact,
            synced_at: now,
        }
    }
}

/// `github` document: the identity summary linked to the account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubIdentityDocument {
    pub login: String,
    pub email: String,
    pub avatar_url: String,
    pub private_repo_count: usize,
    pub public_repo_count: usize,
    pub total_repos: usize,
    pub synced_at: DateTime<Utc>,
}

impl GithubIdentityDocument {
    pub fn build(
        viewer: &GithubViewer,
        fallback_email: Option<&str>,
        private_repo_count: usize,
        public_repo_count: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            login: viewer.login.clone(),
            email: viewer
                .email
                .clone()
                .filter(|email| !email.is_empty())
                .or_else(|| fallback_email.map(str::to_string))
                .unwrap_or_default(),
            avatar_url: viewer.avatar_url.clone(),
            private_repo_count,
            public_repo_count,
            total_repos: private_repo_count + public_repo_count,
            synced_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::{metrics::synthesize, RemoteRepository};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn viewer() -> GithubViewer {
        GithubViewer {
            login: "octocat".to_string(),
            name: None,
            bio: None,
            email: None,
            blog: Some("https://octo.dev".to_string()),
            html_url: "https://github.com/octocat".to_string(),
            avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
            followers: 12,
            following: 3,
        }
    }

    fn repos() -> Vec<RemoteRepository> {
        vec![RemoteRepository {
            name: "insights".to_string(),
            full_name: "octocat/insights".to_string(),
            html_url: "https://github.com/octocat/insights".to_string(),
            is_private: true,
            default_branch: "main".to_string(),
            language: Some("Rust".to_string()),
            stars: 4,
            forks: 1,
            size: 256,
            pushed_at: Some(now()),
        }]
    }

    #[test]
    fn profile_name_falls_back_through_viewer_then_request() {
        let metrics = synthesize(&repos(), &ActivityCounters::default(), &[], now());

        let profile = ProfileDocument::build(&viewer(), &metrics, Some("Octo Cat"), 1, now());
        assert_eq!(profile.name, "Octo Cat");
        assert_eq!(profile.headline, "Rust Developer");
        assert_eq!(profile.bio, "Building with Rust across 1 repositories.");
        assert_eq!(profile.links.len(), 2);
        assert_eq!(profile.links[1].label, "Portfolio");

        let profile = ProfileDocument::build(&viewer(), &metrics, None, 1, now());
        assert_eq!(profile.name, "octocat");
    }

    #[test]
    fn dashboard_summary_interpolates_the_counts() {
        let counters = ActivityCounters {
            prs_merged: 7,
            issues_closed: 2,
            code_reviews: 5,
            ..Default::default()
        };
        let metrics = synthesize(&repos(), &counters, &[], now());
        let dashboard = DashboardDocument::build(
            "Octo Cat".to_string(),
            &metrics,
            &counters,
            &viewer(),
            1,
            0,
            now(),
        );

        assert_eq!(dashboard.heading, "Welcome back, Octo Cat");
        assert!(dashboard.summary.contains("1 repositories (1 private, 0 public)"));
        assert!(dashboard.summary.contains("7 PRs merged"));
        assert!(dashboard
            .open_source_impact
            .iter()
            .any(|line| line.contains("5 pull requests reviewed")));
        // streak of a single push-day is 1, so no streak line
        assert!(!dashboard
            .open_source_impact
            .iter()
            .any(|line| line.contains("contribution streak")));
    }

    #[test]
    fn documents_serialize_with_camel_case_keys() {
        let counters = ActivityCounters::default();
        let metrics = synthesize(&repos(), &counters, &[], now());
        let dashboard = DashboardDocument::build(
            "Octo".to_string(),
            &metrics,
            &counters,
            &viewer(),
            1,
            0,
            now(),
        );

        let value = serde_json::to_value(&dashboard).unwrap();
        assert!(value.get("contributionStrength").is_some());
        assert!(value.get("consistencyBars").is_some());
        assert!(value.get("openSourceImpact").is_some());

        let identity = GithubIdentityDocument::build(&viewer(), Some("octo@example.com"), 1, 0, now());
        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["email"], "octo@example.com");
        assert!(value.get("avatarUrl").is_some());
        assert_eq!(value["totalRepos"], 1);
    }
}
