use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The GitHub identity behind the resolved credential, as returned by `GET /user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubViewer {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub blog: Option<String>,
    pub html_url: String,
    pub avatar_url: String,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
}

/// One repository snapshot from the REST listing endpoints. Snapshots are
/// fetched fresh on every sync and never merged with prior ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    #[serde(rename = "private")]
    pub is_private: bool,
    pub default_branch: String,
    pub language: Option<String>,
    #[serde(rename = "stargazers_count")]
    pub stars: u32,
    #[serde(rename = "forks_count")]
    pub forks: u32,
    /// Size in KB, a rough proxy for code volume.
    pub size: u64,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// A 12-month grid of daily contribution counts from the GraphQL
/// `contributionCalendar`. Empty when the calendar query failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContributionCalendar {
    pub weeks: Vec<CalendarWeek>,
}

impl ContributionCalendar {
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn max_daily_count(&self) -> u32 {
        self.weeks
            .iter()
            .flat_map(|week| week.days.iter())
            .map(|day| day.count)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarWeek {
    #[serde(rename = "contributionDays")]
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDay {
    #[serde(rename = "contributionCount")]
    pub count: u32,
    pub date: NaiveDate,
}

/// Search-derived activity counters plus the contribution calendar.
/// Each field degrades independently to its default on upstream failure.
#[derive(Debug, Clone, Default)]
pub struct ActivityCounters {
    pub prs_merged: u64,
    pub issues_closed: u64,
    pub code_reviews: u64,
    pub calendar: ContributionCalendar,
}

/// Best-effort file listing for one sampled repository.
#[derive(Debug, Clone)]
pub struct RepoFileSample {
    pub full_name: String,
    pub paths: Vec<String>,
}

impl RepoFileSample {
    pub fn empty(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            paths: Vec::new(),
        }
    }
}
