//! Canned snapshot backing `DataSource::Fixture`. Lets the rest of the app
//! be demoed without a GitHub credential; the pipeline downstream of
//! collection runs unchanged.

use chrono::{DateTime, Days, Utc};
use shared::{
    ActivityCounters, CalendarDay, CalendarWeek, ContributionCalendar, GithubViewer,
    RemoteRepository, RepoFileSample,
};

pub fn snapshot(
    now: DateTime<Utc>,
) -> (
    GithubViewer,
    Vec<RemoteRepository>,
    ActivityCounters,
    Vec<RepoFileSample>,
) {
    let viewer = GithubViewer {
        login: "demo-dev".to_string(),
        name: Some("Demo Developer".to_string()),
        bio: Some("Full-stack engineer exploring open source.".to_string()),
        email: Some("demo@opensourcehire.dev".to_string()),
        blog: Some("https://demo-dev.pages.dev".to_string()),
        html_url: "https://github.com/demo-dev".to_string(),
        avatar_url: "https://avatars.githubusercontent.com/u/0".to_string(),
        followers: 87,
        following: 34,
    };

    let repos = vec![
        repo("demo-dev/taskboard", "TypeScript", 2040, 36, 9, true, now, 1),
        repo("demo-dev/metrics-engine", "Rust", 1380, 52, 14, false, now, 2),
        repo("demo-dev/infra", "Go", 760, 11, 2, true, now, 3),
        repo("demo-dev/dotfiles", "Shell", 85, 4, 1, false, now, 9),
        repo("demo-dev/blog", "TypeScript", 430, 7, 0, false, now, 31),
        repo("demo-dev/scraper", "Python", 210, 2, 0, false, now, 80),
    ];

    let counters = ActivityCounters {
        prs_merged: 24,
        issues_closed: 11,
        code_reviews: 9,
        calendar: calendar(now),
    };

    let samples = vec![
        RepoFileSample {
            full_name: "demo-dev/taskboard".to_string(),
            paths: vec![
                "src/App.tsx".to_string(),
                "src/pages/Board.tsx".to_string(),
                "src/lib/api.ts".to_string(),
                "package.json".to_string(),
            ],
        },
        RepoFileSample {
            full_name: "demo-dev/metrics-engine".to_string(),
            paths: vec![
                "src/main.rs".to_string(),
                "src/pipeline.rs".to_string(),
                "Cargo.toml".to_string(),
            ],
        },
        RepoFileSample::empty("demo-dev/infra"),
        RepoFileSample::empty("demo-dev/dotfiles"),
        RepoFileSample::empty("demo-dev/blog"),
        RepoFileSample::empty("demo-dev/scraper"),
    ];

    (viewer, repos, counters, samples)
}

#[allow(clippy::too_many_arguments)]
fn repo(
    full_name: &str,
    language: &str,
    size: u64,
    stars: u32,
    forks: u32,
    is_private: bool,
    now: DateTime<Utc>,
    pushed_days_ago: u64,
) -> RemoteRepository {
    RemoteRepository {
        name: full_name.split('/').last().unwrap_or(full_name).to_string(),
        full_name: full_name.to_string(),
        html_url: format!("https://github.com/{full_name}"),
        is_private,
        default_branch: "main".to_string(),
        language: Some(language.to_string()),
        stars,
        forks,
        size,
        pushed_at: now.checked_sub_days(Days::new(pushed_days_ago)),
    }
}

/// 26 weeks of deterministic activity with quiet weekends, enough for the
/// heatmap to show all intensity levels.
fn calendar(now: DateTime<Utc>) -> ContributionCalendar {
    let today = now.date_naive();
    let weeks = (0..26u64)
        .rev()
        .map(|weeks_back| CalendarWeek {
            days: (0..7u64)
                .filter_map(|weekday| {
                    let back = weeks_back * 7 + (6 - weekday);
                    let date = today.checked_sub_days(Days::new(back))?;
                    let count = match weekday {
                        0 | 6 => 0,
                        d => ((weeks_back + d) % 5) as u32 + 1,
                    };
                    Some(CalendarDay { count, date })
                })
                .collect(),
        })
        .collect();

    ContributionCalendar { weeks }
}
