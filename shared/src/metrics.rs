use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Months, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::github::{ActivityCounters, ContributionCalendar, RemoteRepository, RepoFileSample};
use crate::streak::longest_push_streak;

/// Repositories shown in the dashboard glimpse list, most recent first.
pub const GLIMPSE_LIMIT: usize = 12;
/// Entries kept in the language distribution.
pub const LANGUAGE_LIMIT: usize = 6;
/// Repositories kept in the impact ranking.
pub const INTELLIGENCE_LIMIT: usize = 5;

/// Months with zero pushes still render as a short bar, so the chart can
/// distinguish "quiet month" from "no data at all".
const EMPTY_BAR_FLOOR: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub name: String,
    /// Rounded percentage of size-weighted language share.
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoHighlight {
    pub name: String,
    /// Composite 0-10 impact score, one decimal.
    pub impact: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoGlimpse {
    pub name: String,
    pub url: String,
    pub is_private: bool,
    pub language: String,
    pub stars: u32,
    pub updated_at: Option<DateTime<Utc>>,
    pub files: Vec<String>,
}

/// Presentation-ready dashboard numbers. A pure function of one collected
/// snapshot; nothing here carries over between syncs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub contribution_strength: u32,
    pub consistency_score: f64,
    pub consistency_bars: Vec<u32>,
    pub heatmap_weeks: Vec<Vec<u8>>,
    pub languages: Vec<LanguageShare>,
    pub repo_intelligence: Vec<RepoHighlight>,
    pub repos: Vec<RepoGlimpse>,
    pub contribution_streak: u32,
    pub primary_language: String,
}

pub fn synthesize(
    repos: &[RemoteRepository],
    counters: &ActivityCounters,
    samples: &[RepoFileSample],
    now: DateTime<Utc>,
) -> DerivedMetrics {
    let consistency_bars = monthly_push_bars(repos, now);
    let languages = language_distribution(repos);
    let repo_intelligence = repo_intelligence(repos, now);
    let primary_language = languages
        .first()
        .map(|share| share.name.clone())
        .unwrap_or_else(|| "TypeScript".to_string());

    DerivedMetrics {
        contribution_strength: contribution_strength(repos, counters, &repo_intelligence),
        consistency_score: consistency_score(&consistency_bars),
        heatmap_weeks: heatmap_levels(&counters.calendar),
        contribution_streak: longest_push_streak(
            repos
                .iter()
                .filter_map(|repo| repo.pushed_at)
                .map(|pushed| pushed.date_naive()),
        ),
        repos: repo_glimpse(repos, samples),
        consistency_bars,
        languages,
        repo_intelligence,
        primary_language,
    }
}

/// Buckets repositories by the calendar month of their last push into the
/// trailing 12 months, then normalizes each bucket to 0-100 against the
/// busiest one.
fn monthly_push_bars(repos: &[RemoteRepository], now: DateTime<Utc>) -> Vec<u32> {
    let today = now.date_naive();
    let months: Vec<(i32, u32)> = (0u32..12)
        .rev()
        .map(|back| {
            let date = today.checked_sub_months(Months::new(back)).unwrap_or(today);
            (date.year(), date.month())
        })
        .collect();

    let mut counts = vec![0u32; months.len()];
    for pushed in repos.iter().filter_map(|repo| repo.pushed_at) {
        let key = (pushed.year(), pushed.month());
        if let Some(index) = months.iter().position(|month| *month == key) {
            counts[index] += 1;
        }
    }

    normalize_bars(&counts)
}

fn normalize_bars(counts: &[u32]) -> Vec<u32> {
    let max = counts.iter().copied().max().unwrap_or(0).max(1);
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                EMPTY_BAR_FLOOR
            } else {
                ((count as f64 / max as f64) * 100.0).round() as u32
            }
        })
        .collect()
}

/// Quantizes every day against the busiest day of the whole calendar.
/// An empty calendar yields an empty grid, meaning "no heatmap data".
fn heatmap_levels(calendar: &ContributionCalendar) -> Vec<Vec<u8>> {
    if calendar.is_empty() {
        return Vec::new();
    }
    let max = calendar.max_daily_count().max(1);
    calendar
        .weeks
        .iter()
        .map(|week| week.days.iter().map(|day| day_level(day.count, max)).collect())
        .collect()
}

fn day_level(count: u32, max: u32) -> u8 {
    if count == 0 {
        return 0;
    }
    let ratio = count as f64 / max as f64;
    if ratio < 0.25 {
        1
    } else if ratio < 0.5 {
        2
    } else if ratio < 0.75 {
        3
    } else {
        4
    }
}

/// Size-weighted language share over repositories that have a detected
/// language. A zero-size repository still weighs 1 KB so it cannot vanish.
fn language_distribution(repos: &[RemoteRepository]) -> Vec<LanguageShare> {
    let mut weights: BTreeMap<&str, u64> = BTreeMap::new();
    for repo in repos {
        if let Some(language) = repo.language.as_deref() {
            *weights.entry(language).or_default() += repo.size.max(1);
        }
    }

    let total: u64 = weights.values().sum();
    if total == 0 {
        return Vec::new();
    }

    weights
        .into_iter()
        .map(|(name, weight)| LanguageShare {
            name: name.to_string(),
            value: ((weight as f64 / total as f64) * 100.0).round() as u32,
        })
        .sorted_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)))
        .take(LANGUAGE_LIMIT)
        .collect()
}

fn repo_intelligence(repos: &[RemoteRepository], now: DateTime<Utc>) -> Vec<RepoHighlight> {
    repos
        .iter()
        .map(|repo| RepoHighlight {
            name: repo.full_name.clone(),
            impact: impact_score(repo, now),
        })
        .sorted_by(|a, b| {
            b.impact
                .partial_cmp(&a.impact)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        })
        .take(INTELLIGENCE_LIMIT)
        .collect()
}

/// Blends popularity (stars, forks), nontrivial size (log-scaled so
/// megarepos cannot dominate) and push recency. The recency boost flattens
/// to zero once a repository is more than 30 days stale.
fn impact_score(repo: &RemoteRepository, now: DateTime<Utc>) -> f64 {
    let recency_boost = repo.pushed_at.map_or(0.0, |pushed| {
        let days_since_push = (now - pushed).num_days();
        30i64.saturating_sub(days_since_push).max(0) as f64
    });

    let raw = repo.stars as f64 * 0.4
        + repo.forks as f64 * 0.3
        + (repo.size.max(10) as f64).log10() * 2.0
        + recency_boost * 0.1;

    round1(raw.clamp(0.0, 10.0))
}

fn repo_glimpse(repos: &[RemoteRepository], samples: &[RepoFileSample]) -> Vec<RepoGlimpse> {
    let files: HashMap<&str, &[String]> = samples
        .iter()
        .map(|sample| (sample.full_name.as_str(), sample.paths.as_slice()))
        .collect();

    repos
        .iter()
        .sorted_by(|a, b| b.pushed_at.cmp(&a.pushed_at))
        .take(GLIMPSE_LIMIT)
        .map(|repo| RepoGlimpse {
            name: repo.full_name.clone(),
            url: repo.html_url.clone(),
            is_private: repo.is_private,
            language: repo
                .language
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            stars: repo.stars,
            updated_at: repo.pushed_at,
            files: files
                .get(repo.full_name.as_str())
                .map(|paths| paths.to_vec())
                .unwrap_or_default(),
        })
        .collect()
}

/// Weighted composite with a 15-point floor so sparse profiles never read
/// as near-zero, capped at 99.
fn contribution_strength(
    repos: &[RemoteRepository],
    counters: &ActivityCounters,
    intelligence: &[RepoHighlight],
) -> u32 {
    let private_count = repos.iter().filter(|repo| repo.is_private).count();
    let impact_sum: f64 = intelligence.iter().map(|highlight| highlight.impact).sum();

    let raw = repos.len() as f64 * 1.2
        + private_count as f64 * 1.5
        + counters.prs_merged as f64 * 0.25
        + counters.issues_closed as f64 * 0.15
        + impact_sum;

    (raw.round() as i64).clamp(15, 99) as u32
}

fn consistency_score(bars: &[u32]) -> f64 {
    let average = bars.iter().sum::<u32>() as f64 / bars.len().max(1) as f64;
    round1(average / 10.0).clamp(1.0, 10.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
