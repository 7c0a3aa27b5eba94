use serde::Deserialize;
use shared::ContributionCalendar;

/// The 12-month contribution calendar for the viewer behind the token.
pub const CONTRIBUTION_CALENDAR_QUERY: &str = r#"
query ViewerCalendar {
  viewer {
    contributionsCollection {
      contributionCalendar {
        weeks {
          contributionDays { contributionCount date }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub total_count: u64,
}

/// `GET /repos/{full_name}/branches/{branch}`. Only the root tree SHA
/// matters here, buried a few levels down.
#[derive(Debug, Default, Deserialize)]
pub struct BranchInfo {
    #[serde(default)]
    commit: Option<BranchCommit>,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    #[serde(default)]
    commit: Option<CommitDetails>,
}

#[derive(Debug, Deserialize)]
struct CommitDetails {
    #[serde(default)]
    tree: Option<TreeRef>,
}

#[derive(Debug, Deserialize)]
struct TreeRef {
    #[serde(default)]
    sha: Option<String>,
}

impl BranchInfo {
    pub fn tree_sha(&self) -> Option<&str> {
        self.commit
            .as_ref()?
            .commit
            .as_ref()?
            .tree
            .as_ref()?
            .sha
            .as_deref()
    }
}

/// `GET /repos/{full_name}/git/trees/{sha}?recursive=1`
#[derive(Debug, Default, Deserialize)]
pub struct TreeListing {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TreeEntry {
    pub path: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl TreeListing {
    /// Blob paths in listing order, capped by the caller.
    pub fn blob_paths(self, limit: usize) -> Vec<String> {
        self.tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .filter_map(|entry| entry.path)
            .take(limit)
            .collect()
    }
}

/// One entry of the shallow `GET /repos/{full_name}/contents` listing.
#[derive(Debug, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl ContentEntry {
    pub fn is_visible(&self) -> bool {
        self.kind == "file" || self.kind == "dir"
    }
}

/// Envelope of the contribution-calendar GraphQL response. Every level is
/// optional so a partial or error-shaped body degrades to an empty calendar.
#[derive(Debug, Deserialize)]
pub struct CalendarEnvelope {
    #[serde(default)]
    data: Option<CalendarData>,
}

#[derive(Debug, Deserialize)]
struct CalendarData {
    #[serde(default)]
    viewer: Option<CalendarViewer>,
}

#[derive(Debug, Deserialize)]
struct CalendarViewer {
    #[serde(rename = "contributionsCollection", default)]
    contributions: Option<ContributionsCollection>,
}

#[derive(Debug, Deserialize)]
struct ContributionsCollection {
    #[serde(rename = "contributionCalendar", default)]
    calendar: Option<ContributionCalendar>,
}

impl CalendarEnvelope {
    pub fn into_calendar(self) -> ContributionCalendar {
        self.data
            .and_then(|data| data.viewer)
            .and_then(|viewer| viewer.contributions)
            .and_then(|contributions| contributions.calendar)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_response_exposes_the_tree_sha() {
        let branch: BranchInfo = serde_json::from_str(
            r#"{"name": "main", "commit": {"commit": {"tree": {"sha": "abc123"}}}}"#,
        )
        .unwrap();
        assert_eq!(branch.tree_sha(), Some("abc123"));

        let empty: BranchInfo = serde_json::from_str(r#"{"name": "main"}"#).unwrap();
        assert_eq!(empty.tree_sha(), None);
    }

    #[test]
    fn tree_listing_keeps_blob_paths_only() {
        let listing: TreeListing = serde_json::from_str(
            r#"{"truncated": false, "tree": [
                {"path": "src", "type": "tree"},
                {"path": "src/main.rs", "type": "blob"},
                {"path": "Cargo.toml", "type": "blob"},
                {"path": "vendored", "type": "commit"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(listing.blob_paths(10), vec!["src/main.rs", "Cargo.toml"]);
    }

    #[test]
    fn blob_paths_respect_the_cap() {
        let listing = TreeListing {
            tree: (0..100)
                .map(|i| TreeEntry {
                    path: Some(format!("file{i}.rs")),
                    kind: "blob".to_string(),
                })
                .collect(),
        };
        assert_eq!(listing.blob_paths(80).len(), 80);
    }

    #[test]
    fn calendar_envelope_unwraps_the_nested_weeks() {
        let envelope: CalendarEnvelope = serde_json::from_str(
            r#"{"data": {"viewer": {"contributionsCollection": {"contributionCalendar": {
                "weeks": [
                    {"contributionDays": [{"contributionCount": 2, "date": "2024-05-13"}]}
                ]
            }}}}}"#,
        )
        .unwrap();
        let calendar = envelope.into_calendar();
        assert_eq!(calendar.weeks.len(), 1);
        assert_eq!(calendar.weeks[0].days[0].count, 2);
    }

    #[test]
    fn malformed_envelope_degrades_to_an_empty_calendar() {
        let envelope: CalendarEnvelope =
            serde_json::from_str(r#"{"errors": [{"message": "rate limited"}]}"#).unwrap();
        assert!(envelope.into_calendar().is_empty());
    }
}
