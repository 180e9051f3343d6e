//! Competitor records: the tracked business entities the dashboard compares.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitorStatus {
    #[default]
    Active,
    Inactive,
}

impl CompetitorStatus {
    /// Parse a free-form status string. Anything that is not `inactive`
    /// (case-insensitive) counts as active, matching how CSV imports and
    /// API payloads have always been treated.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("inactive") {
            CompetitorStatus::Inactive
        } else {
            CompetitorStatus::Active
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompetitorStatus::Active => "active",
            CompetitorStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for CompetitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked competitor. `id` is assigned by the store or the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: i64,
    pub name: String,
    pub website_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub facebook_url: Option<String>,
    pub reddit_url: Option<String>,
    pub discord_url: Option<String>,
    pub industry: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub status: CompetitorStatus,
}

/// A competitor waiting for an id: form input, a bulk-paste line, or a CSV row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorDraft {
    pub name: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub reddit_url: Option<String>,
    #[serde(default)]
    pub discord_url: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub status: CompetitorStatus,
}

impl CompetitorDraft {
    /// True when the draft names a real competitor after trimming.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Attach an id, producing a full [`Competitor`].
    #[must_use]
    pub fn into_competitor(self, id: i64) -> Competitor {
        Competitor {
            id,
            name: self.name,
            website_url: self.website_url,
            twitter_url: self.twitter_url,
            instagram_url: self.instagram_url,
            facebook_url: self.facebook_url,
            reddit_url: self.reddit_url,
            discord_url: self.discord_url,
            industry: self.industry,
            description: self.description,
            logo_url: self.logo_url,
            status: self.status,
        }
    }
}

/// Sparse update for a competitor.
///
/// Outer `None` = "not in request" (keep current), `Some(None)` = "explicitly
/// cleared", `Some(Some(v))` = "set to value" (PATCH semantics). Serde folds
/// a JSON `null` on a plain `Option<Option<T>>` field into the outer `None`,
/// so each clearable field routes through [`double_option`] to keep "present
/// but null" distinct from "absent".
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompetitorPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub website_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub twitter_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub instagram_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub facebook_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub reddit_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub discord_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
    pub status: Option<CompetitorStatus>,
}

/// Deserialize a field that was present in the document, mapping `null` to
/// `Some(None)` instead of `None`.
#[allow(clippy::option_option)]
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CompetitorPatch {
    /// Overlay the patch onto an existing record.
    pub fn apply_to(&self, competitor: &mut Competitor) {
        if let Some(ref name) = self.name {
            competitor.name = name.clone();
        }
        overlay(&mut competitor.website_url, &self.website_url);
        overlay(&mut competitor.twitter_url, &self.twitter_url);
        overlay(&mut competitor.instagram_url, &self.instagram_url);
        overlay(&mut competitor.facebook_url, &self.facebook_url);
        overlay(&mut competitor.reddit_url, &self.reddit_url);
        overlay(&mut competitor.discord_url, &self.discord_url);
        overlay(&mut competitor.industry, &self.industry);
        overlay(&mut competitor.description, &self.description);
        overlay(&mut competitor.logo_url, &self.logo_url);
        if let Some(status) = self.status {
            competitor.status = status;
        }
    }
}

#[allow(clippy::option_option)]
fn overlay(target: &mut Option<String>, patch: &Option<Option<String>>) {
    if let Some(value) = patch {
        target.clone_from(value);
    }
}

// ---------------------------------------------------------------------------
// Demo seed data
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub competitors: Vec<CompetitorDraft>,
}

/// Load demo competitors from a YAML seed file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, or if any
/// entry has a blank name.
pub fn load_seed_file(path: &Path) -> Result<Vec<CompetitorDraft>, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedFileRead {
        path: display.clone(),
        source,
    })?;
    let file: SeedFile =
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::SeedFileParse {
            path: display.clone(),
            source,
        })?;
    validate_seed(&file.competitors).map_err(|reason| ConfigError::SeedFileInvalid {
        path: display,
        reason,
    })?;
    Ok(file.competitors)
}

fn validate_seed(drafts: &[CompetitorDraft]) -> Result<(), String> {
    if drafts.is_empty() {
        return Err("no competitors listed".to_string());
    }
    for (i, draft) in drafts.iter().enumerate() {
        if !draft.has_name() {
            return Err(format!("competitor #{} has a blank name", i + 1));
        }
    }
    Ok(())
}

/// The builtin demo set used when no seed file is present.
#[must_use]
pub fn builtin_demo_competitors() -> Vec<CompetitorDraft> {
    vec![
        CompetitorDraft {
            name: "Acme Analytics".to_string(),
            website_url: Some("https://acme-analytics.example".to_string()),
            industry: Some("Analytics".to_string()),
            description: Some(
                "Strong dashboards, premium pricing, enterprise focus.".to_string(),
            ),
            ..CompetitorDraft::default()
        },
        CompetitorDraft {
            name: "BrightCRM".to_string(),
            website_url: Some("https://brightcrm.example".to_string()),
            industry: Some("CRM".to_string()),
            description: Some("Affordable, lots of integrations, simpler UI.".to_string()),
            ..CompetitorDraft::default()
        },
        CompetitorDraft {
            name: "Nimbus MarketIQ".to_string(),
            website_url: Some("https://nimbus-marketiq.example".to_string()),
            industry: Some("Marketing".to_string()),
            description: Some(
                "Great messaging and content, weaker reporting depth.".to_string(),
            ),
            ..CompetitorDraft::default()
        },
    ]
}
