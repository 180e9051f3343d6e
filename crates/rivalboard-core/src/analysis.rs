//! Analysis runs and the mock comparison engine.
//!
//! Scores and insights are demo data, not a real analytics computation: every
//! value is derived deterministically from the sum of the selected competitor
//! ids, so the same selection always renders the same charts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed feature dimensions compared across competitors.
pub const FEATURE_KEYS: [&str; 6] = [
    "Free trial",
    "API access",
    "Team collaboration",
    "Custom reports",
    "Integrations",
    "SLA / enterprise support",
];

/// Which analysis dimensions a run covers. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct AnalysisParameters {
    pub pricing: bool,
    pub features: bool,
    pub marketing: bool,
    pub audience: bool,
    pub tech_stack: bool,
    pub content: bool,
    pub social: bool,
    pub reviews: bool,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            pricing: true,
            features: true,
            marketing: true,
            audience: true,
            tech_stack: true,
            content: true,
            social: true,
            reviews: true,
        }
    }
}

/// Per-competitor comparison scores (0-100 per dimension) plus a monthly
/// price point and a feature-presence map over [`FEATURE_KEYS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorResult {
    pub competitor_id: i64,
    pub pricing_score: u8,
    pub feature_score: u8,
    pub marketing_score: u8,
    pub audience_score: u8,
    pub tech_score: u8,
    pub content_score: u8,
    pub social_score: u8,
    pub reviews_score: u8,
    pub price_monthly_usd: i64,
    pub features: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

impl InsightPriority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InsightPriority::High => "High",
            InsightPriority::Medium => "Medium",
            InsightPriority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightCategory {
    #[serde(rename = "Feature gaps")]
    FeatureGaps,
    #[serde(rename = "Pricing opportunities")]
    PricingOpportunities,
    #[serde(rename = "Messaging angles")]
    MessagingAngles,
    #[serde(rename = "Underserved segments")]
    UnderservedSegments,
}

impl InsightCategory {
    /// The label used both in JSON payloads and in the `insights` table.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InsightCategory::FeatureGaps => "Feature gaps",
            InsightCategory::PricingOpportunities => "Pricing opportunities",
            InsightCategory::MessagingAngles => "Messaging angles",
            InsightCategory::UnderservedSegments => "Underserved segments",
        }
    }
}

/// A templated recommendation derived from the mock comparison data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub category: InsightCategory,
    pub title: String,
    pub priority: InsightPriority,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Draft,
    Running,
    Completed,
}

/// A named, parameterized comparison over a set of competitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: AnalysisStatus,
    pub competitor_ids: Vec<i64>,
    pub parameters: AnalysisParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<CompetitorResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<Vec<Insight>>,
}

/// Allocate an id for a new run.
#[must_use]
pub fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generate deterministic mock results for a competitor selection.
///
/// Every competitor lands in a 30-89 base band with per-dimension offsets and
/// is guaranteed at least one feature gap, so the insight templates always
/// have something to point at.
#[must_use]
pub fn mock_results(competitor_ids: &[i64]) -> Vec<CompetitorResult> {
    let seed: i64 = competitor_ids.iter().sum::<i64>().max(1);
    let key_count = i64::try_from(FEATURE_KEYS.len()).unwrap_or(1);

    competitor_ids
        .iter()
        .enumerate()
        .map(|(idx, &id)| {
            let idx = i64::try_from(idx).unwrap_or(0);
            let base = (seed + id * 17 + idx * 23).rem_euclid(60) + 30;
            let price = 29 + (seed + id * 11).rem_euclid(8) * 20;

            let mut features = BTreeMap::new();
            for (i, key) in FEATURE_KEYS.iter().enumerate() {
                let i = i64::try_from(i).unwrap_or(0);
                let present = (seed + id * 7 + i * 13).rem_euclid(3) != 0;
                features.insert((*key).to_string(), present);
            }
            // Force at least one gap per competitor.
            let gap = usize::try_from((id + seed).rem_euclid(key_count)).unwrap_or(0);
            features.insert(FEATURE_KEYS[gap].to_string(), false);

            CompetitorResult {
                competitor_id: id,
                pricing_score: clamp_score(base + 3),
                feature_score: clamp_score(base + 8),
                marketing_score: clamp_score(base + if id % 2 != 0 { 12 } else { -4 }),
                audience_score: clamp_score(base + 2),
                tech_score: clamp_score(base + if id % 3 != 0 { 6 } else { -6 }),
                content_score: clamp_score(base + if id % 2 != 0 { -2 } else { 10 }),
                social_score: clamp_score(base + if id % 2 != 0 { 7 } else { -3 }),
                reviews_score: clamp_score(base + 1),
                price_monthly_usd: price,
                features,
            }
        })
        .collect()
}

/// Derive the four templated insights from a result set: the most commonly
/// missing feature drives the gap recommendation, the average price drives
/// the pricing one.
#[must_use]
pub fn mock_insights(competitor_ids: &[i64], results: &[CompetitorResult]) -> Vec<Insight> {
    let top_gap = FEATURE_KEYS
        .iter()
        .map(|key| {
            let missing = results
                .iter()
                .filter(|r| r.features.get(*key) == Some(&false))
                .count();
            (*key, missing)
        })
        .filter(|(_, missing)| *missing > 0)
        .max_by_key(|(_, missing)| *missing)
        .map_or("Team collaboration", |(key, _)| key);

    let avg_price = if results.is_empty() {
        0.0
    } else {
        let total: i64 = results.iter().map(|r| r.price_monthly_usd).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg = total as f64 / results.len() as f64;
        avg
    };
    #[allow(clippy::cast_possible_truncation)]
    let low_price = ((avg_price * 0.8).round() as i64).max(19);

    let ids = competitor_ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-");

    vec![
        Insight {
            id: format!("ins-{ids}-gap"),
            category: InsightCategory::FeatureGaps,
            title: format!("Differentiate with \"{top_gap}\""),
            priority: InsightPriority::High,
            recommendation: format!(
                "Multiple competitors lack \"{top_gap}\". Make it a headline feature and show it in your first-run experience."
            ),
        },
        Insight {
            id: format!("ins-{ids}-pricing"),
            category: InsightCategory::PricingOpportunities,
            title: format!("Win mid-market with a ${low_price}/mo plan"),
            priority: InsightPriority::Medium,
            recommendation: "Offer a clear mid-tier price point with key features, and keep enterprise add-ons separate.".to_string(),
        },
        Insight {
            id: format!("ins-{ids}-messaging"),
            category: InsightCategory::MessagingAngles,
            title: "Lead with time-to-value".to_string(),
            priority: InsightPriority::Medium,
            recommendation: "Competitors emphasize features; you can emphasize speed, setup simplicity, and measurable outcomes.".to_string(),
        },
        Insight {
            id: format!("ins-{ids}-segments"),
            category: InsightCategory::UnderservedSegments,
            title: "Target teams with lightweight compliance needs".to_string(),
            priority: InsightPriority::Low,
            recommendation: "Create a simple compliance checklist and templates to attract regulated SMBs without enterprise complexity.".to_string(),
        },
    ]
}

/// Build a fully completed mock run over the given selection.
#[must_use]
pub fn mock_analysis(name: &str, competitor_ids: &[i64]) -> AnalysisRun {
    let results = mock_results(competitor_ids);
    let insights = mock_insights(competitor_ids, &results);
    AnalysisRun {
        id: new_run_id(),
        name: name.to_string(),
        created_at: Utc::now(),
        status: AnalysisStatus::Completed,
        competitor_ids: competitor_ids.to_vec(),
        parameters: AnalysisParameters::default(),
        results: Some(results),
        insights: Some(insights),
    }
}

fn clamp_score(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_are_deterministic_for_a_fixed_id_set() {
        let ids = [1, 2, 3];
        assert_eq!(mock_results(&ids), mock_results(&ids));

        let a = mock_insights(&ids, &mock_results(&ids));
        let b = mock_insights(&ids, &mock_results(&ids));
        assert_eq!(a, b);
    }

    #[test]
    fn different_selections_produce_different_results() {
        assert_ne!(mock_results(&[1, 2, 3]), mock_results(&[4, 5, 6]));
    }

    #[test]
    fn scores_stay_in_range() {
        for r in mock_results(&[1, 2, 3, 10, 99, 1000]) {
            for score in [
                r.pricing_score,
                r.feature_score,
                r.marketing_score,
                r.audience_score,
                r.tech_score,
                r.content_score,
                r.social_score,
                r.reviews_score,
            ] {
                assert!(score <= 100);
            }
            assert!(r.price_monthly_usd >= 29);
            assert!(r.price_monthly_usd <= 169);
        }
    }

    #[test]
    fn every_competitor_has_at_least_one_feature_gap() {
        for r in mock_results(&[1, 2, 3, 7, 42]) {
            assert!(
                r.features.values().any(|present| !present),
                "competitor {} has no gap",
                r.competitor_id
            );
            assert_eq!(r.features.len(), FEATURE_KEYS.len());
        }
    }

    #[test]
    fn insights_cover_all_four_categories() {
        let ids = [1, 2, 3];
        let insights = mock_insights(&ids, &mock_results(&ids));
        assert_eq!(insights.len(), 4);
        assert_eq!(insights[0].category, InsightCategory::FeatureGaps);
        assert_eq!(insights[1].category, InsightCategory::PricingOpportunities);
        assert_eq!(insights[2].category, InsightCategory::MessagingAngles);
        assert_eq!(insights[3].category, InsightCategory::UnderservedSegments);
        assert!(insights[0].id.starts_with("ins-1-2-3-"));
    }

    #[test]
    fn gap_insight_names_a_feature_that_is_actually_missing() {
        let ids = [3, 8, 21];
        let results = mock_results(&ids);
        let insights = mock_insights(&ids, &results);
        let title = &insights[0].title;
        let named = FEATURE_KEYS
            .iter()
            .find(|key| title.contains(*key))
            .expect("gap insight names a known feature");
        assert!(results
            .iter()
            .any(|r| r.features.get(*named) == Some(&false)));
    }

    #[test]
    fn low_price_suggestion_never_drops_below_floor() {
        // Empty results average to zero; the suggestion still floors at 19.
        let insights = mock_insights(&[], &[]);
        assert!(insights[1].title.contains("$19/mo"));
    }

    #[test]
    fn mock_analysis_is_completed_with_results_and_insights() {
        let run = mock_analysis("Sample", &[1, 2, 3]);
        assert_eq!(run.status, AnalysisStatus::Completed);
        assert_eq!(run.competitor_ids, vec![1, 2, 3]);
        assert_eq!(run.results.as_ref().map(Vec::len), Some(3));
        assert_eq!(run.insights.as_ref().map(Vec::len), Some(4));
        assert_eq!(run.parameters, AnalysisParameters::default());
    }

    #[test]
    fn parameters_serde_defaults_to_all_enabled() {
        let parsed: AnalysisParameters = serde_json::from_str("{\"pricing\": false}")
            .expect("partial parameters parse");
        assert!(!parsed.pricing);
        assert!(parsed.features);
        assert!(parsed.reviews);
    }

    #[test]
    fn insight_category_uses_display_labels_in_json() {
        let json = serde_json::to_string(&InsightCategory::FeatureGaps).expect("serialize");
        assert_eq!(json, "\"Feature gaps\"");
    }
}
