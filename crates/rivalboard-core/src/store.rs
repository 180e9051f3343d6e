//! Reducer-style dashboard state: the single container behind the dashboard,
//! competitor, and results pages. Mutations go through [`Action`] values so
//! the invariants (unique competitor ids, selection only referencing live
//! competitors, active analysis always resolvable) live in one place.

use crate::analysis::{
    mock_analysis, mock_insights, mock_results, AnalysisParameters, AnalysisRun, AnalysisStatus,
};
use crate::competitors::{Competitor, CompetitorDraft, CompetitorPatch};

/// Name of the pre-seeded sample analysis shown on first load.
pub const SAMPLE_ANALYSIS_NAME: &str = "Sample analysis (example data)";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// Newest first.
    pub competitors: Vec<Competitor>,
    /// Newest first.
    pub analyses: Vec<AnalysisRun>,
    pub selected_competitor_ids: Vec<i64>,
    pub active_analysis_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Action {
    CompetitorAdd(CompetitorDraft),
    CompetitorBulkAdd(Vec<CompetitorDraft>),
    /// Swap in an authoritative competitor list (e.g. reloaded from the
    /// database). Selection is pruned to ids that still exist.
    CompetitorReplaceAll(Vec<Competitor>),
    CompetitorUpdate { id: i64, patch: CompetitorPatch },
    CompetitorDelete { id: i64 },
    SelectToggle { id: i64 },
    SelectAll { ids: Vec<i64> },
    AnalysisCreateDraft {
        id: String,
        name: String,
        competitor_ids: Vec<i64>,
        parameters: AnalysisParameters,
    },
    AnalysisSetActive { id: Option<String> },
    AnalysisCompleteMock { id: String },
}

impl DashboardState {
    /// An empty dashboard over the given competitor list.
    #[must_use]
    pub fn new(competitors: Vec<Competitor>) -> Self {
        Self {
            competitors,
            analyses: Vec::new(),
            selected_competitor_ids: Vec::new(),
            active_analysis_id: None,
        }
    }

    /// The first-load demo state: first two competitors selected and one
    /// pre-completed sample analysis so the results pages render immediately.
    #[must_use]
    pub fn seeded(competitors: Vec<Competitor>) -> Self {
        let all_ids: Vec<i64> = competitors.iter().map(|c| c.id).collect();
        let selected: Vec<i64> = all_ids.iter().copied().take(2).collect();
        let analyses = if all_ids.is_empty() {
            Vec::new()
        } else {
            vec![mock_analysis(SAMPLE_ANALYSIS_NAME, &all_ids)]
        };
        Self {
            competitors,
            analyses,
            selected_competitor_ids: selected,
            active_analysis_id: None,
        }
    }

    #[must_use]
    pub fn competitor(&self, id: i64) -> Option<&Competitor> {
        self.competitors.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn analysis(&self, id: &str) -> Option<&AnalysisRun> {
        self.analyses.iter().find(|a| a.id == id)
    }

    /// Next locally assigned competitor id. `max + 1` rather than "first id
    /// plus one": after a replace-all the list may no longer be id-ordered.
    fn next_competitor_id(&self) -> i64 {
        self.competitors.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::CompetitorAdd(draft) => {
                let id = self.next_competitor_id();
                self.competitors.insert(0, draft.into_competitor(id));
            }
            Action::CompetitorBulkAdd(drafts) => {
                let base = self.next_competitor_id();
                for (offset, draft) in drafts.into_iter().enumerate() {
                    let id = base + i64::try_from(offset).unwrap_or(0);
                    self.competitors.insert(offset, draft.into_competitor(id));
                }
            }
            Action::CompetitorReplaceAll(items) => {
                self.competitors = items;
                self.prune_selection();
            }
            Action::CompetitorUpdate { id, patch } => {
                if let Some(competitor) = self.competitors.iter_mut().find(|c| c.id == id) {
                    patch.apply_to(competitor);
                }
            }
            Action::CompetitorDelete { id } => {
                self.competitors.retain(|c| c.id != id);
                self.selected_competitor_ids.retain(|&s| s != id);
            }
            Action::SelectToggle { id } => {
                if self.competitor(id).is_none() {
                    return;
                }
                if let Some(pos) = self.selected_competitor_ids.iter().position(|&s| s == id) {
                    self.selected_competitor_ids.remove(pos);
                } else {
                    self.selected_competitor_ids.push(id);
                }
            }
            Action::SelectAll { ids } => {
                let mut next = Vec::with_capacity(ids.len());
                for id in ids {
                    if self.competitor(id).is_some() && !next.contains(&id) {
                        next.push(id);
                    }
                }
                self.selected_competitor_ids = next;
            }
            Action::AnalysisCreateDraft {
                id,
                name,
                competitor_ids,
                parameters,
            } => {
                if self.analysis(&id).is_some() {
                    return;
                }
                self.analyses.insert(
                    0,
                    AnalysisRun {
                        id,
                        name,
                        created_at: chrono::Utc::now(),
                        status: AnalysisStatus::Draft,
                        competitor_ids,
                        parameters,
                        results: None,
                        insights: None,
                    },
                );
            }
            Action::AnalysisSetActive { id } => {
                let next = id.filter(|candidate| self.analysis(candidate).is_some());
                self.active_analysis_id = next;
            }
            Action::AnalysisCompleteMock { id } => {
                if let Some(run) = self.analyses.iter_mut().find(|a| a.id == id) {
                    let results = mock_results(&run.competitor_ids);
                    let insights = mock_insights(&run.competitor_ids, &results);
                    run.results = Some(results);
                    run.insights = Some(insights);
                    run.status = AnalysisStatus::Completed;
                }
            }
        }
    }

    fn prune_selection(&mut self) {
        let competitors = &self.competitors;
        self.selected_competitor_ids
            .retain(|id| competitors.iter().any(|c| c.id == *id));
        // dedupe while preserving order
        let mut seen = Vec::new();
        self.selected_competitor_ids.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
    }
}
