use crate::domain::model::{Assignment, PreferenceMap, Rank, RequestMap, Subteam};
use crate::utils::quality::QualityReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurveySummary {
    pub rows: usize,
    pub students: usize,
    pub project_columns: usize,
    pub member_columns: usize,
    pub students_with_requests: usize,
    pub total_request_entries: usize,
    /// 請求人數 -> 學生數
    pub request_size_distribution: BTreeMap<usize, usize>,
}

/// 問卷匯入後的結果
#[derive(Debug, Clone, Default)]
pub struct SurveyData {
    pub roster: Vec<String>,
    pub projects: Vec<String>,
    pub preferences: PreferenceMap,
    pub requests: RequestMap,
    pub summary: SurveySummary,
    pub quality: QualityReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormationStats {
    pub students: usize,
    pub discovered_subteams: usize,
    pub individuals: usize,
    pub complete_teams: usize,
    pub merged_teams: usize,
    /// 索引 0..4 對應大小 1..=4
    pub incomplete_by_size: [usize; 4],
    pub placed_students: usize,
    pub unmatched_students: usize,
    pub subteams_without_common_project: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormationOutcome {
    pub assignments: Vec<Assignment>,
    pub unmatched: Vec<Subteam>,
    pub stats: FormationStats,
    pub quality: QualityReport,
}

impl FormationOutcome {
    pub fn unmatched_students(&self) -> Vec<String> {
        let mut students: Vec<String> = self
            .unmatched
            .iter()
            .flat_map(|team| team.members().iter().cloned())
            .collect();
        students.sort();
        students
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Perfect,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn for_assignment(assignment: &Assignment) -> Self {
        let average = assignment.average_rank();
        if assignment.aggregate_score as usize == assignment.size() {
            ScoreBand::Perfect
        } else if average <= 2.0 {
            ScoreBand::Excellent
        } else if average <= 3.0 {
            ScoreBand::Good
        } else if average <= 4.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Perfect => "Perfect (all #1)",
            ScoreBand::Excellent => "Excellent (avg 1.0-2.0 per person)",
            ScoreBand::Good => "Good (avg 2.0-3.0 per person)",
            ScoreBand::Fair => "Fair (avg 3.0-4.0 per person)",
            ScoreBand::Poor => "Poor (avg 4.0+ per person)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorstAssignment {
    pub project: String,
    pub max_rank: Rank,
    pub average_rank: f64,
    pub aggregate_score: u32,
    pub team_size: usize,
    pub rankings: Vec<Rank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Improvement {
    pub current: String,
    pub better: String,
    pub current_score: u32,
    pub better_score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentAnalysis {
    pub preference_counts: BTreeMap<Rank, usize>,
    pub total_people: usize,
    pub average_rank: f64,
    pub total_aggregate: u32,
    pub band_counts: BTreeMap<ScoreBand, usize>,
    pub worst_assignments: Vec<WorstAssignment>,
    pub improvements_possible: Vec<Improvement>,
}

/// 一次完整執行的產出，交給輸出層
#[derive(Debug, Clone, Serialize)]
pub struct FormationResult {
    pub generated_at: DateTime<Utc>,
    pub survey: SurveySummary,
    pub outcome: FormationOutcome,
    pub analysis: AssignmentAnalysis,
}
