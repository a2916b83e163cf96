use crate::core::compatibility::common_projects;
use crate::domain::model::{PreferenceMap, ProjectScore, RequestMap, SubteamArena, SubteamId};
use crate::domain::ports::{CandidateOrder, DiscoveryOrder, ProjectTieBreak};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 請求人數多的學生先處理，同數量時依輸入順序（穩定排序）
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestRequestFirst;

impl DiscoveryOrder for LargestRequestFirst {
    fn sequence<'a>(&self, requests: &'a RequestMap) -> Vec<&'a str> {
        let mut students: Vec<&str> = requests.students().collect();
        students.sort_by_key(|student| std::cmp::Reverse(requests.request_count(student)));
        students
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputOrder;

impl DiscoveryOrder for InputOrder {
    fn sequence<'a>(&self, requests: &'a RequestMap) -> Vec<&'a str> {
        requests.students().collect()
    }
}

/// 維持分類時的順序
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepDiscoveryOrder;

impl CandidateOrder for KeepDiscoveryOrder {
    fn arrange(&self, _ids: &mut [SubteamId], _arena: &SubteamArena, _preferences: &PreferenceMap) {}
}

/// 共同專題越少的子隊越先配對
#[derive(Debug, Clone, Copy, Default)]
pub struct MostConstrainedFirst;

impl CandidateOrder for MostConstrainedFirst {
    fn arrange(&self, ids: &mut [SubteamId], arena: &SubteamArena, preferences: &PreferenceMap) {
        ids.sort_by_cached_key(|id| common_projects(arena.get(*id).members(), preferences).len());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Lexicographic;

impl ProjectTieBreak for Lexicographic {
    fn compare(&self, a: &ProjectScore, b: &ProjectScore) -> Ordering {
        a.project.cmp(&b.project)
    }
}

/// 最差個人名次較好的專題優先，再比名稱
#[derive(Debug, Clone, Copy, Default)]
pub struct BestWorstRank;

impl ProjectTieBreak for BestWorstRank {
    fn compare(&self, a: &ProjectScore, b: &ProjectScore) -> Ordering {
        a.worst_rank()
            .cmp(&b.worst_rank())
            .then_with(|| a.project.cmp(&b.project))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryStrategy {
    #[default]
    LargestRequestFirst,
    InputOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum MergeOrderStrategy {
    #[default]
    Discovery,
    MostConstrainedFirst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakStrategy {
    #[default]
    Lexicographic,
    BestWorstRank,
}

/// 可替換的排序與平手規則；核心迴圈不隨策略改變
pub struct FormationPolicy {
    discovery_order: Box<dyn DiscoveryOrder>,
    candidate_order: Box<dyn CandidateOrder>,
    tie_break: Box<dyn ProjectTieBreak>,
}

impl FormationPolicy {
    pub fn new(
        discovery_order: Box<dyn DiscoveryOrder>,
        candidate_order: Box<dyn CandidateOrder>,
        tie_break: Box<dyn ProjectTieBreak>,
    ) -> Self {
        Self {
            discovery_order,
            candidate_order,
            tie_break,
        }
    }

    pub fn from_strategies(
        discovery: DiscoveryStrategy,
        merge_order: MergeOrderStrategy,
        tie_break: TieBreakStrategy,
    ) -> Self {
        let discovery_order: Box<dyn DiscoveryOrder> = match discovery {
            DiscoveryStrategy::LargestRequestFirst => Box::new(LargestRequestFirst),
            DiscoveryStrategy::InputOrder => Box::new(InputOrder),
        };
        let candidate_order: Box<dyn CandidateOrder> = match merge_order {
            MergeOrderStrategy::Discovery => Box::new(KeepDiscoveryOrder),
            MergeOrderStrategy::MostConstrainedFirst => Box::new(MostConstrainedFirst),
        };
        let tie_break: Box<dyn ProjectTieBreak> = match tie_break {
            TieBreakStrategy::Lexicographic => Box::new(Lexicographic),
            TieBreakStrategy::BestWorstRank => Box::new(BestWorstRank),
        };
        Self::new(discovery_order, candidate_order, tie_break)
    }

    pub fn discovery_order(&self) -> &dyn DiscoveryOrder {
        self.discovery_order.as_ref()
    }

    pub fn candidate_order(&self) -> &dyn CandidateOrder {
        self.candidate_order.as_ref()
    }

    pub fn tie_break(&self) -> &dyn ProjectTieBreak {
        self.tie_break.as_ref()
    }
}

impl Default for FormationPolicy {
    fn default() -> Self {
        Self::from_strategies(
            DiscoveryStrategy::default(),
            MergeOrderStrategy::default(),
            TieBreakStrategy::default(),
        )
    }
}

impl std::fmt::Debug for FormationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormationPolicy").finish_non_exhaustive()
    }
}
