use crate::core::discovery::Discovery;
use crate::domain::model::{Subteam, SubteamArena, SubteamId, MAX_TEAM_SIZE, MIN_TEAM_SIZE};
use crate::utils::error::{FormationError, Result};

/// 大小 1..=4 的子隊，存在 arena 中並依大小分桶
#[derive(Debug, Clone, Default)]
pub struct IncompleteSubteams {
    arena: SubteamArena,
    by_size: [Vec<SubteamId>; MIN_TEAM_SIZE - 1],
}

impl IncompleteSubteams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 子隊必須是 1..=4 人
    pub fn push(&mut self, subteam: Subteam) -> SubteamId {
        let size = subteam.size();
        debug_assert!((1..MIN_TEAM_SIZE).contains(&size));
        let id = self.arena.push(subteam);
        self.by_size[size - 1].push(id);
        id
    }

    pub fn arena(&self) -> &SubteamArena {
        &self.arena
    }

    pub fn by_size(&self, size: usize) -> &[SubteamId] {
        match size {
            1..MIN_TEAM_SIZE => &self.by_size[size - 1],
            _ => &[],
        }
    }

    pub fn get(&self, id: SubteamId) -> &Subteam {
        self.arena.get(id)
    }

    pub fn count(&self) -> usize {
        self.arena.len()
    }

    pub fn people(&self) -> usize {
        (1..MIN_TEAM_SIZE)
            .map(|size| size * self.by_size(size).len())
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub complete_teams: Vec<Subteam>,
    pub incomplete: IncompleteSubteams,
}

/// 5-6 人直接成隊，1-4 人待合併，個人視為 1 人子隊
pub fn classify(discovery: &Discovery) -> Result<Classification> {
    let mut classification = Classification::default();

    for subteam in &discovery.complete_subteams {
        match subteam.size() {
            MIN_TEAM_SIZE..=MAX_TEAM_SIZE => classification.complete_teams.push(subteam.clone()),
            1..MIN_TEAM_SIZE => {
                classification.incomplete.push(subteam.clone());
            }
            size => {
                tracing::error!("❌ Subteam of invalid size {}: {}", size, subteam);
                return Err(FormationError::InvalidSubteamSize {
                    size,
                    members: subteam.member_list(),
                });
            }
        }
    }

    for individual in &discovery.individuals {
        classification
            .incomplete
            .push(Subteam::singleton(individual.clone()));
    }

    tracing::info!(
        "Complete teams (size 5-6): {} ({} people)",
        classification.complete_teams.len(),
        classification
            .complete_teams
            .iter()
            .map(Subteam::size)
            .sum::<usize>()
    );
    for size in 1..MIN_TEAM_SIZE {
        let count = classification.incomplete.by_size(size).len();
        if count > 0 {
            tracing::info!("  Size {}: {} subteam(s) ({} people)", size, count, count * size);
        }
    }

    Ok(classification)
}
