use crate::core::classifier::IncompleteSubteams;
use crate::core::compatibility::{common_projects, compatible};
use crate::domain::model::{
    MergeKind, MergedTeam, PreferenceMap, Subteam, SubteamId, MAX_TEAM_SIZE, MIN_TEAM_SIZE,
};
use crate::domain::ports::CandidateOrder;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub formed_teams: Vec<MergedTeam>,
    pub unmatched: Vec<Subteam>,
}

/// 將 1-4 人的子隊貪婪地合併成 5-6 人的隊伍。
///
/// 每個策略只走一次，採用第一個相容的候選（不是最佳的），
/// 且只檢查「目前組合中的聯集」與下一個候選是否相容。
/// 結果在輸入順序固定時可重現，但不保證全域最佳。
pub struct TeamMerger<'a> {
    preferences: &'a PreferenceMap,
    candidate_order: &'a dyn CandidateOrder,
}

/// 單次合併過程的狀態，跑完即丟棄
struct MergeRun<'a> {
    incomplete: &'a IncompleteSubteams,
    preferences: &'a PreferenceMap,
    used: Vec<bool>,
    formed: Vec<MergedTeam>,
}

impl<'a> MergeRun<'a> {
    fn is_used(&self, id: SubteamId) -> bool {
        self.used[id.0]
    }

    fn members(&self, id: SubteamId) -> &'a BTreeSet<String> {
        self.incomplete.get(id).members()
    }

    fn union(&self, ids: &[SubteamId]) -> BTreeSet<String> {
        ids.iter()
            .flat_map(|id| self.members(*id).iter().cloned())
            .collect()
    }

    /// 第一個未使用且與 `base` 相容的候選
    fn first_compatible(&self, base: &BTreeSet<String>, candidates: &[SubteamId]) -> Option<SubteamId> {
        candidates
            .iter()
            .copied()
            .find(|id| !self.is_used(*id) && compatible(base, self.members(*id), self.preferences))
    }

    fn commit(&mut self, ids: &[SubteamId], kind: MergeKind) {
        let members = self.union(ids);
        debug_assert!((MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&members.len()));

        let sizes: Vec<String> = ids.iter().map(|id| self.members(*id).len().to_string()).collect();
        tracing::debug!(
            "Merged size {} → team of {}",
            sizes.join(" + size "),
            members.len()
        );

        for id in ids {
            self.used[id.0] = true;
        }
        self.formed.push(MergedTeam {
            members,
            sources: ids.iter().map(|id| self.incomplete.get(*id).clone()).collect(),
            kind,
        });
    }

    /// 4+2 → 6，否則 4+1 → 5
    fn merge_fours(&mut self, fours: &[SubteamId], twos: &[SubteamId], ones: &[SubteamId]) {
        for &four in fours {
            if self.is_used(four) {
                continue;
            }
            let base = self.members(four);

            if let Some(two) = self.first_compatible(base, twos) {
                self.commit(&[four, two], MergeKind::FourPlusTwo);
            } else if let Some(one) = self.first_compatible(base, ones) {
                self.commit(&[four, one], MergeKind::FourPlusOne);
            }
        }
    }

    /// 3+3 → 6（只找後面的），否則 3+2 → 5
    fn merge_threes(&mut self, threes: &[SubteamId], twos: &[SubteamId]) {
        for (i, &three) in threes.iter().enumerate() {
            if self.is_used(three) {
                continue;
            }
            let base = self.members(three);

            if let Some(other) = self.first_compatible(base, &threes[i + 1..]) {
                self.commit(&[three, other], MergeKind::ThreePlusThree);
            } else if let Some(two) = self.first_compatible(base, twos) {
                self.commit(&[three, two], MergeKind::ThreePlusTwo);
            }
        }
    }

    /// 2+2+2 → 6，否則 2+2+1 → 5；每一步都檢查逐步累積的聯集
    fn merge_twos(&mut self, twos: &[SubteamId], ones: &[SubteamId]) {
        for (i, &first) in twos.iter().enumerate() {
            if self.is_used(first) {
                continue;
            }
            let base = self.members(first);

            if let Some((second, third)) = self.find_pair_then(base, twos, i, |run, partial, j| {
                run.first_compatible(partial, &twos[j + 1..])
            }) {
                self.commit(&[first, second, third], MergeKind::TwoTwoTwo);
                continue;
            }

            if let Some((second, single)) =
                self.find_pair_then(base, twos, i, |run, partial, _| run.first_compatible(partial, ones))
            {
                self.commit(&[first, second, single], MergeKind::TwoTwoOne);
            }
        }
    }

    /// 對 `twos[i]` 之後每個相容的 2 人子隊，用 `complete` 找最後一塊
    fn find_pair_then<F>(
        &self,
        base: &BTreeSet<String>,
        twos: &[SubteamId],
        i: usize,
        complete: F,
    ) -> Option<(SubteamId, SubteamId)>
    where
        F: Fn(&Self, &BTreeSet<String>, usize) -> Option<SubteamId>,
    {
        twos.iter()
            .enumerate()
            .skip(i + 1)
            .filter(|(_, id)| !self.is_used(**id) && compatible(base, self.members(**id), self.preferences))
            .find_map(|(j, &second)| {
                let partial: BTreeSet<String> = base.union(self.members(second)).cloned().collect();
                complete(self, &partial, j).map(|last| (second, last))
            })
    }

    /// 剩下的個人以連續視窗分組，先試 6 人再試 5 人
    fn group_individuals(&mut self, ones: &[SubteamId]) {
        loop {
            let available: Vec<SubteamId> = ones.iter().copied().filter(|id| !self.is_used(*id)).collect();
            if available.len() < MIN_TEAM_SIZE {
                break;
            }

            let window = [MAX_TEAM_SIZE, MIN_TEAM_SIZE].into_iter().find_map(|size| {
                available
                    .windows(size)
                    .find(|window| {
                        let members = window.iter().flat_map(|id| self.members(*id).iter());
                        !common_projects(members, self.preferences).is_empty()
                    })
                    .map(<[SubteamId]>::to_vec)
            });

            match window {
                Some(window) => self.commit(&window, MergeKind::Individuals(window.len())),
                None => break,
            }
        }
    }
}

impl<'a> TeamMerger<'a> {
    pub fn new(preferences: &'a PreferenceMap, candidate_order: &'a dyn CandidateOrder) -> Self {
        Self {
            preferences,
            candidate_order,
        }
    }

    pub fn merge(&self, incomplete: &IncompleteSubteams) -> MergeOutcome {
        let bucket = |size: usize| {
            let mut ids = incomplete.by_size(size).to_vec();
            self.candidate_order
                .arrange(&mut ids, incomplete.arena(), self.preferences);
            ids
        };
        let (ones, twos, threes, fours) = (bucket(1), bucket(2), bucket(3), bucket(4));

        let mut run = MergeRun {
            incomplete,
            preferences: self.preferences,
            used: vec![false; incomplete.count()],
            formed: Vec::new(),
        };

        run.merge_fours(&fours, &twos, &ones);
        run.merge_threes(&threes, &twos);
        run.merge_twos(&twos, &ones);
        run.group_individuals(&ones);

        let unmatched: Vec<Subteam> = (1..MIN_TEAM_SIZE)
            .rev()
            .flat_map(|size| incomplete.by_size(size).iter().copied())
            .filter(|id| !run.is_used(*id))
            .map(|id| incomplete.get(id).clone())
            .collect();

        tracing::info!(
            "Merging results: {} team(s) formed ({} people), {} subteam(s) unmatched ({} people)",
            run.formed.len(),
            run.formed.iter().map(MergedTeam::size).sum::<usize>(),
            unmatched.len(),
            unmatched.iter().map(Subteam::size).sum::<usize>()
        );

        MergeOutcome {
            formed_teams: run.formed,
            unmatched,
        }
    }
}
