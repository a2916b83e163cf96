use crate::core::compatibility::score_common_projects;
use crate::domain::model::{Assignment, PreferenceMap, ProjectScore, TeamOrigin};
use crate::domain::ports::ProjectTieBreak;
use crate::utils::error::{FormationError, Result};
use std::collections::BTreeSet;

/// 為完成的隊伍挑選總分最低的共同專題
pub struct ProjectAssigner<'a> {
    preferences: &'a PreferenceMap,
    tie_break: &'a dyn ProjectTieBreak,
}

impl<'a> ProjectAssigner<'a> {
    pub fn new(preferences: &'a PreferenceMap, tie_break: &'a dyn ProjectTieBreak) -> Self {
        Self {
            preferences,
            tie_break,
        }
    }

    /// 所有共同專題，最佳的排在最前面
    pub fn rank_projects(&self, members: &[String]) -> Vec<ProjectScore> {
        let mut scores = score_common_projects(members, self.preferences);
        scores.sort_by(|a, b| {
            a.aggregate_score
                .cmp(&b.aggregate_score)
                .then_with(|| self.tie_break.compare(a, b))
        });
        scores
    }

    pub fn best_project(&self, members: &[String]) -> Option<ProjectScore> {
        self.rank_projects(members).into_iter().next()
    }

    pub fn assign(&self, members: &BTreeSet<String>, origin: TeamOrigin) -> Result<Assignment> {
        let team_members: Vec<String> = members.iter().cloned().collect();
        let best = self
            .best_project(&team_members)
            .ok_or_else(|| FormationError::NoCommonProject {
                members: team_members.clone(),
            })?;

        if best.worst_rank() >= 4 {
            tracing::debug!(
                "{} → {} (some members got #4 or #5 choice: {:?})",
                team_members.join(", "),
                best.project,
                best.rankings
            );
        } else {
            tracing::debug!("{} → {} (score {})", team_members.join(", "), best.project, best.aggregate_score);
        }

        Ok(Assignment {
            team_members,
            project: best.project,
            aggregate_score: best.aggregate_score,
            individual_rankings: best.rankings,
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::{BestWorstRank, Lexicographic};

    fn members(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_aggregate_score_and_rankings() {
        let prefs = PreferenceMap::new()
            .with_student("a", &[("P1", 1), ("P2", 2)])
            .with_student("b", &[("P1", 1), ("P2", 1)])
            .with_student("c", &[("P1", 1), ("P2", 5)])
            .with_student("d", &[("P1", 2), ("P2", 3)])
            .with_student("e", &[("P1", 3), ("P2", 4)]);

        let assigner = ProjectAssigner::new(&prefs, &Lexicographic);
        let assignment = assigner
            .assign(&members(&["a", "b", "c", "d", "e"]), TeamOrigin::Complete)
            .unwrap();

        assert_eq!(assignment.project, "P1");
        assert_eq!(assignment.aggregate_score, 8);
        assert_eq!(assignment.individual_rankings, vec![1, 1, 1, 2, 3]);
        assert_eq!(assignment.team_members, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_assigned_score_is_minimal() {
        let prefs = PreferenceMap::new()
            .with_student("a", &[("X", 3), ("Y", 1), ("Z", 2)])
            .with_student("b", &[("X", 1), ("Y", 2), ("Z", 5)]);

        let assigner = ProjectAssigner::new(&prefs, &Lexicographic);
        let team = members(&["a", "b"]);
        let assignment = assigner.assign(&team, TeamOrigin::Complete).unwrap();

        let member_list: Vec<String> = team.into_iter().collect();
        for score in score_common_projects(&member_list, &prefs) {
            assert!(assignment.aggregate_score <= score.aggregate_score);
        }
        assert_eq!(assignment.project, "Y");
    }

    #[test]
    fn test_ties_use_the_configured_rule() {
        let prefs = PreferenceMap::new()
            .with_student("a", &[("Beta", 3), ("Alpha", 1)])
            .with_student("b", &[("Beta", 3), ("Alpha", 5)]);
        let team = members(&["a", "b"]);

        let lexicographic = ProjectAssigner::new(&prefs, &Lexicographic)
            .assign(&team, TeamOrigin::Complete)
            .unwrap();
        let best_worst = ProjectAssigner::new(&prefs, &BestWorstRank)
            .assign(&team, TeamOrigin::Complete)
            .unwrap();

        assert_eq!(lexicographic.project, "Alpha");
        assert_eq!(best_worst.project, "Beta");
        assert_eq!(lexicographic.aggregate_score, best_worst.aggregate_score);
    }

    #[test]
    fn test_no_common_project_is_an_error() {
        let prefs = PreferenceMap::new()
            .with_student("a", &[("X", 1)])
            .with_student("b", &[("Y", 1)]);

        let err = ProjectAssigner::new(&prefs, &Lexicographic)
            .assign(&members(&["a", "b"]), TeamOrigin::Complete)
            .unwrap_err();
        assert!(matches!(err, FormationError::NoCommonProject { ref members } if members.len() == 2));
    }
}
