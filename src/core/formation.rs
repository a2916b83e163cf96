use crate::core::assigner::ProjectAssigner;
use crate::core::classifier::classify;
use crate::core::compatibility::{common_projects, score_common_projects};
use crate::core::discovery::SubteamDiscoverer;
use crate::core::merger::TeamMerger;
use crate::core::policy::FormationPolicy;
use crate::domain::model::{
    Assignment, MergedTeam, PreferenceMap, RequestMap, Subteam, TeamOrigin, MAX_TEAM_SIZE,
    MIN_TEAM_SIZE,
};
use crate::domain::outcome::{FormationOutcome, FormationStats};
use crate::utils::error::{FormationError, Result};
use crate::utils::quality::IssueCategory;

/// 從請求與志願到專題分配的完整流程
#[derive(Debug, Default)]
pub struct TeamFormation {
    policy: FormationPolicy,
}

impl TeamFormation {
    pub fn new(policy: FormationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FormationPolicy {
        &self.policy
    }

    pub fn run(&self, preferences: &PreferenceMap, requests: &RequestMap) -> Result<FormationOutcome> {
        let mut outcome = FormationOutcome::default();

        let discovery = SubteamDiscoverer::new(self.policy.discovery_order()).discover(requests);
        outcome.quality.extend(discovery.quality.clone());

        for (i, subteam) in discovery.complete_subteams.iter().enumerate() {
            let members = subteam.member_list();
            let scores = score_common_projects(&members, preferences);
            if scores.is_empty() {
                tracing::error!("⚠️ Subteam {} has NO common project preferences: {}", i + 1, subteam);
                outcome.quality.add(
                    IssueCategory::NoCommonPreferences,
                    format!("Subteam {}: {}", i + 1, members.join(", ")),
                );
                outcome.stats.subteams_without_common_project += 1;
            } else {
                tracing::debug!("Subteam {} {} shares {} project(s)", i + 1, subteam, scores.len());
            }
        }

        let classification = classify(&discovery)?;
        let merge = TeamMerger::new(preferences, self.policy.candidate_order())
            .merge(&classification.incomplete);

        for team in &merge.formed_teams {
            verify_merged(team, preferences)?;
        }

        let assigner = ProjectAssigner::new(preferences, self.policy.tie_break());

        // 自行組成的完整子隊沒有經過相容性檢查，沒有共同專題只算資料問題
        let mut unassignable: Vec<Subteam> = Vec::new();
        let mut complete_assigned = 0;
        for team in &classification.complete_teams {
            match assigner.assign(team.members(), TeamOrigin::Complete) {
                Ok(assignment) => {
                    outcome.assignments.push(assignment);
                    complete_assigned += 1;
                }
                Err(FormationError::NoCommonProject { members }) => {
                    tracing::error!(
                        "⚠️ Complete team has no common project and stays unassigned: {}",
                        members.join(", ")
                    );
                    unassignable.push(team.clone());
                }
                Err(e) => return Err(e),
            }
        }

        for team in &merge.formed_teams {
            let origin = TeamOrigin::Merged {
                kind: team.kind,
                source_count: team.sources.len(),
            };
            outcome.assignments.push(assigner.assign(&team.members, origin)?);
        }

        for assignment in &outcome.assignments {
            verify_assignment(assignment, preferences)?;
        }

        outcome.unmatched = unassignable;
        outcome.unmatched.extend(merge.unmatched);
        for team in &outcome.unmatched {
            outcome.quality.add(IssueCategory::Unmatched, team.to_string());
        }
        log_unmatched(&outcome);

        let incomplete = &classification.incomplete;
        outcome.stats = FormationStats {
            students: requests.len(),
            discovered_subteams: discovery.complete_subteams.len(),
            individuals: discovery.individuals.len(),
            complete_teams: complete_assigned,
            merged_teams: merge.formed_teams.len(),
            incomplete_by_size: [1, 2, 3, 4].map(|size| incomplete.by_size(size).len()),
            placed_students: outcome.assignments.iter().map(Assignment::size).sum(),
            unmatched_students: outcome.unmatched.iter().map(Subteam::size).sum(),
            subteams_without_common_project: outcome.stats.subteams_without_common_project,
        };

        tracing::info!(
            "Formed {} team(s): {} from complete subteams, {} merged; {} student(s) placed, {} unmatched",
            outcome.assignments.len(),
            complete_assigned,
            merge.formed_teams.len(),
            outcome.stats.placed_students,
            outcome.stats.unmatched_students
        );

        Ok(outcome)
    }
}

fn verify_merged(team: &MergedTeam, preferences: &PreferenceMap) -> Result<()> {
    let members: Vec<String> = team.members.iter().cloned().collect();
    if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&team.size()) {
        tracing::error!("❌ Merged team ({}) has invalid size {}", team.kind, team.size());
        return Err(FormationError::InvalidTeamSize {
            size: team.size(),
            members,
        });
    }
    if common_projects(&team.members, preferences).is_empty() {
        tracing::error!("❌ Merged team ({}) lost its common project", team.kind);
        return Err(FormationError::NoCommonProject { members });
    }
    Ok(())
}

fn verify_assignment(assignment: &Assignment, preferences: &PreferenceMap) -> Result<()> {
    if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&assignment.size()) {
        return Err(FormationError::InvalidTeamSize {
            size: assignment.size(),
            members: assignment.team_members.clone(),
        });
    }
    let everyone_ranked = assignment
        .team_members
        .iter()
        .all(|member| preferences.rank(member, &assignment.project).is_some());
    if !everyone_ranked {
        return Err(FormationError::NoCommonProject {
            members: assignment.team_members.clone(),
        });
    }
    Ok(())
}

fn log_unmatched(outcome: &FormationOutcome) {
    if outcome.unmatched.is_empty() {
        return;
    }
    let people = outcome.unmatched_students();
    tracing::warn!(
        "⚠️ Unmatched: {} subteam(s), {} student(s): {}",
        outcome.unmatched.len(),
        people.len(),
        people.iter().take(10).cloned().collect::<Vec<_>>().join(", ")
    );
    if people.len() > 10 {
        tracing::warn!("    ... and {} more", people.len() - 10);
    }
    tracing::debug!("Complete list of unmatched: {}", people.join(", "));
}
