use crate::core::assigner::ProjectAssigner;
use crate::domain::model::{Assignment, PreferenceMap, EXPECTED_PREFERENCES};
use crate::domain::outcome::{AssignmentAnalysis, Improvement, ScoreBand, WorstAssignment};
use crate::domain::ports::ProjectTieBreak;

/// 最差名次達到這個值的隊伍需要注意
pub const LOW_CHOICE_RANK: u8 = 4;
const LOW_AVERAGE_RANK: f64 = 3.5;

pub fn analyze(
    assignments: &[Assignment],
    preferences: &PreferenceMap,
    tie_break: &dyn ProjectTieBreak,
) -> AssignmentAnalysis {
    let mut analysis = AssignmentAnalysis::default();
    for rank in 1..=EXPECTED_PREFERENCES as u8 {
        analysis.preference_counts.insert(rank, 0);
    }

    let mut rank_sum: u64 = 0;
    for assignment in assignments {
        for &rank in &assignment.individual_rankings {
            *analysis.preference_counts.entry(rank).or_insert(0) += 1;
            rank_sum += u64::from(rank);
            analysis.total_people += 1;
        }
        analysis.total_aggregate += assignment.aggregate_score;
        *analysis
            .band_counts
            .entry(ScoreBand::for_assignment(assignment))
            .or_insert(0) += 1;

        let average = assignment.average_rank();
        if assignment.max_rank() >= LOW_CHOICE_RANK || average >= LOW_AVERAGE_RANK {
            analysis.worst_assignments.push(WorstAssignment {
                project: assignment.project.clone(),
                max_rank: assignment.max_rank(),
                average_rank: average,
                aggregate_score: assignment.aggregate_score,
                team_size: assignment.size(),
                rankings: assignment.individual_rankings.clone(),
            });
        }
    }

    if analysis.total_people > 0 {
        analysis.average_rank = rank_sum as f64 / analysis.total_people as f64;
    }

    // 最差的排最前面
    analysis.worst_assignments.sort_by(|a, b| {
        b.max_rank
            .cmp(&a.max_rank)
            .then_with(|| b.average_rank.total_cmp(&a.average_rank))
    });

    // 重新驗證每隊拿到的都是同一規則下的最佳專題
    let assigner = ProjectAssigner::new(preferences, tie_break);
    for assignment in assignments {
        if let Some(best) = assigner.best_project(&assignment.team_members) {
            if best.project != assignment.project && best.aggregate_score < assignment.aggregate_score {
                analysis.improvements_possible.push(Improvement {
                    current: assignment.project.clone(),
                    better: best.project,
                    current_score: assignment.aggregate_score,
                    better_score: best.aggregate_score,
                });
            }
        }
    }

    analysis
}

pub fn log_analysis(analysis: &AssignmentAnalysis) {
    tracing::info!("--- Assignment Optimization Analysis ---");
    for (rank, count) in &analysis.preference_counts {
        let percentage = if analysis.total_people > 0 {
            *count as f64 / analysis.total_people as f64 * 100.0
        } else {
            0.0
        };
        tracing::info!("  #{} choice: {} people ({:.1}%)", rank, count, percentage);
    }
    tracing::info!("Average ranking per person: {:.2}", analysis.average_rank);
    tracing::info!("Total aggregate score: {}", analysis.total_aggregate);

    for (band, count) in &analysis.band_counts {
        tracing::info!("  {}: {} team(s)", band.label(), count);
    }

    if !analysis.worst_assignments.is_empty() {
        tracing::warn!(
            "⚠️ {} team(s) need attention",
            analysis.worst_assignments.len()
        );
        for worst in analysis.worst_assignments.iter().take(5) {
            tracing::warn!(
                "  - {}: max rank #{}, avg {:.2}, rankings {:?}",
                worst.project,
                worst.max_rank,
                worst.average_rank,
                worst.rankings
            );
        }
    }

    if analysis.improvements_possible.is_empty() {
        tracing::info!("✅ All teams assigned to their best possible project");
    } else {
        tracing::warn!(
            "⚠️ {} potential improvement(s) found",
            analysis.improvements_possible.len()
        );
    }
}
