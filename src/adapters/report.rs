use crate::adapters::output::format_members;
use crate::core::analysis::LOW_CHOICE_RANK;
use crate::domain::model::{Assignment, Rank};
use crate::domain::outcome::FormationResult;
use std::fmt::{self, Write};

const RULE_WIDTH: usize = 70;

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn rankings(ranks: &[Rank]) -> String {
    let list: Vec<String> = ranks.iter().map(Rank::to_string).collect();
    format!("[{}]", list.join(", "))
}

/// 產生文字報告
pub fn render_report(result: &FormationResult) -> String {
    let mut out = String::new();
    // 寫入 String 不會失敗
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &FormationResult) -> fmt::Result {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let outcome = &result.outcome;
    let analysis = &result.analysis;

    writeln!(out, "{}", heavy)?;
    writeln!(out, "TEAM FORMATION SUMMARY REPORT")?;
    writeln!(out, "Generated: {}", result.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "{}\n", heavy)?;

    let placed = outcome.stats.placed_students;
    let unmatched = outcome.stats.unmatched_students;
    let total = placed + unmatched;
    writeln!(out, "OVERALL STATISTICS")?;
    writeln!(out, "{}", light)?;
    writeln!(out, "Total students: {}", total)?;
    writeln!(out, "Students successfully placed: {} ({:.1}%)", placed, percent(placed, total))?;
    writeln!(out, "Students unmatched: {} ({:.1}%)", unmatched, percent(unmatched, total))?;
    writeln!(out, "Total teams formed: {}", outcome.assignments.len())?;
    writeln!(
        out,
        "  From complete subteams: {}, merged: {}\n",
        outcome.stats.complete_teams, outcome.stats.merged_teams
    )?;

    writeln!(out, "PREFERENCE SATISFACTION DISTRIBUTION")?;
    writeln!(out, "{}", light)?;
    for (band, count) in &analysis.band_counts {
        if *count > 0 {
            writeln!(out, "  {}: {} team(s)", band.label(), count)?;
        }
    }
    let low_choice: Vec<&Assignment> = outcome
        .assignments
        .iter()
        .filter(|a| a.max_rank() >= LOW_CHOICE_RANK)
        .collect();
    if !low_choice.is_empty() {
        writeln!(out, "\nTeams with members who got #4 or #5 choices: {}", low_choice.len())?;
        for assignment in low_choice {
            writeln!(out, "  - {}: highest rank = #{}", assignment.project, assignment.max_rank())?;
        }
    }
    writeln!(out)?;

    writeln!(out, "ASSIGNMENT OPTIMIZATION ANALYSIS")?;
    writeln!(out, "{}", light)?;
    writeln!(out, "Individual Preference Satisfaction:")?;
    for (rank, count) in &analysis.preference_counts {
        writeln!(
            out,
            "  #{} choice: {} people ({:.1}%)",
            rank,
            count,
            percent(*count, analysis.total_people)
        )?;
    }
    writeln!(out, "\nAverage ranking per person: {:.2}", analysis.average_rank)?;
    writeln!(out, "Total aggregate score: {}", analysis.total_aggregate)?;
    if !analysis.worst_assignments.is_empty() {
        writeln!(
            out,
            "\nAssignments Needing Attention ({} team(s)):",
            analysis.worst_assignments.len()
        )?;
        for worst in analysis.worst_assignments.iter().take(5) {
            writeln!(
                out,
                "  - {}: max rank #{}, avg {:.2}, rankings {}",
                worst.project,
                worst.max_rank,
                worst.average_rank,
                rankings(&worst.rankings)
            )?;
        }
    }
    writeln!(out, "\nOptimality Status:")?;
    if analysis.improvements_possible.is_empty() {
        writeln!(out, "  ✓ All teams assigned to their best possible project")?;
    } else {
        writeln!(
            out,
            "  ⚠ {} potential improvement(s) found",
            analysis.improvements_possible.len()
        )?;
        for improvement in analysis.improvements_possible.iter().take(3) {
            writeln!(
                out,
                "    - {} → {} (score {} → {})",
                improvement.current,
                improvement.better,
                improvement.current_score,
                improvement.better_score
            )?;
        }
    }
    writeln!(out)?;

    if !outcome.quality.is_empty() {
        writeln!(out, "DATA QUALITY ISSUES")?;
        writeln!(out, "{}", light)?;
        writeln!(out, "Total issues found: {}\n", outcome.quality.len())?;
        for (category, messages) in outcome.quality.by_category() {
            writeln!(out, "{}: {} issue(s)", category, messages.len())?;
            for message in messages.iter().take(5) {
                writeln!(out, "  - {}", message)?;
            }
            if messages.len() > 5 {
                writeln!(out, "  ... and {} more", messages.len() - 5)?;
            }
            writeln!(out)?;
        }
        writeln!(out, "Note: These issues were handled automatically where possible.")?;
        writeln!(out, "Unknown netIDs may indicate students not in the dataset.\n")?;
    }

    writeln!(out, "TEAM ASSIGNMENTS")?;
    writeln!(out, "{}", light)?;
    let mut sorted: Vec<&Assignment> = outcome.assignments.iter().collect();
    sorted.sort_by(|a, b| a.project.cmp(&b.project));
    for (i, assignment) in sorted.iter().enumerate() {
        writeln!(out, "\nTeam {}: {}", i + 1, assignment.project)?;
        writeln!(
            out,
            "  Members ({}): {}",
            assignment.size(),
            assignment.team_members.join(", ")
        )?;
        writeln!(out, "  Aggregate score: {}", assignment.aggregate_score)?;
        writeln!(out, "  Individual rankings: {}", rankings(&assignment.individual_rankings))?;
        writeln!(out, "  Average per person: {:.2}", assignment.average_rank())?;
    }

    if !outcome.unmatched.is_empty() {
        writeln!(out, "\n{}", heavy)?;
        writeln!(out, "UNMATCHED STUDENTS")?;
        writeln!(out, "{}", heavy)?;
        writeln!(out, "Total unmatched: {} student(s)\n", unmatched)?;
        writeln!(out, "Subteams left over:")?;
        for team in &outcome.unmatched {
            writeln!(out, "  {}", format_members(&team.member_list()))?;
        }
        writeln!(out, "\nList of unmatched students:")?;
        for (i, netid) in outcome.unmatched_students().iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, netid)?;
        }
        writeln!(out, "\nNote: These students could not be placed in teams of 5-6 with")?;
        writeln!(out, "compatible project preferences (projects in everyone's top 5).")?;
    }

    writeln!(out, "\n{}", heavy)?;
    writeln!(out, "END OF REPORT")?;
    writeln!(out, "{}", heavy)?;
    Ok(())
}
