use crate::domain::model::{Assignment, MAX_TEAM_SIZE, MIN_TEAM_SIZE};
use crate::domain::outcome::{AssignmentAnalysis, FormationResult, FormationStats, SurveySummary};
use crate::utils::error::{FormationError, Result};
use crate::utils::quality::QualityReport;
use serde::Serialize;

/// 成員清單格式 `[a, b, c]`
pub fn format_members(members: &[String]) -> String {
    format!("[{}]", members.join(", "))
}

/// 無標題列，每列 `project,"[m1, m2, ...]"`，依專題名稱排序
pub fn render_assignments_csv(assignments: &[Assignment]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&Assignment> = assignments.iter().collect();
    sorted.sort_by(|a, b| {
        a.project
            .cmp(&b.project)
            .then_with(|| a.team_members.cmp(&b.team_members))
    });

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for assignment in sorted {
        writer.write_record([
            assignment.project.as_str(),
            format_members(&assignment.team_members).as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| FormationError::IoError(e.into_error()))
}

/// 重新讀回輸出的 CSV 並檢查格式，回傳隊伍數
pub fn validate_output(csv_bytes: &[u8]) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_bytes);

    let mut teams = 0;
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 1;
        let invalid = |message: String| FormationError::ValidationError {
            message: format!("Row {}: {}", row, message),
        };

        if record.len() != 2 {
            return Err(invalid(format!("expected 2 columns, got {}", record.len())));
        }
        if record[0].trim().is_empty() {
            return Err(invalid("empty project name".to_string()));
        }

        let list = record[1].trim();
        let inner = list
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| invalid(format!("member list not bracketed: {}", list)))?;
        let members: Vec<&str> = inner.split(',').map(str::trim).collect();
        if members.iter().any(|m| m.is_empty()) {
            return Err(invalid("empty team member".to_string()));
        }
        if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&members.len()) {
            return Err(invalid(format!(
                "team size {} outside {}-{}",
                members.len(),
                MIN_TEAM_SIZE,
                MAX_TEAM_SIZE
            )));
        }
        teams += 1;
    }

    tracing::debug!("Output validation passed: {} team(s)", teams);
    Ok(teams)
}

#[derive(Serialize)]
struct JsonExport<'a> {
    generated_at: String,
    survey: &'a SurveySummary,
    stats: &'a FormationStats,
    assignments: &'a [Assignment],
    unmatched: Vec<Vec<String>>,
    analysis: &'a AssignmentAnalysis,
    quality: &'a QualityReport,
}

pub fn render_json(result: &FormationResult) -> Result<Vec<u8>> {
    let export = JsonExport {
        generated_at: result.generated_at.to_rfc3339(),
        survey: &result.survey,
        stats: &result.outcome.stats,
        assignments: &result.outcome.assignments,
        unmatched: result
            .outcome
            .unmatched
            .iter()
            .map(|team| team.member_list())
            .collect(),
        analysis: &result.analysis,
        quality: &result.outcome.quality,
    };
    Ok(serde_json::to_vec_pretty(&export)?)
}
