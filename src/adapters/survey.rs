use crate::adapters::netid::{fuzzy_match, is_valid_netid, normalize_netid, parse_member_string};
use crate::domain::model::{PreferenceMap, Rank, RequestMap, EXPECTED_PREFERENCES};
use crate::domain::outcome::{SurveyData, SurveySummary};
use crate::utils::error::{FormationError, Result};
use crate::utils::quality::{IssueCategory, QualityReport};
use csv::StringRecord;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

const NETID_FALLBACK_INDEX: usize = 3;
const TEAM_MEMBER_MARKER: &str = "Team Member";

static PROJECT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid project header pattern"));
static CHOICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)\s*Choice").expect("valid choice pattern"));

/// 問卷欄位配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyLayout {
    pub netid: usize,
    /// (欄位索引, 專題名稱)
    pub projects: Vec<(usize, String)>,
    pub members: Vec<usize>,
}

impl SurveyLayout {
    pub fn detect(headers: &StringRecord, netid_column: Option<&str>) -> Result<Self> {
        if headers.is_empty() {
            return Err(FormationError::SurveyFormatError {
                message: "survey has no header row".to_string(),
            });
        }

        let netid = match netid_column {
            Some(name) => headers
                .iter()
                .position(|h| h.trim() == name.trim())
                .ok_or_else(|| FormationError::SurveyFormatError {
                    message: format!("netID column '{}' not found in header", name),
                })?,
            None => headers
                .iter()
                .position(|h| h.to_lowercase().contains("netid"))
                .or_else(|| (headers.len() > NETID_FALLBACK_INDEX).then_some(NETID_FALLBACK_INDEX))
                .ok_or_else(|| FormationError::SurveyFormatError {
                    message: format!(
                        "no netID column in header and only {} column(s) present",
                        headers.len()
                    ),
                })?,
        };

        let projects = headers
            .iter()
            .enumerate()
            .skip(netid + 1)
            .take_while(|(_, h)| !h.contains(TEAM_MEMBER_MARKER))
            .filter_map(|(i, h)| {
                PROJECT_HEADER
                    .captures(h)
                    .map(|caps| (i, caps[1].trim().to_string()))
            })
            .collect();

        let members = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains(TEAM_MEMBER_MARKER))
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            netid,
            projects,
            members,
        })
    }
}

/// 解析 `#N Choice` 名次，只接受 1..=5
pub fn parse_choice(cell: &str) -> Option<Rank> {
    let caps = CHOICE.captures(cell)?;
    let rank: Rank = caps[1].parse().ok()?;
    (1..=EXPECTED_PREFERENCES as Rank).contains(&rank).then_some(rank)
}

/// UTF-8 優先，失敗則以 Latin-1 解碼
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::warn!("⚠️ Survey is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

struct SurveyRow {
    netid: String,
    preferences: BTreeMap<String, Rank>,
    member_cells: Vec<String>,
}

/// 把問卷 CSV 轉成志願與組員請求
#[derive(Debug, Clone)]
pub struct SurveyParser {
    fuzzy_threshold: f64,
    netid_column: Option<String>,
}

impl Default for SurveyParser {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl SurveyParser {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self {
            fuzzy_threshold,
            netid_column: None,
        }
    }

    pub fn with_netid_column(mut self, netid_column: Option<String>) -> Self {
        self.netid_column = netid_column;
        self
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<SurveyData> {
        let text = decode(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let layout = SurveyLayout::detect(&headers, self.netid_column.as_deref())?;
        tracing::info!(
            "NetID column: '{}' (index {})",
            headers.get(layout.netid).unwrap_or_default(),
            layout.netid
        );
        tracing::info!(
            "Found {} project column(s), {} team member column(s)",
            layout.projects.len(),
            layout.members.len()
        );
        if layout.projects.is_empty() {
            tracing::warn!("⚠️ No project columns found; every student will have zero preferences");
        }

        let mut quality = QualityReport::new();
        let mut summary = SurveySummary {
            project_columns: layout.projects.len(),
            member_columns: layout.members.len(),
            ..Default::default()
        };

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            summary.rows += 1;
            if let Some(row) = self.read_row(index + 1, &record, &layout, &mut quality) {
                rows.push(row);
            }
        }

        let mut data = self.build(rows, &mut quality);
        data.projects = layout.projects.into_iter().map(|(_, name)| name).collect();

        summary.students = data.roster.len();
        for student in data.requests.students() {
            let count = data.requests.request_count(student);
            if count > 0 {
                summary.students_with_requests += 1;
            }
            summary.total_request_entries += count;
            *summary.request_size_distribution.entry(count).or_insert(0) += 1;
        }
        tracing::info!(
            "Students with subteam requests: {}/{} ({} entries)",
            summary.students_with_requests,
            summary.students,
            summary.total_request_entries
        );

        data.summary = summary;
        data.quality = quality;
        Ok(data)
    }

    fn read_row(
        &self,
        row_number: usize,
        record: &StringRecord,
        layout: &SurveyLayout,
        quality: &mut QualityReport,
    ) -> Option<SurveyRow> {
        let raw = record.get(layout.netid).unwrap_or_default().trim();
        if raw.is_empty() {
            quality.add(IssueCategory::MissingData, format!("Row {}: missing netID", row_number));
            return None;
        }

        let netid = normalize_netid(raw);
        if !is_valid_netid(&netid) {
            quality.add(
                IssueCategory::InvalidNetId,
                format!("Row {}: netID '{}' contains separators or whitespace; row skipped", row_number, raw),
            );
            return None;
        }
        if netid != raw {
            quality.add(
                IssueCategory::CaseNormalization,
                format!("Row {}: netID '{}' normalized to '{}'", row_number, raw, netid),
            );
        }

        let preferences = layout
            .projects
            .iter()
            .filter_map(|(column, project)| {
                let rank = parse_choice(record.get(*column)?)?;
                Some((project.clone(), rank))
            })
            .collect();

        let member_cells = layout
            .members
            .iter()
            .filter_map(|&column| record.get(column))
            .map(str::to_string)
            .collect();

        Some(SurveyRow {
            netid,
            preferences,
            member_cells,
        })
    }

    /// 第二階段：名單確定後才能比對組員 netID
    fn build(&self, rows: Vec<SurveyRow>, quality: &mut QualityReport) -> SurveyData {
        let mut roster: Vec<String> = Vec::new();
        let mut latest: HashMap<String, SurveyRow> = HashMap::new();
        for row in rows {
            if latest.contains_key(&row.netid) {
                quality.add(IssueCategory::DuplicateNetId, format!("Duplicate netID: {}", row.netid));
            } else {
                roster.push(row.netid.clone());
            }
            latest.insert(row.netid.clone(), row);
        }

        // 重複的 netID 只解析最後一筆
        let known: HashSet<String> = roster.iter().cloned().collect();
        let mut preferences = PreferenceMap::new();
        let mut requests = RequestMap::new();
        for student in &roster {
            let Some(row) = latest.remove(student) else {
                continue;
            };
            let wanted = self.resolve_members(&row, &roster, &known, quality);
            preferences.set_student(row.netid.clone(), row.preferences);
            requests.insert(row.netid, wanted);
        }

        for student in &roster {
            let count = preferences.preference_count(student);
            if count != EXPECTED_PREFERENCES {
                quality.add(
                    IssueCategory::InvalidProjectCount,
                    format!("{}: has {} preferences (expected {})", student, count, EXPECTED_PREFERENCES),
                );
            }
        }

        SurveyData {
            roster,
            preferences,
            requests,
            ..Default::default()
        }
    }

    fn resolve_members(
        &self,
        row: &SurveyRow,
        roster: &[String],
        known: &HashSet<String>,
        quality: &mut QualityReport,
    ) -> Vec<String> {
        let mut wanted: Vec<String> = Vec::new();
        for cell in &row.member_cells {
            let Some(parsed) = parse_member_string(cell) else {
                if !cell.trim().is_empty() {
                    quality.add(
                        IssueCategory::UnparseableMember,
                        format!("{}: '{}'", row.netid, cell.trim()),
                    );
                }
                continue;
            };

            let mut member = normalize_netid(&parsed);
            if member != parsed {
                quality.add(
                    IssueCategory::CaseNormalization,
                    format!("{}: team member '{}' normalized to '{}'", row.netid, parsed, member),
                );
            }

            if !known.contains(&member) {
                match fuzzy_match(&member, roster.iter().map(String::as_str), self.fuzzy_threshold) {
                    Some((matched, score)) => {
                        quality.add(
                            IssueCategory::FuzzyMatchedNetId,
                            format!(
                                "{}: '{}' fuzzy matched to '{}' (score: {:.2})",
                                row.netid, member, matched, score
                            ),
                        );
                        member = matched.to_string();
                    }
                    None => {
                        quality.add(
                            IssueCategory::UnknownNetId,
                            format!("{}: team member '{}' not found in student list", row.netid, member),
                        );
                    }
                }
            }

            if member != row.netid && !wanted.contains(&member) {
                wanted.push(member);
            }
        }
        wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Timestamp,Email,Name,NetID,Pref [Robots],Pref [Maps],Pref [Games],Pref [Music],Pref [Chess],Pref [Boats],Team Member 1,Team Member 2";

    fn survey(rows: &[&str]) -> Vec<u8> {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.into_bytes()
    }

    /// 五個志願加上空白的第六個專題欄
    const FIVE: &str = "#1 Choice,#2 Choice,#3 Choice,#4 Choice,#5 Choice,,";

    #[test]
    fn test_detects_layout() {
        let headers = StringRecord::from(HEADER.split(',').collect::<Vec<_>>());
        let layout = SurveyLayout::detect(&headers, None).unwrap();
        assert_eq!(layout.netid, 3);
        assert_eq!(layout.projects.len(), 6);
        assert_eq!(layout.projects[0], (4, "Robots".to_string()));
        assert_eq!(layout.members, vec![10, 11]);
    }

    #[test]
    fn test_configured_netid_column() {
        let headers = StringRecord::from(vec!["id", "Login", "x [P]"]);
        let layout = SurveyLayout::detect(&headers, Some("Login")).unwrap();
        assert_eq!(layout.netid, 1);
        assert_eq!(layout.projects, vec![(2, "P".to_string())]);

        assert!(SurveyLayout::detect(&headers, Some("Missing")).is_err());
        assert!(SurveyLayout::detect(&headers, None).is_err());
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("#1 Choice"), Some(1));
        assert_eq!(parse_choice("#5Choice"), Some(5));
        assert_eq!(parse_choice("#6 Choice"), None);
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("first"), None);
    }

    #[test]
    fn test_parses_preferences_and_requests() {
        let bytes = survey(&[
            &format!("t,a@x.edu,Ann,ann,{}Bob Smith (bob),", FIVE),
            &format!("t,b@x.edu,Bob,bob,{}ann@uw.edu,", FIVE),
        ]);
        let data = SurveyParser::default().parse(&bytes).unwrap();

        assert_eq!(data.roster, vec!["ann", "bob"]);
        assert_eq!(data.projects.len(), 6);
        assert_eq!(data.preferences.rank("ann", "Robots"), Some(1));
        assert_eq!(data.preferences.rank("ann", "Chess"), Some(5));
        assert_eq!(data.preferences.rank("ann", "Boats"), None);
        assert_eq!(data.requests.requests_of("ann").unwrap().len(), 1);
        assert!(data.requests.requests_of("bob").unwrap().contains("ann"));
        assert_eq!(data.summary.students_with_requests, 2);
        assert!(data.quality.is_empty());
    }

    #[test]
    fn test_records_quality_issues() {
        let bytes = survey(&[
            &format!("t,a@x.edu,Ann,ANN,{}Bob Smith (bobsmth),Who Knows", FIVE),
            &format!("t,b@x.edu,Bob,bobsmith,{}", "#1 Choice,,,,,,ann,zzzzzz"),
            &format!("t,c@x.edu,Nobody,,{},", FIVE),
            &format!("t,b@x.edu,Bob,bobsmith,{}ann,qqqqqq", FIVE),
        ]);
        let data = SurveyParser::default().parse(&bytes).unwrap();
        let quality = &data.quality;

        assert_eq!(data.roster, vec!["ann", "bobsmith"]);
        assert_eq!(quality.count(IssueCategory::CaseNormalization), 1);
        assert_eq!(quality.count(IssueCategory::FuzzyMatchedNetId), 1);
        assert_eq!(quality.count(IssueCategory::UnparseableMember), 1);
        assert_eq!(quality.count(IssueCategory::UnknownNetId), 1);
        assert_eq!(quality.count(IssueCategory::MissingData), 1);
        assert_eq!(quality.count(IssueCategory::DuplicateNetId), 1);
        assert_eq!(quality.count(IssueCategory::InvalidProjectCount), 0);
        assert!(data.requests.requests_of("ann").unwrap().contains("bobsmith"));
        assert_eq!(data.summary.rows, 4);
    }

    #[test]
    fn test_duplicate_netid_keeps_only_the_last_row() {
        let bytes = survey(&[
            &format!("t,b@x.edu,Bob,bob,{}", "#1 Choice,,,,,,ann,zzzzzz"),
            &format!("t,a@x.edu,Ann,ann,{}bob,", FIVE),
            &format!("t,b@x.edu,Bob,bob,{}ann,qqqqqq", FIVE),
        ]);
        let data = SurveyParser::default().parse(&bytes).unwrap();

        assert_eq!(data.roster, vec!["bob", "ann"]);
        assert_eq!(data.preferences.preference_count("bob"), 5);
        let wanted: Vec<&str> = data
            .requests
            .requests_of("bob")
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(wanted, vec!["ann", "qqqqqq"]);

        // 被覆寫那一筆的組員問題不應出現
        let unknown: Vec<&str> = data
            .quality
            .issues()
            .iter()
            .filter(|issue| issue.category == IssueCategory::UnknownNetId)
            .map(|issue| issue.message.as_str())
            .collect();
        assert_eq!(unknown.len(), 1);
        assert!(unknown[0].contains("qqqqqq"));
        assert!(data.quality.issues().iter().all(|issue| !issue.message.contains("zzzzzz")));
        assert_eq!(data.quality.count(IssueCategory::InvalidProjectCount), 0);
    }

    #[test]
    fn test_netid_with_separators_is_skipped() {
        let bytes = survey(&[
            &format!("t,a@x.edu,Ann,\"doe, ann\",{},", FIVE),
            &format!("t,b@x.edu,Bob,bob,{},", FIVE),
        ]);
        let data = SurveyParser::default().parse(&bytes).unwrap();

        assert_eq!(data.roster, vec!["bob"]);
        assert_eq!(data.quality.count(IssueCategory::InvalidNetId), 1);
        assert_eq!(data.summary.rows, 2);
    }

    #[test]
    fn test_drops_self_references_and_duplicates() {
        let bytes = survey(&[
            &format!("t,a@x.edu,Ann,ann,{}ann,bob", FIVE),
            &format!("t,b@x.edu,Bob,bob,{}ann,ann", FIVE),
        ]);
        let data = SurveyParser::default().parse(&bytes).unwrap();
        assert_eq!(data.requests.request_count("ann"), 1);
        assert_eq!(data.requests.request_count("bob"), 1);
    }

    #[test]
    fn test_counts_invalid_preference_totals() {
        let bytes = survey(&["t,a@x.edu,Ann,ann,#1 Choice,#2 Choice,,,,,,"]);
        let data = SurveyParser::default().parse(&bytes).unwrap();
        assert_eq!(data.quality.count(IssueCategory::InvalidProjectCount), 1);
    }

    #[test]
    fn test_latin1_and_bom_input() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend(survey(&[&format!("t,a@x.edu,Ann,ann,{},", FIVE)]));
        assert_eq!(SurveyParser::default().parse(&bytes).unwrap().roster, vec!["ann"]);

        let mut latin = survey(&[]);
        latin.extend(b"\nt,a@x.edu,Ren\xE9,rene,#1 Choice,,,,,,,");
        let data = SurveyParser::default().parse(&latin).unwrap();
        assert_eq!(data.roster, vec!["rene"]);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            SurveyParser::default().parse(b""),
            Err(FormationError::SurveyFormatError { .. })
        ));
    }
}
