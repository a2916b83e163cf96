use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 資料品質問題的分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    DuplicateNetId,
    InvalidNetId,
    InvalidProjectCount,
    MissingData,
    UnknownNetId,
    FuzzyMatchedNetId,
    CaseNormalization,
    UnparseableMember,
    AsymmetricRequest,
    NoCommonPreferences,
    Unmatched,
}

impl IssueCategory {
    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::DuplicateNetId => "Duplicate NetIDs",
            IssueCategory::InvalidNetId => "Invalid NetIDs",
            IssueCategory::InvalidProjectCount => "Invalid Project Counts",
            IssueCategory::MissingData => "Missing Data",
            IssueCategory::UnknownNetId => "Unknown NetIDs In Subteams",
            IssueCategory::FuzzyMatchedNetId => "Fuzzy Matched NetIDs",
            IssueCategory::CaseNormalization => "Case Normalization",
            IssueCategory::UnparseableMember => "Unparseable Team Member Entries",
            IssueCategory::AsymmetricRequest => "Asymmetric Subteam Requests",
            IssueCategory::NoCommonPreferences => "No Common Preferences",
            IssueCategory::Unmatched => "Unmatched Subteams",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityIssue {
    pub category: IssueCategory,
    pub message: String,
}

/// 可回復的資料品質問題清單，由各元件回傳並在引擎中合併
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: IssueCategory, message: impl Into<String>) {
        self.issues.push(QualityIssue {
            category,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: QualityReport) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[QualityIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, category: IssueCategory) -> usize {
        self.issues.iter().filter(|i| i.category == category).count()
    }

    /// 依分類分組，保留每個分類內的加入順序
    pub fn by_category(&self) -> BTreeMap<IssueCategory, Vec<&str>> {
        let mut grouped: BTreeMap<IssueCategory, Vec<&str>> = BTreeMap::new();
        for issue in &self.issues {
            grouped
                .entry(issue.category)
                .or_default()
                .push(issue.message.as_str());
        }
        grouped
    }

    pub fn log_summary(&self) {
        if self.issues.is_empty() {
            tracing::info!("✅ No data quality issues found");
            return;
        }

        tracing::warn!("⚠️ Found {} data quality issue(s)", self.issues.len());
        for (category, messages) in self.by_category() {
            tracing::warn!("{}: {}", category, messages.len());
            for message in messages.iter().take(3) {
                tracing::warn!("  - {}", message);
            }
            if messages.len() > 3 {
                tracing::warn!("  ... and {} more", messages.len() - 3);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_keeps_insertion_order() {
        let mut report = QualityReport::new();
        report.add(IssueCategory::UnknownNetId, "b");
        report.add(IssueCategory::DuplicateNetId, "dup");
        report.add(IssueCategory::UnknownNetId, "a");

        let grouped = report.by_category();
        assert_eq!(grouped[&IssueCategory::UnknownNetId], vec!["b", "a"]);
        assert_eq!(report.count(IssueCategory::DuplicateNetId), 1);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn test_extend_merges_reports() {
        let mut first = QualityReport::new();
        first.add(IssueCategory::MissingData, "row 3");
        let mut second = QualityReport::new();
        second.add(IssueCategory::Unmatched, "abc");

        first.extend(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.issues()[1].category, IssueCategory::Unmatched);
    }
}
