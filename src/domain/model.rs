use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

pub const MIN_TEAM_SIZE: usize = 5;
pub const MAX_TEAM_SIZE: usize = 6;
pub const EXPECTED_PREFERENCES: usize = 5;

/// 志願名次，1 為最想要
pub type Rank = u8;

/// 學生 -> (專題 -> 名次)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceMap {
    entries: HashMap<String, BTreeMap<String, Rank>>,
}

impl PreferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, student: impl Into<String>, project: impl Into<String>, rank: Rank) {
        self.entries
            .entry(student.into())
            .or_default()
            .insert(project.into(), rank);
    }

    /// 覆寫某位學生的全部志願（重複填答時以最後一筆為準）
    pub fn set_student(&mut self, student: impl Into<String>, preferences: BTreeMap<String, Rank>) {
        self.entries.insert(student.into(), preferences);
    }

    pub fn with_student(mut self, student: &str, preferences: &[(&str, Rank)]) -> Self {
        let map = preferences
            .iter()
            .map(|(project, rank)| (project.to_string(), *rank))
            .collect();
        self.set_student(student, map);
        self
    }

    pub fn projects_of(&self, student: &str) -> Option<&BTreeMap<String, Rank>> {
        self.entries.get(student)
    }

    pub fn rank(&self, student: &str, project: &str) -> Option<Rank> {
        self.entries.get(student)?.get(project).copied()
    }

    pub fn preference_count(&self, student: &str) -> usize {
        self.entries.get(student).map_or(0, BTreeMap::len)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 學生 -> 想同組的其他學生；保留輸入順序以確保結果可重現
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMap {
    order: Vec<String>,
    requests: HashMap<String, BTreeSet<String>>,
}

impl RequestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定學生的請求清單，自動去重並移除自己
    pub fn insert<I, S>(&mut self, student: impl Into<String>, wanted: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let student = student.into();
        let wanted: BTreeSet<String> = wanted
            .into_iter()
            .map(Into::into)
            .filter(|other| *other != student)
            .collect();

        if !self.requests.contains_key(&student) {
            self.order.push(student.clone());
        }
        self.requests.insert(student, wanted);
    }

    pub fn with_student(mut self, student: &str, wanted: &[&str]) -> Self {
        self.insert(student, wanted.iter().copied());
        self
    }

    pub fn requests_of(&self, student: &str) -> Option<&BTreeSet<String>> {
        self.requests.get(student)
    }

    pub fn request_count(&self, student: &str) -> usize {
        self.requests.get(student).map_or(0, BTreeSet::len)
    }

    pub fn contains(&self, student: &str) -> bool {
        self.requests.contains_key(student)
    }

    /// 依輸入順序列出所有學生
    pub fn students(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Subteam {
    members: BTreeSet<String>,
}

impl Subteam {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn singleton(student: impl Into<String>) -> Self {
        Self::new([student.into()])
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn member_list(&self) -> Vec<String> {
        self.members.iter().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, student: &str) -> bool {
        self.members.contains(student)
    }
}

impl fmt::Display for Subteam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.member_list().join(", "))
    }
}

/// 分類時配發的穩定編號
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubteamId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct SubteamArena {
    subteams: Vec<Subteam>,
}

impl SubteamArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subteam: Subteam) -> SubteamId {
        self.subteams.push(subteam);
        SubteamId(self.subteams.len() - 1)
    }

    pub fn get(&self, id: SubteamId) -> &Subteam {
        &self.subteams[id.0]
    }

    pub fn len(&self) -> usize {
        self.subteams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subteams.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind {
    FourPlusTwo,
    FourPlusOne,
    ThreePlusThree,
    ThreePlusTwo,
    TwoTwoTwo,
    TwoTwoOne,
    Individuals(usize),
}

impl fmt::Display for MergeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeKind::FourPlusTwo => f.write_str("4+2"),
            MergeKind::FourPlusOne => f.write_str("4+1"),
            MergeKind::ThreePlusThree => f.write_str("3+3"),
            MergeKind::ThreePlusTwo => f.write_str("3+2"),
            MergeKind::TwoTwoTwo => f.write_str("2+2+2"),
            MergeKind::TwoTwoOne => f.write_str("2+2+1"),
            MergeKind::Individuals(count) => write!(f, "{} individuals", count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTeam {
    pub members: BTreeSet<String>,
    pub sources: Vec<Subteam>,
    pub kind: MergeKind,
}

impl MergedTeam {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TeamOrigin {
    Complete,
    Merged { kind: MergeKind, source_count: usize },
}

/// 某專題對一組學生的總分（名次相加，越低越好）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectScore {
    pub project: String,
    pub aggregate_score: u32,
    pub rankings: Vec<Rank>,
}

impl ProjectScore {
    pub fn worst_rank(&self) -> Rank {
        self.rankings.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub team_members: Vec<String>,
    pub project: String,
    pub aggregate_score: u32,
    pub individual_rankings: Vec<Rank>,
    pub origin: TeamOrigin,
}

impl Assignment {
    pub fn size(&self) -> usize {
        self.team_members.len()
    }

    pub fn max_rank(&self) -> Rank {
        self.individual_rankings.iter().copied().max().unwrap_or(0)
    }

    pub fn average_rank(&self) -> f64 {
        if self.team_members.is_empty() {
            return 0.0;
        }
        f64::from(self.aggregate_score) / self.team_members.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_map_drops_self_and_duplicates() {
        let mut requests = RequestMap::new();
        requests.insert("abc", ["xyz", "abc", "xyz", "def"]);

        let wanted = requests.requests_of("abc").unwrap();
        assert_eq!(wanted.len(), 2);
        assert!(!wanted.contains("abc"));
    }

    #[test]
    fn test_request_map_keeps_first_position_on_overwrite() {
        let requests = RequestMap::new()
            .with_student("b", &[])
            .with_student("a", &["b"])
            .with_student("b", &["a"]);

        assert_eq!(requests.students().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(requests.request_count("b"), 1);
    }

    #[test]
    fn test_preference_lookup() {
        let prefs = PreferenceMap::new().with_student("abc", &[("Robots", 1), ("Maps", 2)]);

        assert_eq!(prefs.rank("abc", "Maps"), Some(2));
        assert_eq!(prefs.rank("abc", "Games"), None);
        assert_eq!(prefs.preference_count("abc"), 2);
        assert_eq!(prefs.preference_count("nobody"), 0);
    }

    #[test]
    fn test_subteam_display_is_sorted() {
        let team = Subteam::new(["zed", "amy", "kim"]);
        assert_eq!(team.to_string(), "[amy, kim, zed]");
        assert_eq!(team.size(), 3);
    }

    #[test]
    fn test_arena_handles_are_stable() {
        let mut arena = SubteamArena::new();
        let first = arena.push(Subteam::singleton("a"));
        let second = arena.push(Subteam::new(["b", "c"]));

        assert_eq!(arena.get(first).size(), 1);
        assert_eq!(arena.get(second).size(), 2);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_merge_kind_labels() {
        assert_eq!(MergeKind::TwoTwoOne.to_string(), "2+2+1");
        assert_eq!(MergeKind::Individuals(6).to_string(), "6 individuals");
    }
}
