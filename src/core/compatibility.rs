use crate::domain::model::{PreferenceMap, ProjectScore};
use std::collections::BTreeSet;

/// 所有成員前五志願的交集；空團隊或任何成員沒有志願時為空
pub fn common_projects<'p, I, S>(members: I, preferences: &'p PreferenceMap) -> BTreeSet<&'p str>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut members = members.into_iter();
    let Some(first) = members.next() else {
        return BTreeSet::new();
    };

    let mut common: BTreeSet<&'p str> = preferences
        .projects_of(first.as_ref())
        .map(|projects| projects.keys().map(String::as_str).collect())
        .unwrap_or_default();

    for member in members {
        if common.is_empty() {
            break;
        }
        match preferences.projects_of(member.as_ref()) {
            Some(projects) => common.retain(|project| projects.contains_key(*project)),
            None => common.clear(),
        }
    }

    common
}

/// 合併兩組後是否仍至少有一個共同專題；對兩個參數對稱
pub fn compatible(a: &BTreeSet<String>, b: &BTreeSet<String>, preferences: &PreferenceMap) -> bool {
    !common_projects(a.iter().chain(b.iter()), preferences).is_empty()
}

/// 每個共同專題的總分，依專題名稱排序；名次依 `members` 的順序
pub fn score_common_projects(members: &[String], preferences: &PreferenceMap) -> Vec<ProjectScore> {
    common_projects(members, preferences)
        .into_iter()
        .map(|project| {
            let rankings: Vec<_> = members
                .iter()
                .filter_map(|member| preferences.rank(member, project))
                .collect();
            ProjectScore {
                project: project.to_string(),
                aggregate_score: rankings.iter().map(|&r| u32::from(r)).sum(),
                rankings,
            }
        })
        .collect()
}
