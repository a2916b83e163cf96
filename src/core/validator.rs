use crate::domain::model::RequestMap;
use std::collections::BTreeSet;

/// 某位成員的請求與候選子隊不一致之處
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub member: String,
    /// 候選子隊中此成員沒有請求的人
    pub missing: Vec<String>,
    /// 此成員請求了但不在候選子隊中的人
    pub unexpected: Vec<String>,
}

/// 每位成員的請求必須剛好等於其他成員，不多也不少
pub fn is_valid(candidate: &BTreeSet<String>, requests: &RequestMap) -> bool {
    candidate.iter().all(|member| {
        let wanted = requests.requests_of(member);
        let wanted_len = wanted.map_or(0, BTreeSet::len);
        wanted_len + 1 == candidate.len()
            && wanted.map_or(true, |set| {
                set.iter().all(|other| other != member && candidate.contains(other))
            })
    })
}

/// 回傳第一個（依成員名稱排序）不一致的成員
pub fn find_mismatch(candidate: &BTreeSet<String>, requests: &RequestMap) -> Option<Mismatch> {
    let empty = BTreeSet::new();
    candidate.iter().find_map(|member| {
        let wanted = requests.requests_of(member).unwrap_or(&empty);
        let missing: Vec<String> = candidate
            .iter()
            .filter(|other| *other != member && !wanted.contains(*other))
            .cloned()
            .collect();
        let unexpected: Vec<String> = wanted
            .iter()
            .filter(|other| !candidate.contains(*other))
            .cloned()
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            None
        } else {
            Some(Mismatch {
                member: member.clone(),
                missing,
                unexpected,
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(members: &[&str]) -> BTreeSet<String> {
        members.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_mutual_pair_is_valid() {
        let requests = RequestMap::new()
            .with_student("a", &["b"])
            .with_student("b", &["a"]);

        assert!(is_valid(&set(&["a", "b"]), &requests));
        assert!(find_mismatch(&set(&["a", "b"]), &requests).is_none());
    }

    #[test]
    fn test_one_directional_request_is_rejected() {
        let requests = RequestMap::new()
            .with_student("c", &["d"])
            .with_student("d", &[]);

        assert!(!is_valid(&set(&["c", "d"]), &requests));
        let mismatch = find_mismatch(&set(&["c", "d"]), &requests).unwrap();
        assert_eq!(mismatch.member, "d");
        assert_eq!(mismatch.missing, vec!["c".to_string()]);
    }

    #[test]
    fn test_extra_request_breaks_exact_agreement() {
        let requests = RequestMap::new()
            .with_student("a", &["b", "c"])
            .with_student("b", &["a", "c"])
            .with_student("c", &["a", "b", "z"]);

        assert!(!is_valid(&set(&["a", "b", "c"]), &requests));
        let mismatch = find_mismatch(&set(&["a", "b", "c"]), &requests).unwrap();
        assert_eq!(mismatch.member, "c");
        assert_eq!(mismatch.unexpected, vec!["z".to_string()]);
    }

    #[test]
    fn test_unknown_member_is_rejected() {
        let requests = RequestMap::new().with_student("a", &["ghost"]);
        assert!(!is_valid(&set(&["a", "ghost"]), &requests));
    }

    #[test]
    fn test_validity_ignores_insertion_order() {
        let rows: [(&str, [&str; 2]); 3] = [("a", ["b", "c"]), ("b", ["a", "c"]), ("c", ["a", "b"])];
        let permutations = [[0, 1, 2], [2, 1, 0], [1, 2, 0], [2, 0, 1]];

        for mutual in [true, false] {
            let mut verdicts = Vec::new();
            for (round, order) in permutations.iter().enumerate() {
                let mut requests = RequestMap::new();
                for &index in order {
                    let (student, wanted) = rows[index];
                    let mut wanted: Vec<&str> = wanted.to_vec();
                    if round % 2 == 1 {
                        wanted.reverse();
                    }
                    // c 不列 a 時應在任何順序下都無效
                    if !mutual && student == "c" {
                        wanted.retain(|other| *other != "a");
                    }
                    requests.insert(student, wanted);
                }

                assert_eq!(
                    requests.students().collect::<Vec<_>>(),
                    order.iter().map(|&i| rows[i].0).collect::<Vec<_>>()
                );
                verdicts.push(is_valid(&set(&["a", "b", "c"]), &requests));
            }
            assert!(verdicts.iter().all(|&valid| valid == mutual), "mutual={}", mutual);
        }
    }
}
