use crate::core::validator::{find_mismatch, is_valid};
use crate::domain::model::{RequestMap, Subteam};
use crate::domain::ports::DiscoveryOrder;
use crate::utils::quality::{IssueCategory, QualityReport};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub complete_subteams: Vec<Subteam>,
    /// 沒有進入任何子隊的學生，依輸入順序
    pub individuals: Vec<String>,
    pub quality: QualityReport,
}

impl Discovery {
    pub fn student_count(&self) -> usize {
        self.complete_subteams.iter().map(Subteam::size).sum::<usize>() + self.individuals.len()
    }
}

/// 將學生切分成互相請求一致的子隊與個人。
///
/// 貪婪且依走訪順序：請求人數相同時，不同順序可能得到不同（但各自有效）的切分。
pub struct SubteamDiscoverer<'a> {
    order: &'a dyn DiscoveryOrder,
}

impl<'a> SubteamDiscoverer<'a> {
    pub fn new(order: &'a dyn DiscoveryOrder) -> Self {
        Self { order }
    }

    pub fn discover(&self, requests: &RequestMap) -> Discovery {
        let mut discovery = Discovery::default();
        let mut assigned: HashSet<String> = HashSet::new();

        for student in self.order.sequence(requests) {
            if assigned.contains(student) {
                continue;
            }
            let Some(wanted) = requests.requests_of(student).filter(|w| !w.is_empty()) else {
                continue;
            };

            let mut candidate: BTreeSet<String> = wanted.clone();
            candidate.insert(student.to_string());

            if !is_valid(&candidate, requests) {
                if let Some(mismatch) = find_mismatch(&candidate, requests) {
                    let mut detail = Vec::new();
                    if !mismatch.missing.is_empty() {
                        detail.push(format!("does not list {}", mismatch.missing.join(", ")));
                    }
                    if !mismatch.unexpected.is_empty() {
                        detail.push(format!("also lists {}", mismatch.unexpected.join(", ")));
                    }
                    discovery.quality.add(
                        IssueCategory::AsymmetricRequest,
                        format!(
                            "{} requested [{}] but {} {}",
                            student,
                            wanted.iter().cloned().collect::<Vec<_>>().join(", "),
                            mismatch.member,
                            detail.join(" and ")
                        ),
                    );
                }
                continue;
            }

            if candidate.iter().any(|member| assigned.contains(member)) {
                tracing::debug!("Skipping subteam {:?}: a member is already assigned", candidate);
                continue;
            }

            tracing::debug!("Found subteam of size {}: {:?}", candidate.len(), candidate);
            assigned.extend(candidate.iter().cloned());
            discovery.complete_subteams.push(Subteam::new(candidate));
        }

        discovery.individuals = requests
            .students()
            .filter(|student| !assigned.contains(*student))
            .map(str::to_string)
            .collect();

        tracing::info!(
            "Subteam identification: {} subteam(s), {} individual(s)",
            discovery.complete_subteams.len(),
            discovery.individuals.len()
        );

        discovery
    }
}
