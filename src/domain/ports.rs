use crate::core::policy::FormationPolicy;
use crate::domain::model::{PreferenceMap, ProjectScore, RequestMap, SubteamArena, SubteamId};
use crate::domain::outcome::{FormationResult, SurveyData};
use crate::utils::error::Result;
use std::cmp::Ordering;
use std::path::Path;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn input_path(&self) -> &str;
    /// 分組結果 CSV
    fn output_path(&self) -> &str;
    fn report_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn fuzzy_threshold(&self) -> f64;
    fn netid_column(&self) -> Option<&str>;
    fn policy(&self) -> FormationPolicy;

    fn json_path(&self) -> String {
        Path::new(self.output_path())
            .with_extension("json")
            .to_string_lossy()
            .into_owned()
    }

    fn wants_format(&self, format: &str) -> bool {
        self.output_formats().iter().any(|f| f == format)
    }
}

pub trait Pipeline {
    fn extract(&self) -> Result<SurveyData>;
    fn transform(&self, data: SurveyData) -> Result<FormationResult>;
    fn load(&self, result: FormationResult) -> Result<String>;
}

/// 決定尋找子隊時走訪學生的順序
pub trait DiscoveryOrder {
    fn sequence<'a>(&self, requests: &'a RequestMap) -> Vec<&'a str>;
}

/// 合併前重新排列同大小的未完成子隊
pub trait CandidateOrder {
    fn arrange(&self, ids: &mut [SubteamId], arena: &SubteamArena, preferences: &PreferenceMap);
}

/// 只在總分相同時使用
pub trait ProjectTieBreak {
    fn compare(&self, a: &ProjectScore, b: &ProjectScore) -> Ordering;
}
