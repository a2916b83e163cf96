pub mod analysis;
pub mod assigner;
pub mod classifier;
pub mod compatibility;
pub mod discovery;
pub mod engine;
pub mod formation;
pub mod merger;
pub mod pipeline;
pub mod policy;
pub mod validator;

pub use crate::domain::model::{Assignment, PreferenceMap, RequestMap, Subteam};
pub use crate::domain::outcome::{FormationOutcome, FormationResult, SurveyData};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
