// Adapters layer: survey CSV in, assignment files and report out

pub mod netid;
pub mod output;
pub mod report;
pub mod survey;
