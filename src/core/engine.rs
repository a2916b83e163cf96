use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct FormationEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> FormationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn run(&mut self) -> Result<String> {
        tracing::info!("🚀 Starting team formation...");
        self.monitor.log_stats("start");

        // Extract
        tracing::info!("📥 Reading survey...");
        let survey = self.pipeline.extract()?;
        tracing::info!(
            "Loaded {} students, {} projects",
            survey.roster.len(),
            survey.projects.len()
        );
        self.monitor.log_stats("extract");

        // Transform
        tracing::info!("🔄 Forming teams...");
        let result = self.pipeline.transform(survey)?;
        tracing::info!(
            "Formed {} teams, {} students unmatched",
            result.outcome.assignments.len(),
            result.outcome.stats.unmatched_students
        );
        self.monitor.log_stats("transform");

        // Load
        tracing::info!("💾 Writing results...");
        let output_path = self.pipeline.load(result)?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
