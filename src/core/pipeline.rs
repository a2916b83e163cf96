use crate::adapters::output::{render_assignments_csv, render_json, validate_output};
use crate::adapters::report::render_report;
use crate::adapters::survey::SurveyParser;
use crate::core::analysis::{analyze, log_analysis};
use crate::core::formation::TeamFormation;
use crate::core::{ConfigProvider, FormationResult, Pipeline, Storage, SurveyData};
use crate::utils::error::Result;

/// 問卷 CSV → 分組 → 輸出檔案
pub struct SurveyPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> SurveyPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn parser(&self) -> SurveyParser {
        SurveyParser::new(self.config.fuzzy_threshold())
            .with_netid_column(self.config.netid_column().map(str::to_string))
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for SurveyPipeline<S, C> {
    fn extract(&self) -> Result<SurveyData> {
        tracing::debug!("Reading survey from: {}", self.config.input_path());
        let bytes = self.storage.read_file(self.config.input_path())?;
        tracing::debug!("Survey size: {} bytes", bytes.len());
        self.parser().parse(&bytes)
    }

    fn transform(&self, data: SurveyData) -> Result<FormationResult> {
        let formation = TeamFormation::new(self.config.policy());
        tracing::debug!("Formation policy: {:?}", formation.policy());

        let mut outcome = formation.run(&data.preferences, &data.requests)?;

        // 問卷階段的問題排在前面
        let mut quality = data.quality;
        quality.extend(outcome.quality);
        outcome.quality = quality;
        outcome.quality.log_summary();

        let analysis = analyze(
            &outcome.assignments,
            &data.preferences,
            formation.policy().tie_break(),
        );
        log_analysis(&analysis);

        Ok(FormationResult {
            generated_at: chrono::Utc::now(),
            survey: data.summary,
            outcome,
            analysis,
        })
    }

    fn load(&self, result: FormationResult) -> Result<String> {
        let mut written: Vec<String> = Vec::new();

        if self.config.wants_format("csv") {
            let csv = render_assignments_csv(&result.outcome.assignments)?;
            validate_output(&csv)?;
            tracing::debug!("Writing {} bytes of CSV", csv.len());
            self.storage.write_file(self.config.output_path(), &csv)?;
            written.push(self.config.output_path().to_string());
        }

        if self.config.wants_format("json") {
            let json = render_json(&result)?;
            let path = self.config.json_path();
            self.storage.write_file(&path, &json)?;
            written.push(path);
        }

        if self.config.wants_format("report") {
            let report = render_report(&result);
            self.storage
                .write_file(self.config.report_path(), report.as_bytes())?;
            written.push(self.config.report_path().to_string());
        }

        for path in &written {
            tracing::info!("📁 Wrote {}", path);
        }

        // 第一個輸出檔作為主要結果
        Ok(written
            .into_iter()
            .next()
            .unwrap_or_else(|| self.config.output_path().to_string()))
    }
}
