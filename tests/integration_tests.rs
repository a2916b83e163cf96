use clap::Parser;
use team_former::core::pipeline::SurveyPipeline;
use team_former::core::Pipeline;
use team_former::{CliConfig, FormationEngine, LocalStorage, TomlConfig};
use tempfile::TempDir;

const HEADER: &str = "Timestamp,Email,Name,NetID,Pref [Robots],Pref [Maps],Pref [Games],Pref [Music],Pref [Chess],Pref [Boats],Team Member 1,Team Member 2,Team Member 3,Team Member 4,Team Member 5";

/// `ranks` 依表頭專題順序，0 表示未填
fn row(netid: &str, ranks: [u8; 6], members: &[String]) -> String {
    let prefs: Vec<String> = ranks
        .iter()
        .map(|&r| if r == 0 { String::new() } else { format!("#{} Choice", r) })
        .collect();
    let mut cells: Vec<String> = members.to_vec();
    cells.resize(5, String::new());
    format!("t,{}@example.edu,Student,{},{},{}", netid, netid, prefs.join(","), cells.join(","))
}

fn group(names: &[&str], ranks: [u8; 6], format: impl Fn(&str) -> String) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            let others: Vec<String> = names
                .iter()
                .filter(|other| *other != name)
                .map(|other| format(other))
                .collect();
            row(name, ranks, &others)
        })
        .collect()
}

/// 六人完整隊、4+2 合併隊，以及兩位無法配對的學生
fn sample_survey() -> String {
    let mut rows = vec![HEADER.to_string()];
    rows.extend(group(
        &["a1", "a2", "a3", "a4", "a5", "a6"],
        [1, 2, 3, 4, 5, 0],
        |n| n.to_string(),
    ));
    rows.extend(group(&["b1", "b2", "b3", "b4"], [3, 1, 2, 4, 0, 5], |n| {
        format!("{}@uw.edu", n)
    }));
    rows.extend(group(&["c1", "c2"], [0, 2, 1, 4, 3, 5], |n| {
        format!("Some Name ({})", n)
    }));
    rows.push(row("s1", [4, 0, 5, 3, 1, 2], &[]));
    rows.push(row("s2", [4, 0, 5, 3, 1, 2], &[]));
    rows.join("\n")
}

fn write_survey(dir: &TempDir, contents: &str) -> anyhow::Result<String> {
    let path = dir.path().join("survey.csv");
    std::fs::write(&path, contents)?;
    Ok(path.to_string_lossy().into_owned())
}

fn cli_config(dir: &TempDir, input: &str, formats: &str) -> CliConfig {
    let output = dir.path().join("teams.csv");
    let report = dir.path().join("report.txt");
    CliConfig::parse_from([
        "team-former",
        input,
        output.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
        "--formats",
        formats,
    ])
}

#[test]
fn test_end_to_end_formation() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let input = write_survey(&dir, &sample_survey())?;
    let config = cli_config(&dir, &input, "csv,json,report");

    let pipeline = SurveyPipeline::new(LocalStorage::default(), config);
    let mut engine = FormationEngine::new(pipeline);
    let output = engine.run()?;
    assert!(output.ends_with("teams.csv"));

    let csv = std::fs::read_to_string(dir.path().join("teams.csv"))?;
    assert_eq!(
        csv,
        "Maps,\"[b1, b2, b3, b4, c1, c2]\"\nRobots,\"[a1, a2, a3, a4, a5, a6]\"\n"
    );

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("teams.json"))?)?;
    assert_eq!(json["stats"]["merged_teams"], 1);
    assert_eq!(json["stats"]["unmatched_students"], 2);
    assert_eq!(json["assignments"][1]["aggregate_score"], 8);
    assert_eq!(json["assignments"][1]["origin"]["kind"], "four_plus_two");

    let report = std::fs::read_to_string(dir.path().join("report.txt"))?;
    assert!(report.contains("Total teams formed: 2"));
    assert!(report.contains("  1. s1\n  2. s2\n"));
    Ok(())
}

#[test]
fn test_pipeline_is_idempotent() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let input = write_survey(&dir, &sample_survey())?;
    let pipeline = SurveyPipeline::new(LocalStorage::default(), cli_config(&dir, &input, "csv"));

    let first = pipeline.transform(pipeline.extract()?)?;
    let second = pipeline.transform(pipeline.extract()?)?;
    assert_eq!(first.outcome.assignments, second.outcome.assignments);
    assert_eq!(first.outcome.unmatched, second.outcome.unmatched);
    assert_eq!(first.analysis, second.analysis);

    pipeline.load(first)?;
    let first_csv = std::fs::read(dir.path().join("teams.csv"))?;
    pipeline.load(second)?;
    assert_eq!(first_csv, std::fs::read(dir.path().join("teams.csv"))?);
    Ok(())
}

#[test]
fn test_six_person_subteam_needs_no_merge() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut rows = vec![HEADER.to_string()];
    rows.extend(group(
        &["x1", "x2", "x3", "x4", "x5", "x6"],
        [5, 4, 3, 2, 1, 0],
        |n| format!("\"Student, {}\"", n),
    ));
    let input = write_survey(&dir, &rows.join("\n"))?;

    let pipeline = SurveyPipeline::new(LocalStorage::default(), cli_config(&dir, &input, "csv"));
    let result = pipeline.transform(pipeline.extract()?)?;
    assert_eq!(result.outcome.assignments.len(), 1);
    assert_eq!(result.outcome.assignments[0].project, "Chess");
    assert_eq!(result.outcome.stats.merged_teams, 0);
    assert!(result.outcome.unmatched.is_empty());
    Ok(())
}

#[test]
fn test_toml_config_run() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_survey(&dir, &sample_survey())?;
    let config_path = dir.path().join("teams.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[run]
name = "integration"
base_dir = "{}"

[input]
path = "survey.csv"

[formation]
merge-order = "most-constrained-first"

[output]
path = "out/teams.csv"
report = "out/report.txt"
formats = ["csv", "report"]
"#,
            dir.path().to_string_lossy().replace('\\', "/")
        ),
    )?;

    let config = TomlConfig::from_file(&config_path)?;
    let storage = LocalStorage::new(config.base_dir().to_string());
    let mut engine = FormationEngine::new(SurveyPipeline::new(storage, config));
    engine.run()?;

    assert!(dir.path().join("out/report.txt").exists());
    let csv = std::fs::read_to_string(dir.path().join("out/teams.csv"))?;
    assert_eq!(csv.lines().count(), 2);
    Ok(())
}

#[test]
fn test_missing_survey_is_io_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let missing = dir.path().join("nope.csv");
    let config = cli_config(&dir, missing.to_str().unwrap(), "csv");

    let mut engine = FormationEngine::new(SurveyPipeline::new(LocalStorage::default(), config));
    let err = engine.run().unwrap_err();
    assert!(matches!(err, team_former::FormationError::IoError(_)));
    assert!(!err.is_contract_violation());
    Ok(())
}
