mod logic;

use anyhow::{Context, Result};
use caravan_game::{EncounterData, GameConfig, Variant};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::warn;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use logic::{
    GameTester, LogicTester, ScenarioResult, SeedInfo, expand_scenarios, get_scenario,
    list_scenarios, resolve_seed_inputs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// Base game: caravan, passengers and encounters only
    CaravanOnly,
    /// Coins, prize wheel, hangar, themes and walking mode
    Expanded,
    /// Run every scenario against both variants
    Both,
}

impl VariantArg {
    fn variants(self) -> Vec<Variant> {
        match self {
            Self::CaravanOnly => vec![Variant::CaravanOnly],
            Self::Expanded => vec![Variant::Expanded],
            Self::Both => Variant::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "caravan-tester", version = "0.1.0")]
#[command(about = "Headless autopilot and QA runs for Caravan Crossroads")]
struct Args {
    /// Game variant to exercise
    #[arg(long, value_enum, default_value_t = VariantArg::Expanded)]
    variant: VariantArg,

    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run: numbers, share codes, or `words` (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of consecutive seeds tried per scenario and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Game configuration JSON overriding the built-in tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving failure notes for failed scenarios
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let data = EncounterData::bundled().context("bundled encounter catalog is invalid")?;
    let tester = GameTester::new(Arc::new(data), config, args.verbose);
    let scenarios = expand_scenarios(&split_csv(&args.scenarios));
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let results = run_logic_scenarios(&args, &scenarios, &seeds, &tester);
    if let Some(dir) = &args.artifacts_dir {
        write_failure_artifacts(dir, &results)?;
    }
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🐪 Caravan Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<Option<Arc<GameConfig>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = GameConfig::from_json(&json)
        .with_context(|| format!("invalid game config in {}", path.display()))?;
    Ok(Some(Arc::new(config)))
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[SeedInfo],
    tester: &GameTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(tester.clone());
    let mut results = Vec::new();

    for variant in args.variant.variants() {
        let variant_seeds: Vec<u64> = seeds
            .iter()
            .filter(|info| info.matches_variant(variant))
            .map(|info| info.seed)
            .collect();
        if variant_seeds.is_empty() {
            continue;
        }
        for scenario_name in scenarios {
            let Some(scenario) = get_scenario(scenario_name, variant) else {
                warn!("unknown scenario {scenario_name}");
                eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
                continue;
            };
            // Pinned scenarios run once, under their own variant.
            if scenario.plan.variant != variant && args.variant == VariantArg::Both {
                continue;
            }
            results.extend(logic_tester.run_scenario(&scenario, &variant_seeds, args.iterations));
        }
    }
    results
}

fn write_failure_artifacts(base: &Path, results: &[ScenarioResult]) -> Result<()> {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    for result in results.iter().filter(|r| !r.passed) {
        let dir = base
            .join(&result.scenario_name)
            .join(format!("seed-{}", result.seed))
            .join(ts.to_string());
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating artifacts dir {}", dir.display()))?;
        fs::write(dir.join("failures.txt"), result.failures.join("\n"))
            .with_context(|| format!("writing failures for {}", result.scenario_name))?;
    }
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        ReportFormat::Markdown => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Caravan Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?} (finished {})",
                start_time.elapsed(),
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            variant: VariantArg::Expanded,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: ReportFormat::Json,
            output: None,
            config: None,
            artifacts_dir: None,
            verbose: false,
        }
    }

    fn temp(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("caravan-tester-{label}-{}", std::process::id()))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1337,
            share_code: "EX-DUNE01".to_string(),
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 1 (seed 1337): boom".to_string()]
            },
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    #[test]
    fn split_csv_drops_blanks() {
        assert_eq!(split_csv(" smoke, ,starvation,"), vec!["smoke", "starvation"]);
    }

    #[test]
    fn variant_arg_expands_both() {
        assert_eq!(VariantArg::Both.variants(), Variant::ALL.to_vec());
        assert_eq!(VariantArg::CaravanOnly.variants(), vec![Variant::CaravanOnly]);
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let path = temp("list");
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("haven-retire"));
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn load_config_reports_bad_files() {
        assert!(load_config(None).unwrap().is_none());
        let missing = load_config(Some(Path::new("/definitely/not/here.json")));
        assert!(format!("{:#}", missing.unwrap_err()).contains("failed to read config"));

        let path = temp("config.json");
        fs::write(&path, r#"{"tuning": {"food_drain_rate": -1.0}}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid game config"));

        fs::write(&path, r#"{"variant": "expanded"}"#).unwrap();
        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.variant, Variant::Expanded);
    }

    #[test]
    fn unknown_scenarios_are_skipped() {
        let tester = GameTester::bundled(false).unwrap();
        let seeds = vec![SeedInfo::from_numeric(1)];
        let results = run_logic_scenarios(&base_args(), &["nope".to_string()], &seeds, &tester);
        assert!(results.is_empty());
    }

    #[test]
    fn pinned_scenarios_run_once_for_both() {
        let tester = GameTester::bundled(false).unwrap();
        let seeds = vec![SeedInfo::from_numeric(1)];
        let args = Args {
            variant: VariantArg::Both,
            ..base_args()
        };
        let results = run_logic_scenarios(&args, &["share-code".to_string()], &seeds, &tester);
        assert_eq!(results.len(), 2);
        let pinned =
            run_logic_scenarios(&args, &["caravan-only".to_string()], &seeds, &tester);
        assert_eq!(pinned.len(), 1);
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let path = temp("report.json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("scenario_name"));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let path = temp("report.md");
        let args = Args {
            report: ReportFormat::Markdown,
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_console_has_footer() {
        let path = temp("report.txt");
        let args = Args {
            report: ReportFormat::Console,
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], Instant::now()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("boom"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn failure_artifacts_land_per_seed() {
        let dir = temp("artifacts");
        write_failure_artifacts(&dir, &[sample_result(true), sample_result(false)]).unwrap();
        let seed_dir = dir.join("smoke").join("seed-1337");
        let stamp = fs::read_dir(&seed_dir).unwrap().next().unwrap().unwrap();
        let notes = fs::read_to_string(stamp.path().join("failures.txt")).unwrap();
        assert!(notes.contains("boom"));
    }
}
