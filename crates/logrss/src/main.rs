use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use logrss_core::{
    inference::significance_stars, run_all, simulate_habitat, AnalysisConfig, AnalysisReport,
    CaseReport, Dataset, EquivalencePolicy,
};

mod visualize;

/// Available points simulated per used point with `--simulate`.
const AVAILABLE_PER_USED: usize = 5;

#[derive(Parser)]
#[command(name = "logrss", version, about, long_about = None)]
struct Cli {
    /// CSV file with a header row and a 0/1 response column.
    /// Use '-' for stdin.
    #[arg(short = 'd', long, conflicts_with = "simulate")]
    data: Option<PathBuf>,

    /// Simulate this many used points (plus five times as many available
    /// points) instead of reading data. This is the default with no --data.
    #[arg(short = 's', long)]
    simulate: Option<usize>,

    /// Seed for the simulator.
    #[arg(long)]
    seed: Option<u64>,

    /// JSON analysis config; flags override its values.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Run only this case (1-7). Repeatable.
    #[arg(long = "case", value_parser = clap::value_parser!(u8).range(1..=7))]
    cases: Vec<u8>,

    /// Save log-RSS curves for every case as a PNG.
    #[arg(short = 'o', long)]
    plot: Option<PathBuf>,

    /// Print the fitted coefficient table for each case.
    #[arg(long = "show-coefficients")]
    show_coefficients: bool,

    /// Compare after rounding to this many decimals (0-15).
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=15))]
    decimals: Option<u32>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match main_inner(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            use colored::Colorize;
            eprintln!("{}: {e:#}", "Error".red());
            std::process::exit(1);
        }
    }
}

/// Run the comparison. `Ok(true)` when every case agrees.
fn main_inner(cli: &Cli) -> anyhow::Result<bool> {
    let config = build_config(cli)?;
    let data = load_data(cli, &config)?;
    let report = run_all(&data, &config).context("could not prepare the data")?;

    print_report(&report, &config, cli.show_coefficients);
    if let Some(path) = &cli.plot {
        visualize::save_png(&report, path)
            .with_context(|| format!("could not write plot to {}", path.display()))?;
    }
    Ok(report.all_agree())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(cli: &Cli) -> anyhow::Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_path(path)
            .with_context(|| format!("could not load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(n) = cli.simulate {
        config.simulation.n_used = n;
        config.simulation.n_available = n
            .checked_mul(AVAILABLE_PER_USED)
            .with_context(|| format!("--simulate {n} is too large"))?;
    }
    if let Some(seed) = cli.seed {
        config.simulation.seed = seed;
    }
    if !cli.cases.is_empty() {
        config.cases = cli.cases.clone();
    }
    if let Some(d) = cli.decimals {
        config.equivalence = EquivalencePolicy::RoundedDecimals(d);
    }
    config.validate()?;
    Ok(config)
}

/// Read the dataset from a file or stdin, or simulate one.
fn load_data(cli: &Cli, config: &AnalysisConfig) -> anyhow::Result<Dataset> {
    match &cli.data {
        Some(path) => read_csv(path, io::stdin().lock()),
        None => simulate_habitat(&config.simulation).context("simulation failed"),
    }
}

/// Read a CSV file, or `stdin` when the path is '-'.
fn read_csv(path: &Path, mut stdin: impl Read) -> anyhow::Result<Dataset> {
    if path != Path::new("-") {
        return Dataset::from_csv_path(path)
            .with_context(|| format!("could not read {}", path.display()));
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text)?;
    Dataset::from_csv_str(&text).context("could not parse stdin")
}

fn describe_policy(policy: EquivalencePolicy) -> String {
    match policy {
        EquivalencePolicy::RoundedDecimals(d) => format!("rounded to {d} decimals"),
        EquivalencePolicy::RelativeTolerance(tol) => format!("relative tolerance {tol:e}"),
    }
}

/// Prints the comparison nicely to stdout.
fn print_report(report: &AnalysisReport, config: &AnalysisConfig, show_coefficients: bool) {
    use colored::Colorize;

    print_preparation(report);
    println!("Comparing closed-form and linear-predictor log-RSS, {}", describe_policy(config.equivalence));
    println!();

    for outcome in &report.outcomes {
        println!("{}", outcome.case.to_string().bold());
        match &outcome.result {
            Ok(case) => print_case(case, show_coefficients),
            Err(e) => println!("\t{}: {e}", "failed".red()),
        }
    }

    println!();
    let summary = format!("{}/{} cases agree", report.n_agreeing(), report.outcomes.len());
    if report.all_agree() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}

fn print_preparation(report: &AnalysisReport) {
    use colored::Colorize;
    for (col, &n) in &report.zeros_replaced {
        if n > 0 {
            let l = format!("Replaced {n} zero(s) in '{col}' before taking logs");
            println!("{}", l.yellow());
        }
    }
    for (col, s) in &report.scalings {
        println!("Standardized '{col}' as '{col}_sc' (mean {:.3}, sd {:.3})", s.mean, s.std_dev);
    }
}

fn print_case(case: &CaseReport, show_coefficients: bool) {
    use colored::Colorize;
    let eq = &case.equivalence;
    let status = if eq.agrees {
        "agree".green()
    } else {
        "DISAGREE".red()
    };
    println!(
        "\t{status}: {} points, max |closed - lp| = {:.2e}, {} mismatched, sum of differences = {}",
        case.closed_form.len(),
        eq.max_abs_diff,
        eq.n_mismatched,
        eq.sum_difference
    );
    if !case.model.converged() {
        let l = format!("did not converge after {} iterations", case.model.iterations());
        println!("\t{}", l.yellow());
    }
    if show_coefficients {
        println!(
            "\tn = {}, AIC = {:.2}, deviance = {:.2}",
            case.model.n_obs(),
            case.model.aic(),
            case.model.deviance()
        );
        println!(
            "\t{:<20} {:>12} {:>10} {:>8} {:>10}",
            "term", "estimate", "std.err", "z", "p"
        );
        for row in case.model.summary() {
            println!(
                "\t{:<20} {:>12.6} {:>10.6} {:>8.3} {:>10.3e} {}",
                row.name,
                row.estimate,
                row.std_error,
                row.z_value,
                row.p_value,
                significance_stars(row.p_value)
            );
        }
    }
}
