use clap::Parser;
use flight_bdd::{Feature, Params, RunOptions, Runner, Suite, SuiteResult};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "flight-e2e")]
#[command(about = "Run the flight search end-to-end scenarios")]
#[command(version)]
struct Cli {
    /// Feature file or directory of feature files
    #[arg(default_value = "features")]
    features: PathBuf,

    /// Predefined selection: all, smoke, basic_search, t1
    #[arg(short, long, default_value = "all")]
    suite: String,

    /// Extra tag expression, e.g. "basic_search and not regression"
    #[arg(short = 'm', long = "tags", value_name = "EXPR")]
    tags: Option<String>,

    /// Run in headless mode (overrides feature files)
    #[arg(long, conflicts_with = "headed")]
    headless: bool,

    /// Show the browser window (overrides feature files)
    #[arg(long)]
    headed: bool,

    /// Number of scenarios to run at once
    #[arg(short = 'n', long, default_value_t = 1, value_name = "N")]
    parallel: usize,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate features and bind steps without running
    #[arg(long)]
    check: bool,

    /// Print the step definitions and exit
    #[arg(long)]
    list_steps: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> flight_bdd::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let suite: Suite = cli.suite.parse()?;
    let headless = match (cli.headless, cli.headed) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let runner = Runner::new(RunOptions {
        headless,
        parallel: cli.parallel,
        filter: suite.filter(cli.tags.as_deref())?,
    })?;

    if cli.list_steps {
        for (keyword, pattern) in runner.registry().patterns() {
            println!("{:<6} {}", keyword.to_string(), pattern);
        }
        return Ok(());
    }

    let params = Params::from_args(&cli.params)?;
    let features = Feature::discover(&cli.features)?
        .iter()
        .map(|path| Feature::load_with_params(path, &params))
        .collect::<flight_bdd::Result<Vec<_>>>()?;

    let planned = runner.plan(&features)?;

    if cli.check {
        for feature in &features {
            println!("Feature valid: {} ({})", feature.name, feature.label());
            println!("  Scenarios: {}", feature.scenarios.len());
            if !feature.params.is_empty() {
                println!("  Parameters: {}", feature.params.len());
                let mut names: Vec<_> = feature.params.iter().collect();
                names.sort_by(|a, b| a.0.cmp(b.0));
                for (name, def) in names {
                    let req = if def.required { " (required)" } else { "" };
                    let desc = def.description.as_deref().unwrap_or("");
                    println!("    - {}{}: {}", name, req, desc);
                }
            }
            let (attempts, _) = feature.retry_policy();
            if attempts > 1 {
                println!("  Retry attempts: {}", attempts);
            }
        }
        println!();
        println!("Selected ({} suite): {}", suite, planned.len());
        for plan in &planned {
            println!("  {} [{}]", plan.scenario.name, plan.scenario.tags.join(", "));
            for step in &plan.steps {
                println!("    {}", step);
            }
        }
        return Ok(());
    }

    println!("Running {} suite: {} scenario(s)", suite, planned.len());
    let result = runner.run_planned(planned).await;
    print_summary(&result);

    if !result.success() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_summary(result: &SuiteResult) {
    println!();
    for scenario in &result.scenarios {
        if scenario.success {
            println!(
                "✓ {} / {} ({}ms)",
                scenario.feature, scenario.scenario, scenario.duration_ms
            );
        } else {
            println!("✗ {} / {}", scenario.feature, scenario.scenario);
            if let Some(ref error) = scenario.error {
                println!("  Error: {}", error);
            }
            println!(
                "  Steps: {}/{}",
                scenario.steps_executed, scenario.total_steps
            );
        }
        if scenario.retries > 0 {
            println!("  Retries: {}", scenario.retries);
        }
    }
    println!();
    println!(
        "{} passed, {} failed in {:.1}s",
        result.passed(),
        result.failed(),
        result.duration_ms as f64 / 1000.0
    );
}
