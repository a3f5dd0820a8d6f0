use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flight_pages::{
    pick_day_cell, selectors, BasePage, Browser, DatePicker, HomePage, Page, StealthConfig,
    TargetDate,
};
use flight_search_e2e::probe::{self, ProbeGroup, SelectorReport, DEFAULT_LIMIT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "flight-probe")]
#[command(about = "Report which selectors match on the live search form")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Homepage to open
    #[arg(long, global = true, default_value = selectors::HOME_URL)]
    url: String,

    /// Departure airport code
    #[arg(long, global = true, default_value = "RTM")]
    from: String,

    /// Arrival airport code
    #[arg(long, global = true, default_value = "MAD")]
    to: String,

    /// Target date, in weeks from today
    #[arg(long, global = true, default_value_t = 1)]
    weeks: u32,

    /// Matches listed per selector
    #[arg(long, global = true, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Run in headless mode
    #[arg(long, global = true)]
    headless: bool,

    /// Keep the browser open until Enter is pressed
    #[arg(long, global = true)]
    pause: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Open the date picker and report calendar candidates
    Calendar {
        /// Run the date resolver after reporting
        #[arg(long)]
        click: bool,
    },
    /// Report form controls, then calendar containers and day cells
    Controls,
    /// List data-date cells and exact day-text matches
    DateCells,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let browser = Browser::launch_with_config(StealthConfig {
        headless: cli.headless,
        viewport_width: 1920,
        viewport_height: 1080,
        ..Default::default()
    })
    .await
    .context("failed to launch browser")?;

    let outcome = probe_page(&browser, &cli).await;

    if cli.pause {
        println!("\nBrowser left open for inspection. Press Enter to close...");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    }
    if let Err(e) = browser.close().await {
        warn!("Failed to close browser: {}", e);
    }
    outcome
}

async fn probe_page(browser: &Browser, cli: &Cli) -> Result<()> {
    let page = browser.new_page("about:blank").await?;
    let home = HomePage::new(&page).with_url(cli.url.as_str());
    let target = TargetDate::weeks_from_now(cli.weeks).context("invalid --weeks")?;

    info!("Opening {}", cli.url);
    home.open().await?;

    match cli.command {
        Command::Controls => {
            report(&page, &probe::control_groups(), cli).await?;
            open_calendar(&home, cli).await?;
            report(&page, &probe::calendar_groups(&target), cli).await?;
        }
        Command::Calendar { click } => {
            open_calendar(&home, cli).await?;
            println!("Target: {} ({})", target, target.iso());
            report(&page, &probe::calendar_groups(&target), cli).await?;
            if click {
                let strategy = DatePicker::new(*home.base()).select(&target).await?;
                println!("\n✓ Selected {} via {}", target.iso(), strategy);
            }
        }
        Command::DateCells => {
            open_calendar(&home, cli).await?;
            println!("Target: {} ({})", target, target.iso());
            let all = ProbeGroup {
                title: "data-date cells",
                selectors: vec!["[data-date]".to_string()],
            };
            report(&page, &[all], cli).await?;
            list_day_text_cells(*home.base(), &target).await?;
        }
    }
    Ok(())
}

async fn open_calendar(home: &HomePage<'_>, cli: &Cli) -> Result<()> {
    home.set_departure_airport(&cli.from).await?;
    home.set_arrival_airport(&cli.to).await?;
    if !home.open_date_picker().await? {
        warn!("Date field not found, reporting the page as is");
    }
    Ok(())
}

async fn report(page: &Page, groups: &[ProbeGroup], cli: &Cli) -> Result<()> {
    let results = probe::probe_groups(page, groups, cli.limit).await?;
    if cli.json {
        let map: Vec<_> = results
            .iter()
            .map(|(title, reports)| serde_json::json!({ "group": title, "reports": reports }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    for (title, reports) in &results {
        print_group(title, reports);
    }
    Ok(())
}

fn print_group(title: &str, reports: &[SelectorReport]) {
    println!("\n{}", title);
    println!("{}", "=".repeat(title.len()));
    for report in reports {
        println!("{}", report);
    }
}

async fn list_day_text_cells(base: BasePage<'_>, target: &TargetDate) -> Result<()> {
    let cells = DatePicker::new(base).collect_cells(target).await?;
    let picked = pick_day_cell(&cells, target).map(|c| c.index);

    println!("\nCells with text '{}': {}", target.day(), cells.len());
    for cell in &cells {
        let marker = if Some(cell.index) == picked { "→" } else { " " };
        println!(
            "{} [{}] <{}> class='{}' month={} visible={} disabled={} clickable={}",
            marker,
            cell.index,
            cell.tag,
            cell.classes,
            cell.month_context.as_deref().unwrap_or("-"),
            cell.visible,
            cell.disabled,
            cell.clickable
        );
    }
    if picked.is_none() {
        println!("No cell would be picked for {}", target.iso());
    }
    Ok(())
}
