//! F1 Dashboard CLI - driver/season analytics and race outcome prediction

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use f1dash::analysis::metrics::RacePoints;
use f1dash::analysis::{DriverDashboard, Selection};
use f1dash::config::AppConfig;
use f1dash::data::{DataContext, DerivedTables, FeatureVector, JoinPipeline};
use f1dash::error::{validate_grid_position, DashboardError, ModelError};
use f1dash::predictor::RacePredictor;

const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "f1dash")]
#[command(author, version, about = "F1 performance dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding the CSV tables (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML config file (default: ./f1dash.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dashboard for a driver and season
    Dashboard {
        /// Driver surname
        #[arg(short, long)]
        driver: String,

        /// Season year
        #[arg(short, long)]
        season: i32,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List driver surnames
    Drivers,

    /// List seasons
    Seasons,

    /// Predict a finishing position
    Predict {
        /// Grid position (1-20)
        #[arg(short, long)]
        grid: Option<u32>,

        /// Season year
        #[arg(long)]
        year: Option<i32>,

        /// Race length in laps
        #[arg(long)]
        laps: Option<u32>,

        /// Constructor championship points
        #[arg(long)]
        points: Option<f64>,
    },
}

/// Loaded data plus the model trained over it
struct Session {
    config: AppConfig,
    ctx: DataContext,
    tables: DerivedTables,
    predictor: Option<RacePredictor>,
}

impl Session {
    fn load(config: AppConfig) -> Result<Self> {
        let (ctx, tables) = with_spinner("Loading tables...", |pb| {
            let ctx = DataContext::load(&config.data)
                .with_context(|| format!("Failed to load tables from {:?}", config.data.dir))?;
            pb.set_message("Joining tables...");
            let tables = JoinPipeline::run(&ctx, &config.join);
            Ok((ctx, tables))
        })?;

        Ok(Self {
            config,
            ctx,
            tables,
            predictor: None,
        })
    }

    /// Train the model once; a table without usable rows leaves it unset
    fn train(&mut self) -> Result<()> {
        if self.predictor.is_some() {
            return Ok(());
        }

        let trained = with_spinner("Training model...", |_| {
            match RacePredictor::from_enriched(
                &self.tables.enriched_results,
                &self.config.features,
                &self.config.model,
            ) {
                Ok(predictor) => Ok(Some(predictor)),
                Err(DashboardError::Model(ModelError::EmptyTrainingSet)) => {
                    warn!("No usable rows for the prediction model");
                    Ok(None)
                }
                Err(e) => Err(e).context("Failed to train model"),
            }
        })?;

        self.predictor = trained;
        Ok(())
    }

    fn prediction_input(
        &self,
        grid: Option<u32>,
        year: Option<i32>,
        laps: Option<u32>,
        points: Option<f64>,
    ) -> FeatureVector {
        let defaults = &self.config.prediction;
        FeatureVector {
            year: year.unwrap_or(defaults.year) as f64,
            grid: grid.unwrap_or(defaults.grid) as f64,
            laps: laps.unwrap_or(defaults.laps) as f64,
            constructor_points: points.unwrap_or(defaults.constructor_points),
        }
    }
}

#[derive(Serialize)]
struct PredictionReport {
    model: &'static str,
    rmse: Option<f64>,
    input: FeatureVector,
    predicted_position: u32,
}

#[derive(Serialize)]
struct DashboardReport<'a> {
    dashboard: &'a DriverDashboard,
    prediction: Option<PredictionReport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(dir) = cli.data_dir {
        config.data.dir = dir;
    }

    if cli.interactive {
        println!("{}", "F1 Performance Dashboard".cyan().bold());
        println!();
        let mut session = Session::load(config)?;
        run_interactive(&mut session)?;
    } else if let Some(command) = cli.command {
        let mut session = Session::load(config)?;
        match command {
            Commands::Dashboard {
                driver,
                season,
                format,
            } => show_dashboard(&mut session, Selection::new(driver, season), format)?,
            Commands::Drivers => list_drivers(&session),
            Commands::Seasons => list_seasons(&session),
            Commands::Predict {
                grid,
                year,
                laps,
                points,
            } => {
                if let Some(g) = grid {
                    validate_grid_position(g)?;
                }
                session.train()?;
                let input = session.prediction_input(grid, year, laps, points);
                print_prediction(&session, &input);
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Run `work` under a spinner, clearing it whether or not the work succeeds
fn with_spinner<T>(
    message: &'static str,
    work: impl FnOnce(&ProgressBar) -> Result<T>,
) -> Result<T> {
    let pb = spinner(message)?;
    finish_after(&pb, work)
}

fn finish_after<T>(pb: &ProgressBar, work: impl FnOnce(&ProgressBar) -> Result<T>) -> Result<T> {
    let result = work(pb);
    pb.finish_and_clear();
    result
}

fn show_dashboard(session: &mut Session, selection: Selection, format: OutputFormat) -> Result<()> {
    session.train()?;
    let dashboard = DriverDashboard::build(&session.ctx, &session.tables, selection);
    let input = session.prediction_input(None, None, None, None);

    match format {
        OutputFormat::Json => {
            let report = DashboardReport {
                dashboard: &dashboard,
                prediction: session.predictor.as_ref().map(|p| PredictionReport {
                    model: p.model_name(),
                    rmse: p.rmse,
                    input,
                    predicted_position: p.predict_position(&input),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            print_dashboard(&dashboard, &session.tables);
            print_prediction(session, &input);
        }
    }
    Ok(())
}

fn print_dashboard(dashboard: &DriverDashboard, tables: &DerivedTables) {
    let selection = &dashboard.selection;

    if tables.is_degenerate() {
        println!(
            "{}",
            "Joined tables are empty; check that the CSV files share keys.".red()
        );
        println!();
    }

    println!(
        "{}",
        format!("Driver Profile: {}", selection.surname).yellow().bold()
    );
    match &dashboard.profile {
        Some(profile) => {
            println!("Full Name:   {}", profile.full_name);
            println!("Nationality: {}", profile.nationality);
        }
        None => println!("{}", "No driver with this surname.".dimmed()),
    }
    println!();

    println!(
        "{}",
        format!("Performance Metrics ({})", selection.season)
            .yellow()
            .bold()
    );
    println!("Total Races:    {}", dashboard.summary.total_races);
    println!("Total Wins:     {}", dashboard.summary.total_wins);
    println!("Average Finish: {}", dashboard.summary.average_finish);
    println!();

    println!("{}", "Points Per Race".yellow().bold());
    print_points(
        &dashboard.points_per_race,
        "No race results for the selected driver and season.",
    );

    println!("{}", "Sprint Race Results".yellow().bold());
    print_points(
        &dashboard.sprint_points,
        "No sprint race data available for the selected driver and season.",
    );

    println!("{}", "Constructor Standings".yellow().bold());
    if dashboard.constructor_points.is_empty() {
        println!(
            "{}",
            "No constructor standings data available for the selected season.".dimmed()
        );
    } else {
        println!("{:>12} {:>8} {:>10}", "Constructor", "Race", "Points");
        println!("{}", "-".repeat(32));
        for series in &dashboard.constructor_points {
            for (race_id, points) in &series.points {
                println!(
                    "{:>12} {:>8} {:>10.1}",
                    series.constructor_id, race_id, points
                );
            }
        }
    }
    println!();

    println!("{}", "Lap Times".yellow().bold());
    if dashboard.lap_times.is_empty() {
        println!("{}", "No lap time data available.".dimmed());
    } else {
        println!(
            "{:<30} {:>6} {:>6} {:>12} {:>12}",
            "Race", "Year", "Laps", "Best", "Mean"
        );
        println!("{}", "-".repeat(70));
        for lap in &dashboard.lap_times {
            println!(
                "{:<30} {:>6} {:>6} {:>12} {:>12}",
                truncate_name(&lap.race_name, 30),
                lap.year,
                lap.laps,
                lap.best_ms
                    .map(|ms| format_lap_time(ms as f64))
                    .unwrap_or_else(|| "-".to_string()),
                lap.mean_ms
                    .map(format_lap_time)
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }
    println!();

    println!("{}", "Driver Standings".yellow().bold());
    if dashboard.standings.is_empty() {
        println!(
            "{}",
            "No standings data available for the selected driver and season.".dimmed()
        );
    } else {
        println!("{:>8} {:>10}", "Race", "Position");
        println!("{}", "-".repeat(20));
        for standing in &dashboard.standings {
            println!(
                "{:>8} {:>10}",
                standing.race_id,
                standing
                    .position
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }
    println!();

    println!(
        "{}",
        format!("Statistics for {}", selection.surname)
            .yellow()
            .bold()
    );
    if dashboard.points_per_year.is_empty() {
        println!("{}", "No data available for the selected driver.".dimmed());
    } else {
        let max = dashboard
            .points_per_year
            .iter()
            .map(|p| p.points)
            .fold(0.0, f64::max);
        for year in &dashboard.points_per_year {
            println!(
                "{:>6} {:>8.1} {}",
                year.year,
                year.points,
                bar(year.points, max).green()
            );
        }
    }
    println!();
}

fn print_points(series: &[RacePoints], empty_message: &str) {
    if series.is_empty() {
        println!("{}", empty_message.dimmed());
        println!();
        return;
    }

    let max = series.iter().map(|p| p.points).fold(0.0, f64::max);
    for p in series {
        println!(
            "{:<30} {:>6.1} {}",
            truncate_name(&p.race_name, 30),
            p.points,
            bar(p.points, max).green()
        );
    }
    println!();
}

fn print_prediction(session: &Session, input: &FeatureVector) {
    println!("{}", "Predict Race Outcome".yellow().bold());
    let Some(predictor) = &session.predictor else {
        println!(
            "{}",
            "No training data available; prediction disabled.".dimmed()
        );
        return;
    };

    match predictor.rmse {
        Some(rmse) => println!("RMSE of the {} model: {:.2}", predictor.model_name(), rmse),
        None => println!("RMSE of the {} model: n/a", predictor.model_name()),
    }
    println!(
        "Input: year {}, grid {}, laps {}, constructor points {:.1}",
        input.year, input.grid, input.laps, input.constructor_points
    );
    println!(
        "{}: {}",
        "Predicted Position".green(),
        predictor.predict_position(input)
    );
}

fn list_drivers(session: &Session) {
    let surnames = session.ctx.driver_surnames();
    println!("{}", "Drivers:".yellow().bold());
    for surname in &surnames {
        println!("  {}", surname);
    }
    println!();
    println!("Total: {} surnames", surnames.len());
}

fn list_seasons(session: &Session) {
    let seasons = session.ctx.seasons();
    println!("{}", "Seasons:".yellow().bold());
    for season in &seasons {
        println!("  {}", season);
    }
    println!();
    println!("Total: {} seasons", seasons.len());
}

fn run_interactive(session: &mut Session) -> Result<()> {
    let theme = ColorfulTheme::default();
    let surnames: Vec<String> = session
        .ctx
        .driver_surnames()
        .into_iter()
        .map(String::from)
        .collect();
    let seasons = session.ctx.seasons();

    if surnames.is_empty() || seasons.is_empty() {
        println!("{}", "No drivers or seasons loaded.".red());
        return Ok(());
    }

    loop {
        let options = ["Driver dashboard", "Predict race outcome", "Quit"];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let driver = Select::with_theme(&theme)
                    .with_prompt("Select Driver")
                    .items(&surnames)
                    .default(0)
                    .interact()?;

                let season = Select::with_theme(&theme)
                    .with_prompt("Select Season")
                    .items(&seasons)
                    .default(0)
                    .interact()?;

                println!();
                show_dashboard(
                    session,
                    Selection::new(surnames[driver].clone(), seasons[season]),
                    OutputFormat::Table,
                )?;
                println!();
            }
            1 => {
                let grid: u32 = Input::with_theme(&theme)
                    .with_prompt("Grid Position (1-20)")
                    .default(session.config.prediction.grid)
                    .validate_with(|g: &u32| validate_grid_position(*g).map_err(|e| e.to_string()))
                    .interact_text()?;

                println!();
                session.train()?;
                let input = session.prediction_input(Some(grid), None, None, None);
                print_prediction(session, &input);
                println!();
            }
            _ => {
                println!("Goodbye!");
                break;
            }
        }
    }

    Ok(())
}

/// Horizontal bar scaled against `max`
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len.max(1))
}

/// Format milliseconds as m:ss.mmm
fn format_lap_time(ms: f64) -> String {
    let total = ms.round() as u64;
    let minutes = total / 60_000;
    let seconds = (total % 60_000) / 1000;
    let millis = total % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        name.to_string()
    } else {
        chars[..max_len - 1].iter().collect::<String>() + "…"
    }
}
