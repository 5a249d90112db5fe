mod cli;
mod config;
mod error;
mod lifecycle;
mod model;
mod placement;
mod resolver;
mod store;
mod ui;
mod validate;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Parser;
use console::Style;

use cli::{Cli, Command};
use config::EngineConfig;
use lifecycle::{advance_job, advance_manifest};
use model::{Driver, Job, JobStatus, ManifestStatus, Stop, StopType, Vehicle};
use placement::{CandidateBoard, DragSource, PlacementEngine, ShiftRequest};
use store::{HttpRecordStore, MemoryStore, RecordStore};
use ui::DispatchProgress;
use validate::validate_job;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref().map(Path::new))?;

    match cli.command {
        Command::Validate { file } => run_validate(&file),
        Command::Dispatch {
            jobs,
            driver,
            vehicle,
            date,
        } => run_dispatch(&config, &jobs, &driver, vehicle.as_deref(), &date).await,
        Command::Demo => run_demo(&config).await,
        Command::Status => run_status(&config),
    }
}

fn run_validate(file: &str) -> Result<()> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("failed to read {file}"))?;
    let jobs: Vec<Job> = serde_json::from_str(&contents)?;

    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let mut failures = 0;

    for job in &jobs {
        match validate_job(job) {
            Ok(()) => println!("{} {} ({})", green.apply_to("✓"), job.customer_name, job.id),
            Err(err) => {
                failures += 1;
                println!(
                    "{} {} ({}): {err}",
                    red.apply_to("✗"),
                    job.customer_name,
                    job.id
                );
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} job(s) failed validation", jobs.len());
    }
    Ok(())
}

async fn run_dispatch(
    config: &EngineConfig,
    jobs: &[String],
    driver: &str,
    vehicle: Option<&str>,
    date: &str,
) -> Result<()> {
    let date: NaiveDate = date.parse().context("route date must be YYYY-MM-DD")?;
    let store = HttpRecordStore::with_timeout(
        &config.api_url,
        &config.api_key,
        Duration::from_secs(config.request_timeout_secs),
    );

    let progress =
        DispatchProgress::start(&format!("Dispatching {} job(s) to {driver}", jobs.len()));
    match resolver::dispatch(&store, jobs, driver, vehicle, date).await {
        Ok(outcome) => {
            progress.finish(&outcome);
            Ok(())
        }
        Err(err) => {
            progress.fail(&err);
            Err(err.into())
        }
    }
}

fn run_status(config: &EngineConfig) -> Result<()> {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("haulplan configuration"));
    println!("  store url        {}", config.api_url);
    println!(
        "  api key          {}",
        if config.api_key.is_empty() {
            "(not set)"
        } else {
            "(set)"
        }
    );
    println!("  default window   {}h", config.default_window_hours);
    println!("  request timeout  {}s", config.request_timeout_secs);
    Ok(())
}

fn demo_time(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Walk the whole flow against an in-memory store: validation, board
/// staging, dispatch into a manifest, reorder, calendar reshift, and the
/// manifest lifecycle.
async fn run_demo(config: &EngineConfig) -> Result<()> {
    let bold = Style::new().bold();
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();

    let store = MemoryStore::new();
    store.seed_driver(Driver::new("drv-01", "Sam Torres").with_vehicle("veh-01"));
    store.seed_vehicle(Vehicle::new("veh-01", "Box truck 1"));

    // A job whose dropoff starts before the pickup's service time elapsed.
    let broken = Job::new("Rushed Order LLC")
        .with_stop(
            Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                .with_start(demo_time(9, 0))
                .with_service_duration(30),
        )
        .with_stop(Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(demo_time(9, 15)));

    println!("{}", bold.apply_to("1. Validation"));
    match validate_job(&broken) {
        Ok(()) => println!("  {} {}", green.apply_to("✓"), broken.customer_name),
        Err(err) => println!("  {} {}: {err}", red.apply_to("✗"), broken.customer_name),
    }

    let j1 = Job::new("Acme Freight")
        .with_stop(
            Stop::fixed("j", 1, StopType::Pickup, "12 Dock Rd")
                .with_start(demo_time(8, 0))
                .with_service_duration(20),
        )
        .with_stop(Stop::fixed("j", 2, StopType::Dropoff, "9 Bay St").with_start(demo_time(9, 30)));
    let j2 = Job::new("Harbor Supply Co")
        .with_stop(
            Stop::window("j", 1, StopType::Pickup, "3 Quay Lane")
                .with_start(demo_time(11, 0))
                .with_window_end(demo_time(13, 0)),
        )
        .with_stop(
            Stop::fixed("j", 2, StopType::Dropoff, "44 Mill Ave").with_start(demo_time(15, 0)),
        );

    for job in [&j1, &j2] {
        validate_job(job)?;
        println!("  {} {}", green.apply_to("✓"), job.customer_name);
    }
    let (j1_id, j2_id) = (j1.id.clone(), j2.id.clone());
    store.seed_job(j1);
    store.seed_job(j2);

    println!("{}", bold.apply_to("2. Staging"));
    let mut board = CandidateBoard::new();
    board.place(DragSource::from_pool(&j1_id), None)?;
    board.place(DragSource::from_pool(&j2_id), None)?;
    // Dispatcher changes their mind, pulls the second job back to the pool,
    // then drags it in again at the front.
    board.remove(&j2_id);
    board.place(DragSource::from_pool(&j2_id), Some(0))?;
    board.place(DragSource::from_board(&j1_id), Some(0))?;
    println!("  {} job(s) on the board", board.candidates().len());

    println!("{}", bold.apply_to("3. Dispatch"));
    let date = NaiveDate::from_ymd_opt(2024, 2, 1).context("valid route date")?;
    let progress = DispatchProgress::start("Dispatching board to drv-01");
    let outcome = match resolver::dispatch(&store, board.candidates(), "drv-01", None, date).await {
        Ok(outcome) => {
            progress.finish(&outcome);
            outcome
        }
        Err(err) => {
            progress.fail(&err);
            return Err(err.into());
        }
    };
    let manifest = outcome.manifest.context("multi-job dispatch returns a manifest")?;

    println!("{}", bold.apply_to("4. Reorder"));
    let engine = PlacementEngine::with_default_window(&store, config.default_window_hours);
    engine
        .apply_reorder(&manifest.id, &[j2_id.clone(), j1_id.clone()])
        .await?;
    for id in [&j2_id, &j1_id] {
        let job = store.job(id).context("job vanished")?;
        println!(
            "  #{} {}",
            job.sequence_order.unwrap_or(0),
            job.customer_name
        );
    }

    println!("{}", bold.apply_to("5. Calendar reshift"));
    let shift = engine
        .reshift(&ShiftRequest {
            job_id: j2_id.clone(),
            new_start: Some(demo_time(12, 0)),
            new_driver_id: None,
        })
        .await?;
    let shifted = store.job(&j2_id).context("job vanished")?;
    let first = shifted.first_stop().context("job has stops")?;
    println!(
        "  window moved to {}, width preserved: {}",
        first
            .start_instant()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default(),
        shift.fully_applied()
    );

    println!("{}", bold.apply_to("6. Lifecycle"));
    let mut manifest = store
        .get_manifest(&manifest.id)
        .await?
        .context("manifest vanished")?;
    for next in [ManifestStatus::Dispatched, ManifestStatus::InTransit] {
        advance_manifest(&mut manifest, next)?;
        store.put_manifest(&manifest).await?;
        println!("  {} -> {}", manifest.manifest_number, manifest.status);
    }

    // The driver starts the first job; the tracking side owns this
    // transition, the engine just applies it.
    let mut first_job = store.job(&j1_id).context("job vanished")?;
    advance_job(&mut first_job, JobStatus::InProgress)?;
    store.put_job(&first_job).await?;
    println!(
        "  job {} -> {}",
        first_job.customer_name, first_job.status
    );

    println!("{}", green.apply_to("Demo complete"));
    Ok(())
}
