use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use impfbot::api::DoctolibClient;
use impfbot::config::{self, SearchConfig, VaccinationStep};
use impfbot::models::Patient;
use impfbot::prompt::{Prompter, StdinPrompter};
use impfbot::services;

#[derive(Parser)]
#[command(
    name = "impfbot",
    about = "Book a vaccination slot on a Doctolib-style booking service",
    version
)]
struct Cli {
    /// Dose stage to book
    #[arg(value_enum)]
    step: VaccinationStep,

    /// Account username (email)
    username: String,

    /// Account password (falls back to IMPFBOT_PASSWORD, then to a prompt)
    #[arg(env = "IMPFBOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Show debug information, including raw API exchanges
    #[arg(long, short = 'd')]
    debug: bool,

    /// Go through the whole flow but stop before the final submission
    #[arg(long)]
    dry_run: bool,

    /// Start of the search window (yyyy-mm-dd, default today)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Length of the search window in days after the start date
    #[arg(long, default_value_t = 14)]
    time_window: i64,

    /// Only book motives naming this vaccine brand (repeatable)
    #[arg(long = "vaccine")]
    vaccines: Vec<String>,

    /// Skip centers whose name contains this text (repeatable)
    #[arg(long = "exclude-center")]
    excluded_centers: Vec<String>,

    /// Booking page slug of the vaccination center group
    #[arg(long, default_value = "ciz-berlin-berlin")]
    center: String,

    /// Seconds to sleep between two full search passes
    #[arg(long, default_value_t = 1)]
    retry_seconds: u64,

    /// Base URL of the booking service
    #[arg(long, default_value = "https://www.doctolib.de")]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_filter = if cli.debug { "info,impfbot=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let prompter = StdinPrompter;
    let password = match cli.password {
        Some(password) => password,
        None => prompter.prompt("Password")?,
    };

    let client = DoctolibClient::new(&cli.base_url)?;

    if !services::login::login(&client, &prompter, &cli.username, &password).await? {
        eprintln!("Could not log in.");
        std::process::exit(1);
    }

    let patients = match client.master_patients().await {
        Ok(patients) => patients,
        Err(err) => {
            tracing::error!(error = %err, "could not fetch patient records");
            std::process::exit(1);
        }
    };
    if patients.is_empty() {
        eprintln!("No patient record found. Fill in your patient data on the booking site first.");
        std::process::exit(1);
    }
    let patient = select_patient(&prompter, patients)?;
    if !patient.has_phone_number() {
        eprintln!("The selected patient has no phone number. Add one on the booking site first.");
        std::process::exit(1);
    }

    let config = SearchConfig {
        center: cli.center,
        step: cli.step,
        start_date: cli
            .start_date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        time_window: cli.time_window,
        excluded_centers: cli.excluded_centers,
        motive_pattern: config::motive_pattern(cli.step, &cli.vaccines),
        dry_run: cli.dry_run,
        retry_delay: Duration::from_secs(cli.retry_seconds),
    };

    tracing::info!(
        step = %config.step,
        start = %config.start_date,
        window = config.time_window,
        dry_run = config.dry_run,
        "starting slot search"
    );
    services::search::run(&client, &prompter, &patient, &config).await?;
    tracing::info!("booked!");
    Ok(())
}

fn select_patient(prompter: &dyn Prompter, mut patients: Vec<Patient>) -> anyhow::Result<Patient> {
    if patients.len() == 1 {
        return Ok(patients.remove(0));
    }

    println!("Available patients:");
    for (index, patient) in patients.iter().enumerate() {
        println!("* [{index}] {}", patient.full_name());
    }
    loop {
        let answer = prompter.prompt("Book a slot for which patient?")?;
        if let Ok(index) = answer.parse::<usize>() {
            if index < patients.len() {
                return Ok(patients.remove(index));
            }
        }
    }
}
