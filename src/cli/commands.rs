use super::{normalize_country, prompts};
use crate::api::{OpenAQClient, OpenAqApi};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{KpiRecord, Pollutant};
use crate::pipeline::{
    default_report_name, list_distinct_localities, list_sensors_in_city, run_analysis,
    AnalysisOutcome, AnalysisReport, AnalysisRequest,
};
use crate::report::{fmt_number, trend_label};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

const DEFAULT_LOOKBACK_DAYS: i64 = 365;
const DEFAULT_GUIDELINE: f64 = 15.0;
const DEFAULT_WINDOW: usize = 30;

/// City air-quality briefs from OpenAQ daily sensor data
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Without a subcommand the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, analyse and write a brief for one city and pollutant
    Report(ReportArgs),

    /// List the cities of a country that report a pollutant
    Cities(CitiesArgs),

    /// List the sensors of a city that report a pollutant
    Sensors(SensorsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// City text, matched case-insensitively against locality and station names
    #[arg(short, long)]
    pub city: String,

    /// ISO country code (e.g. IN, US); all countries when omitted
    #[arg(short = 'k', long)]
    pub country: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Pollutant::Pm25)]
    pub pollutant: Pollutant,

    /// First day (YYYY-MM-DD); defaults to 365 days before the end date
    #[arg(short, long)]
    pub start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD); defaults to today (UTC)
    #[arg(short, long)]
    pub end: Option<NaiveDate>,

    /// Guideline threshold in µg/m³
    #[arg(short, long, default_value_t = DEFAULT_GUIDELINE)]
    pub guideline: f64,

    /// Rolling-mean window for the chart, in days
    #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Base name of the output files
    #[arg(short, long)]
    pub name: Option<String>,

    /// Analyse only these sensor ids (repeatable)
    #[arg(long = "sensor")]
    pub sensors: Vec<i64>,

    /// Print the result bundle as JSON instead of writing files
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    /// Resolves defaults (dates relative to `today`, report name) into a request.
    pub fn to_request(&self, today: NaiveDate) -> AnalysisRequest {
        let end = self.end.unwrap_or(today);
        let start = self
            .start
            .unwrap_or(end - Duration::days(DEFAULT_LOOKBACK_DAYS));
        let city = self.city.trim().to_string();
        let report_name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_report_name(&city, self.pollutant, start, end));

        AnalysisRequest {
            city,
            country: self.country.as_deref().and_then(normalize_country),
            pollutant: self.pollutant,
            start,
            end,
            guideline: self.guideline,
            rolling_window: self.window,
            report_name,
            sensor_ids: self.sensors.clone(),
            include_images: !self.json,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CitiesArgs {
    /// ISO country code (e.g. IN, US)
    #[arg(short = 'k', long)]
    pub country: String,

    #[arg(short, long, value_enum, default_value_t = Pollutant::Pm25)]
    pub pollutant: Pollutant,
}

#[derive(Args, Debug, Clone)]
pub struct SensorsArgs {
    #[arg(short, long)]
    pub city: String,

    /// ISO country code; all countries when omitted
    #[arg(short = 'k', long)]
    pub country: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Pollutant::Pm25)]
    pub pollutant: Pollutant,
}

/// CLI application
pub struct App<A: OpenAqApi = OpenAQClient> {
    config: Config,
    api: A,
}

impl App<OpenAQClient> {
    /// Create the application around the real OpenAQ client.
    pub fn new(config: Config) -> Result<Self> {
        let api = OpenAQClient::from_config(&config)?;
        Ok(Self { config, api })
    }
}

impl<A: OpenAqApi> App<A> {
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Report(args) => self.report(&args).await,
            Commands::Cities(args) => self.cities(&args).await,
            Commands::Sensors(args) => self.sensors(&args).await,
        }
    }

    async fn report(&self, args: &ReportArgs) -> Result<()> {
        let request = args.to_request(Utc::now().date_naive());

        let spinner = spinner(&format!(
            "Fetching & analysing {} {} data…",
            request.city, request.pollutant
        ))?;
        let result = run_analysis(&self.api, &request).await;
        spinner.finish_and_clear();

        if args.json {
            let outcome = AnalysisOutcome::from(result);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            return Ok(());
        }

        let report = result?;
        let files = report.write_files(&self.config.charts_dir(), &self.config.reports_dir())?;
        info!("Report '{}' complete", request.report_name);

        println!("{}", report_heading(&report).cyan().bold());
        println!("{}", kpi_table(&report.kpis, request.guideline));
        println!(
            "{} {}",
            "Sensors used:".bold(),
            report
                .sensors_used
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("\n{}", "Done ✅".green().bold());
        println!("- Charts: {}, {}", files.timeseries_chart.display(), files.rolling_chart.display());
        println!("- Daily CSV: {}", files.daily_csv.display());
        println!("- Report (Markdown): {}", files.brief.display());
        Ok(())
    }

    async fn cities(&self, args: &CitiesArgs) -> Result<()> {
        let country = normalize_country(&args.country)
            .ok_or_else(|| AppError::Cli("Country code must not be empty.".to_string()))?;
        let cities = list_distinct_localities(&self.api, &country, args.pollutant).await?;

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "City"]);
        for (i, city) in cities.iter().enumerate() {
            table.add_row(vec![(i + 1).to_string(), city.clone()]);
        }
        println!(
            "{}",
            format!("Cities in {} reporting {}", country, args.pollutant)
                .cyan()
                .bold()
        );
        println!("{table}");
        Ok(())
    }

    async fn sensors(&self, args: &SensorsArgs) -> Result<()> {
        let country = args.country.as_deref().and_then(normalize_country);
        let choices =
            list_sensors_in_city(&self.api, country.as_deref(), args.city.trim(), args.pollutant)
                .await?;

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Sensor ID", "Location • parameter • sensor"]);
        for choice in &choices {
            table.add_row(vec![choice.sensor_id.to_string(), choice.label.clone()]);
        }
        println!("{table}");
        Ok(())
    }

    /// Walks through the report inputs with prompts, then runs the report.
    pub async fn interactive_report(&self) -> Result<()> {
        let country = prompts::prompt_country()?;
        let pollutant = prompts::prompt_pollutant()?;

        let known = match country.as_deref() {
            Some(iso) => soft_or_empty(list_distinct_localities(&self.api, iso, pollutant).await)?,
            None => Vec::new(),
        };
        let city = prompts::prompt_city(&known)?;

        let sensors = if prompts::confirm_sensor_pick()? {
            let choices = soft_or_empty(
                list_sensors_in_city(&self.api, country.as_deref(), &city, pollutant).await,
            )?;
            prompts::prompt_sensors(&choices)?
        } else {
            Vec::new()
        };

        let today = Utc::now().date_naive();
        let start = prompts::prompt_date("Start date", today - Duration::days(DEFAULT_LOOKBACK_DAYS))?;
        let end = prompts::prompt_date("End date", today)?;
        let guideline = prompts::prompt_guideline(DEFAULT_GUIDELINE)?;
        let window = prompts::prompt_window(DEFAULT_WINDOW)?;
        let name = prompts::prompt_report_name(default_report_name(&city, pollutant, start, end))?;

        let args = ReportArgs {
            city,
            country,
            pollutant,
            start: Some(start),
            end: Some(end),
            guideline,
            window,
            name: Some(name),
            sensors,
            json: false,
        };
        self.report(&args).await
    }
}

/// Soft lookup failures become a warning and an empty list; others propagate.
fn soft_or_empty<T>(result: Result<Vec<T>>) -> Result<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.is_soft() => {
            warn!("Lookup failed: {}", e);
            println!("{} {}", "Warning:".yellow(), e);
            Ok(Vec::new())
        },
        Err(e) => Err(e),
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn report_heading(report: &AnalysisReport) -> String {
    let req = &report.request;
    format!(
        "{} — {} ({} to {})",
        req.city,
        req.pollutant.as_str().to_uppercase(),
        req.start,
        req.end
    )
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(fmt_number).unwrap_or_else(|| "N/A".to_string())
}

/// KPI summary as a two-column table.
pub fn kpi_table(kpis: &KpiRecord, guideline: f64) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["KPI", "Value"]);
    table.add_row(vec!["Days analysed".to_string(), kpis.days_total.to_string()]);
    table.add_row(vec![
        format!("Days above {} µg/m³", fmt_number(guideline)),
        format!("{} ({}%)", kpis.days_exceed, fmt_number(kpis.exceed_pct)),
    ]);
    table.add_row(vec!["Mean (µg/m³)".to_string(), opt_cell(kpis.mean)]);
    table.add_row(vec!["Median (µg/m³)".to_string(), opt_cell(kpis.median)]);
    table.add_row(vec!["p95 (µg/m³)".to_string(), opt_cell(kpis.p95)]);
    table.add_row(vec!["90-day trend".to_string(), trend_label(kpis)]);
    table
}
