use std::{borrow::Cow, fs::File, path::PathBuf, process::exit};

use charge_sessions::{
    billing::CdrBuilder,
    cdr::Cdr,
    lint,
    meter::{MeterLog, MeterLogProcessor},
    session::SessionId,
    tariff::Tariff,
    types::{electricity::Kwh, time::DateTime},
};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use console::style;
use serde::Deserialize;
use tabled::{settings::Style, Table, Tabled};

use crate::{error::Error, Result};

#[derive(Debug, Parser)]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) {
        if let Err(err) = self.command.run() {
            eprintln!("{}", err);
            exit(1);
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Settle a recorded charge session against a tariff structure.
    ///
    /// This command replays the meter logs of the session file through the
    /// billing pipeline and shows the resulting line items and totals.
    Settle(Settle),
    /// Lint a tariff structure.
    ///
    /// This command reports tariff configurations that the session engine
    /// accepts but that usually point at a catalog mistake, such as
    /// unreachable elements.
    Lint(Lint),
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::Settle(args) => args.run(),
            Self::Lint(args) => args.run(),
        }
    }
}

/// A recorded charge session: the meter log stream plus the session
/// timestamps, as exported by the session registry.
#[derive(Debug, Deserialize)]
struct SessionFile {
    start_date_time: DateTime,
    meter_start: Kwh,
    logs: Vec<MeterLog>,
    stop_date_time: DateTime,
    meter_stop: Option<Kwh>,
    end_date_time: Option<DateTime>,
}

#[derive(Debug, Args)]
pub struct Settle {
    /// A path to the recorded charge session in json format.
    #[arg(short = 's', long)]
    session: PathBuf,
    /// A path to the tariff structure in json format.
    #[arg(short = 't', long)]
    tariff: PathBuf,
    /// Timezone for evaluating any local times contained in the tariff
    /// structure.
    #[arg(short = 'z', long, default_value = "UTC")]
    timezone: Tz,
}

impl Settle {
    fn run(self) -> Result<()> {
        let session: SessionFile = load_json(&self.session, "session")?;
        let tariff: Tariff = load_json(&self.tariff, "tariff")?;
        let currency = tariff.currency.clone();

        let cdr = settle(&session, tariff, self.timezone)?;

        let rows: Vec<LineRow> = cdr
            .elements
            .iter()
            .flat_map(|element| {
                element.components.iter().map(|component| LineRow {
                    element: element.element_index,
                    component: component.component_type.to_string(),
                    quantity: component.quantity.to_string(),
                    excl_vat: component.price.excl_vat.to_string(),
                    incl_vat: component.price.incl_vat.to_string(),
                })
            })
            .collect();

        println!(
            "Session `{}` priced against tariff `{}` ({currency}):\n",
            file_name(&self.session),
            file_name(&self.tariff),
        );

        let mut table = Table::new(rows);
        table.with(Style::modern());
        println!("{table}");

        let total_time = cdr.end_date_time.signed_duration_since(cdr.start_date_time);

        println!("\n{} {}", style("total energy:").bold(), cdr.total_energy);
        println!("{} {}", style("total time:").bold(), format_duration(total_time));
        println!(
            "{} {} excl. VAT, {} incl. VAT",
            style("total cost:").bold(),
            cdr.total_cost.excl_vat,
            cdr.total_cost.incl_vat,
        );

        Ok(())
    }
}

fn format_duration(duration: chrono::Duration) -> String {
    let seconds = duration.num_seconds() % 60;
    let minutes = (duration.num_seconds() / 60) % 60;
    let hours = duration.num_seconds() / 3600;

    format!("{hours:0>2}:{minutes:0>2}:{seconds:0>2}")
}

#[derive(Debug, Args)]
pub struct Lint {
    /// A path to the tariff structure in json format.
    #[arg(short = 't', long)]
    tariff: PathBuf,
}

impl Lint {
    fn run(self) -> Result<()> {
        let tariff: Tariff = load_json(&self.tariff, "tariff")?;
        let warnings = lint::lint(&tariff);

        if warnings.is_empty() {
            println!("tariff `{}` is clean", file_name(&self.tariff));
            return Ok(());
        }

        for warning in warnings {
            println!("{} {warning}", style("warning:").yellow().bold());
        }

        Ok(())
    }
}

/// Replay a session file through the billing pipeline.
fn settle(session: &SessionFile, tariff: Tariff, timezone: Tz) -> Result<Cdr> {
    let mut processor = MeterLogProcessor::new(session.meter_start, session.start_date_time);
    let mut builder = CdrBuilder::new(tariff, timezone, session.start_date_time);

    for log in &session.logs {
        let delta = processor.ingest(log).map_err(Error::Settle)?;
        builder.record(&delta);
    }

    // The stop acknowledgement carries the authoritative final meter value,
    // delta it like any reading.
    if let Some(meter_stop) = session.meter_stop {
        let final_log = MeterLog {
            meter_value: meter_stop,
            timestamp: session.stop_date_time,
            percent: session.logs.last().map(|log| log.percent).unwrap_or(0),
            power: Default::default(),
            current: Default::default(),
            voltage: Default::default(),
        };
        let delta = processor.ingest(&final_log).map_err(Error::Settle)?;
        builder.record(&delta);
    }

    let end = session.end_date_time.unwrap_or(session.stop_date_time);

    Ok(builder.finalize(SessionId::new(0), session.stop_date_time, end))
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf, kind: &'static str) -> Result<T> {
    let file = File::open(path).map_err(|e| Error::file(path.clone(), e))?;
    serde_json::from_reader(&file).map_err(|e| Error::deserialize(path.display(), kind, e))
}

fn file_name(path: &PathBuf) -> Cow<'_, str> {
    path.file_name().map_or("<unknown>".into(), |name| {
        name.to_string_lossy()
    })
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "element")]
    element: usize,
    #[tabled(rename = "type")]
    component: String,
    #[tabled(rename = "quantity")]
    quantity: String,
    #[tabled(rename = "excl. VAT")]
    excl_vat: String,
    #[tabled(rename = "incl. VAT")]
    incl_vat: String,
}
