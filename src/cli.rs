use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand};

use crate::{
    chart::{ChartKind, render},
    prelude::*,
    quantity::{energy::KilowattHours, power::Watts, ratio::Percent, time::Hours},
    statistics::{compute_summary, monthly_consumption},
    store::{ApplianceForm, RecordStore},
    tables::build_records_table,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// CSV file with the appliances, created when missing.
    #[clap(long = "data-file", env = "ECOENERGY_DATA_FILE", default_value = "appliances.csv")]
    pub data_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn run(self) -> Result {
        let load_store = || RecordStore::load(&self.data_file);
        match self.command {
            Command::Add(args) => args.run(&mut load_store(), &mut std::io::stdout().lock()),
            Command::Estimate(args) => {
                args.run();
                Ok(())
            }
            Command::List => {
                list(&load_store());
                Ok(())
            }
            Command::Summary => {
                summary(&load_store());
                Ok(())
            }
            Command::Chart(args) => {
                println!("{}", render(args.kind, load_store().table()));
                Ok(())
            }
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Add an appliance and show the updated summary.
    Add(AddArgs),

    /// Preview the monthly consumption without saving anything.
    Estimate(EstimateArgs),

    /// List the appliances.
    List,

    /// Show the consumption per source and the estimated CO₂ emissions.
    Summary,

    /// Draw a chart of the consumption.
    Chart(ChartArgs),
}

#[derive(Parser)]
pub struct AddArgs {
    #[clap(long, default_value = "")]
    name: String,

    /// Power in watts.
    #[clap(long, default_value = "", allow_hyphen_values = true)]
    wattage: String,

    /// Usage hours per day.
    #[clap(long, default_value = "", allow_hyphen_values = true)]
    hours: String,

    /// `Renewable` or `Non-Renewable`.
    #[clap(long, default_value = "")]
    source: String,
}

impl AddArgs {
    fn run(self, store: &mut RecordStore, output: &mut impl Write) -> Result {
        let form = ApplianceForm {
            name: &self.name,
            wattage: &self.wattage,
            hours: &self.hours,
            source: &self.source,
        };
        let table = store.append(&form)?;
        writeln!(output, "{} added!", form.name.trim())?;
        writeln!(output, "{}", compute_summary(table))?;
        Ok(())
    }
}

#[derive(Parser)]
pub struct EstimateArgs {
    #[clap(long, allow_hyphen_values = true)]
    wattage: String,

    #[clap(long, allow_hyphen_values = true)]
    hours: String,
}

impl EstimateArgs {
    /// Monthly consumption, as long as both texts are numbers.
    fn preview(&self) -> Option<KilowattHours> {
        let wattage = self.wattage.trim().parse::<Watts>().ok()?;
        let hours = self.hours.trim().parse::<Hours>().ok()?;
        Some(monthly_consumption(wattage, hours))
    }

    fn run(&self) {
        match self.preview() {
            Some(consumption) => println!("Monthly Consumption: {consumption}/month"),
            None => println!(),
        }
    }
}

#[derive(Parser)]
pub struct ChartArgs {
    #[clap(long, value_enum, default_value_t = ChartKind::Bar)]
    kind: ChartKind,
}

fn list(store: &RecordStore) {
    if store.table().is_empty() {
        println!("No data yet.");
    } else {
        println!("{}", build_records_table(store.table()));
    }
}

fn summary(store: &RecordStore) {
    let summary = compute_summary(store.table());
    println!("{summary}");
    if let Some(share) = summary.renewable_share() {
        println!("Renewable share: {}", Percent::from_proportion(share));
    }
}
