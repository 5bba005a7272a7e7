use crate::dashboard::{Page, PlotKind};
use crate::error::Result;
use crate::models::{Granularity, Reduction, Selection, Variable};
use crate::writers::ExportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nwfp-met")]
#[command(about = "Drill-down explorer for North Wyke Farm Platform meteorological data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Settings file [default: nwfp-met.toml when present]"
    )]
    pub config: Option<PathBuf>,
}

/// Year, then month, then day of the drill-down chain.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    #[arg(short, long)]
    pub year: Option<i32>,

    #[arg(short, long, requires = "year", help = "Month name, e.g. March or Mar")]
    pub month: Option<String>,

    #[arg(short, long, requires = "month")]
    pub day: Option<u32>,
}

impl SelectionArgs {
    pub fn to_selection(&self) -> Result<Selection> {
        Selection::parse(self.year, self.month.as_deref(), self.day)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display information about a Parquet file
    Info {
        #[arg(short, long, help = "Observation file [default: settings data_file]")]
        file: Option<PathBuf>,
    },

    /// Per-variable statistics and quality flag counts
    Summary {
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Assemble one variable page for a selection
    Page {
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(short, long, help = "precipitation, air_temperature, relative_humidity or wind")]
        page: Page,

        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(short, long, help = "Second variable to overlay")]
        compare: Option<Variable>,

        #[arg(long, requires = "to", help = "First year of the yearly trend")]
        from: Option<i32>,

        #[arg(long, requires = "from", help = "Last year of the yearly trend")]
        to: Option<i32>,

        #[arg(
            long = "plot",
            help = "Distribution to include (repeatable) [default: the page's first plot]"
        )]
        plots: Vec<PlotKind>,

        #[arg(long, conflicts_with = "plots", help = "Leave out the distribution plots")]
        no_plots: bool,

        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },

    /// Export the aggregate of one drill-down level
    Aggregate {
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(long)]
        variable: Variable,

        #[arg(short, long)]
        granularity: Granularity,

        #[arg(short, long, help = "mean or sum [default: per variable]")]
        reduction: Option<Reduction>,

        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(
            short,
            long,
            help = "Output file path [default: output/nwfp-{variable}-{granularity}[-{year}[-{month}[-{day}]]].{ext}]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "csv, json or parquet [default: from the output extension]")]
        format: Option<ExportFormat>,

        #[arg(short, long, default_value = "snappy")]
        compression: String,
    },
}
