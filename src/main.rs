use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smtree::{codec, SummaryField, Tree};

#[derive(Parser, Debug)]
#[command(name = "smtree", about = "Shared multicast tree cost engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the summary fields of a tree file.
    Stats {
        /// Tree file in the plain-text format.
        file: PathBuf,
        /// Power-law coefficient kappa.
        #[arg(long, default_value_t = 1.0)]
        kappa: f64,
        /// Power-law exponent alpha.
        #[arg(long, default_value_t = 2.0)]
        alpha: f64,
    },
    /// Check structural validity and print the total cost.
    Check {
        /// Tree file in the plain-text format.
        file: PathBuf,
        /// Power-law coefficient kappa.
        #[arg(long, default_value_t = 1.0)]
        kappa: f64,
        /// Power-law exponent alpha.
        #[arg(long, default_value_t = 2.0)]
        alpha: f64,
    },
    /// Parse a tree file and write it back out (round-trip check).
    Copy {
        /// Input tree file.
        input: PathBuf,
        /// Output path for the re-serialized tree.
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { file, kappa, alpha } => run_stats(file, kappa, alpha)?,
        Commands::Check { file, kappa, alpha } => run_check(file, kappa, alpha)?,
        Commands::Copy { input, output } => run_copy(input, output)?,
    }

    Ok(())
}

fn load_tree(path: &Path, kappa: f64, alpha: f64) -> Result<Tree> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tree file {}", path.display()))?;
    let mut tree = codec::parse_tree(&text)
        .with_context(|| format!("failed to parse tree file {}", path.display()))?;
    tree.set_cost_parameters(kappa, alpha);
    Ok(tree)
}

fn run_stats(file: PathBuf, kappa: f64, alpha: f64) -> Result<()> {
    const FIELDS: &[(SummaryField, &str)] = &[
        (SummaryField::NodeCount, "Nodes"),
        (SummaryField::LinkCount, "Links"),
        (SummaryField::DestinationCount, "Destinations"),
        (SummaryField::NonDestinationCount, "Non-destinations"),
        (SummaryField::TotalCost, "Total tree cost"),
        (SummaryField::AverageNodeCost, "Average node cost"),
        (SummaryField::AverageLinkLength, "Average link length"),
        (SummaryField::LongestLink, "Longest link"),
        (SummaryField::MostExpensiveNode, "Most expensive node"),
        (SummaryField::CalculationTime, "Calculation time (ms)"),
    ];

    let tree = load_tree(&file, kappa, alpha)?;
    for &(field, label) in FIELDS {
        println!("{label}: {}", tree.field_value(field));
    }

    Ok(())
}

fn run_check(file: PathBuf, kappa: f64, alpha: f64) -> Result<()> {
    let tree = load_tree(&file, kappa, alpha)?;

    if tree.is_valid() {
        println!("valid\tcost={}", tree.cost());
    } else {
        println!("invalid\tcost={}", tree.cost());
    }

    Ok(())
}

fn run_copy(input: PathBuf, output: PathBuf) -> Result<()> {
    let tree = load_tree(&input, 1.0, 2.0)?;

    let mut writer = File::create(&output)
        .with_context(|| format!("failed to create output file {}", output.display()))?;
    codec::write_tree(&mut writer, &tree)
        .with_context(|| format!("failed to write tree to {}", output.display()))?;

    println!(
        "copied {} nodes, {} links to {}",
        tree.node_count(),
        tree.link_count(),
        output.display()
    );

    Ok(())
}
