use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridgov-node")]
#[command(about = "Weighted-capacity governance node")]
pub struct Args {
    /// Config file; a default one is written if it does not exist
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    pub config: PathBuf,

    /// Genesis file with authorities, proposers and initial participants
    #[arg(short, long, value_name = "FILE")]
    pub genesis: Option<PathBuf>,

    /// Deploying authority used when no genesis file is given
    #[arg(long, default_value = "operator")]
    pub authority: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file and exit
    Init,
    /// Replay a scenario file against a fresh engine
    Run {
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,
    },
    /// Print the effective config and exit
    Status,
}
