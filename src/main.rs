use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;

use cli::completions::CompletionsCommand;
use cli::config::ConfigCommand;
use cli::files::{
    DownloadCommand, ExistsCommand, LsCommand, ReadCommand, StatCommand, UploadCommand,
    WriteCommand,
};
use cli::jobs::{
    CancelCommand, EstimatedStartCommand, JobOutputCommand, QueueCommand, SacctCommand,
    SubmitCommand,
};
use cli::md::{MdStatusCommand, MdinfoCommand, RmsdCommand, ValidateRst7Command};
use cli::session::{
    ConnectCommand, DisconnectCommand, ExecCommand, OperationsCommand, ResourceCommand,
    StatusCommand,
};

#[derive(Parser)]
#[command(name = "hpgate")]
#[command(about = "Run commands, manage SLURM jobs and monitor AMBER simulations on an HPC cluster over one SSH session", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Connect(ConnectCommand),
    Disconnect(DisconnectCommand),
    Status(StatusCommand),
    Exec(ExecCommand),
    Submit(SubmitCommand),
    Queue(QueueCommand),
    Sacct(SacctCommand),
    Cancel(CancelCommand),
    JobOutput(JobOutputCommand),
    EstimatedStart(EstimatedStartCommand),
    Ls(LsCommand),
    Read(ReadCommand),
    Write(WriteCommand),
    Upload(UploadCommand),
    Download(DownloadCommand),
    Exists(ExistsCommand),
    Stat(StatCommand),
    MdStatus(MdStatusCommand),
    Mdinfo(MdinfoCommand),
    ValidateRst7(ValidateRst7Command),
    Rmsd(RmsdCommand),
    Operations(OperationsCommand),
    Resource(ResourceCommand),
    Config(ConfigCommand),
    Completions(CompletionsCommand),
}

fn main() -> Result<()> {
    // Initialize logging with INFO level by default
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Connect(cmd) => cmd.execute(),
        Commands::Disconnect(cmd) => cmd.execute(),
        Commands::Status(cmd) => cmd.execute(),
        Commands::Exec(cmd) => cmd.execute(),
        Commands::Submit(cmd) => cmd.execute(),
        Commands::Queue(cmd) => cmd.execute(),
        Commands::Sacct(cmd) => cmd.execute(),
        Commands::Cancel(cmd) => cmd.execute(),
        Commands::JobOutput(cmd) => cmd.execute(),
        Commands::EstimatedStart(cmd) => cmd.execute(),
        Commands::Ls(cmd) => cmd.execute(),
        Commands::Read(cmd) => cmd.execute(),
        Commands::Write(cmd) => cmd.execute(),
        Commands::Upload(cmd) => cmd.execute(),
        Commands::Download(cmd) => cmd.execute(),
        Commands::Exists(cmd) => cmd.execute(),
        Commands::Stat(cmd) => cmd.execute(),
        Commands::MdStatus(cmd) => cmd.execute(),
        Commands::Mdinfo(cmd) => cmd.execute(),
        Commands::ValidateRst7(cmd) => cmd.execute(),
        Commands::Rmsd(cmd) => cmd.execute(),
        Commands::Operations(cmd) => cmd.execute(),
        Commands::Resource(cmd) => cmd.execute(),
        Commands::Config(cmd) => cmd.execute(),
        Commands::Completions(cmd) => cmd.execute(),
    }
}
