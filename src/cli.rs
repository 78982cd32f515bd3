use clap::{Parser, Subcommand};
use snafu::ensure;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{AbortedSnafu, MissingArgumentSnafu, PartialDownloadSnafu, PartialUploadSnafu, Result};
use crate::storage::StorageClient;
use crate::storage::constants::DEFAULT_CONCURRENCY;
use crate::storage::operations::{DownloadReport, FailurePolicy, SyncOptions, UploadReport};
use crate::storage::utils::OutputFormat;
use crate::storage::utils::size::format_size;
use crate::utils::{confirm_transfer, prompt_line};

#[derive(Parser, Debug)]
#[command(
    name = "spacesync",
    version,
    about = "Upload a local folder to an S3-compatible bucket and mirror remote folders back to disk"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload the files of a local folder (one level deep) and print their public URLs
    #[command(alias = "put")]
    Upload {
        /// Local folder to upload
        #[arg(env = "SOURCE_DIR")]
        source: Option<PathBuf>,

        #[command(flatten)]
        transfer: TransferArgs,
    },

    /// Download every object under a remote folder into a local directory tree
    #[command(alias = "get")]
    Download {
        /// Local folder to download into
        #[arg(env = "DESTINATION_DIR")]
        destination: Option<PathBuf>,

        /// Keep downloading after an object fails and report all failures at the end
        #[arg(long)]
        keep_going: bool,

        #[command(flatten)]
        transfer: TransferArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct TransferArgs {
    /// Remote folder (key prefix) inside the bucket
    #[arg(short, long, env = "SPACE_FOLDER_PATH")]
    pub prefix: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Maximum number of transfers in flight
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Cancel the run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

impl TransferArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions::default().with_concurrency(self.concurrency)
    }
}

pub async fn run(args: Args, client: StorageClient) -> Result<()> {
    match args.command {
        Command::Upload { source, transfer } => {
            let source = resolve_path(source, "Please enter the source folder path")?;
            let prefix = resolve_prefix(transfer.prefix.clone(), "Please enter the destination folder path")?;

            let summary = [
                ("Source Folder", source.display().to_string()),
                ("Destination Folder", prefix.clone()),
            ];
            ensure!(confirm_transfer(&summary, transfer.yes)?, AbortedSnafu);

            let cancel = cancellation_token(transfer.timeout);
            let report = client
                .upload_folder(&source, &prefix, &transfer.options(), &cancel)
                .await?;
            print_upload_report(&report, transfer.format)?;

            ensure!(
                report.is_complete(),
                PartialUploadSnafu {
                    failed_paths: report.failed_targets()
                }
            );
            Ok(())
        }
        Command::Download {
            destination,
            keep_going,
            transfer,
        } => {
            let prefix = resolve_prefix(transfer.prefix.clone(), "Please enter the source folder path in the bucket")?;
            let destination = resolve_path(destination, "Please enter the local destination folder path")?;

            let summary = [
                ("Source Folder in Bucket", prefix.clone()),
                ("Local Destination Folder", destination.display().to_string()),
            ];
            ensure!(confirm_transfer(&summary, transfer.yes)?, AbortedSnafu);

            let policy = if keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            };
            let options = transfer.options().with_failure_policy(policy);
            let cancel = cancellation_token(transfer.timeout);
            let report = client
                .download_folder(&prefix, &destination, &options, &cancel)
                .await?;
            print_download_report(&report, transfer.format)?;

            ensure!(
                report.is_complete(),
                PartialDownloadSnafu {
                    failed_keys: report.failed_targets()
                }
            );
            Ok(())
        }
    }
}

fn resolve_path(value: Option<PathBuf>, question: &str) -> Result<PathBuf> {
    match value.filter(|path| !path.as_os_str().is_empty()) {
        Some(path) => Ok(path),
        None => prompt_line(question)?
            .map(PathBuf::from)
            .ok_or_else(|| missing(question)),
    }
}

fn resolve_prefix(value: Option<String>, question: &str) -> Result<String> {
    match value.filter(|prefix| !prefix.trim().is_empty()) {
        Some(prefix) => Ok(prefix),
        None => prompt_line(question)?.ok_or_else(|| missing(question)),
    }
}

fn missing(question: &str) -> crate::error::Error {
    let name = question
        .trim_start_matches("Please enter the ")
        .to_string();
    MissingArgumentSnafu { name }.build()
}

/// Token cancelled on Ctrl-C or when the optional deadline passes.
fn cancellation_token(timeout: Option<u64>) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => eprintln!("\nInterrupted, cleaning up..."),
            _ = deadline => eprintln!("\nTimed out, cleaning up..."),
        }
        trigger.cancel();
    });
    token
}

fn print_upload_report(report: &UploadReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("\nUrls:\n");
            for url in &report.urls {
                println!("{url}");
            }
            println!(
                "\n{} file(s) uploaded ({}), {} director{} skipped, {} failed",
                report.urls.len(),
                format_size(report.bytes),
                report.skipped.len(),
                if report.skipped.len() == 1 { "y" } else { "ies" },
                report.failures.len()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
    }
    Ok(())
}

fn print_download_report(report: &DownloadReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!(
                "\nDownload completed{}: {} file(s) ({}), {} director{}, {} failed",
                if report.is_complete() { "" } else { " with failures" },
                report.files,
                format_size(report.bytes),
                report.directories,
                if report.directories == 1 { "y" } else { "ies" },
                report.failures.len()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
    }
    Ok(())
}
