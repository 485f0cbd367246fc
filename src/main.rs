use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

use covup::ci;
use covup::git_info::{self, GitHead, GitMetadata};
use covup::payload::JobMetadata;
use covup::pipeline::{self, ConversionRequest, ConvertOptions};
use covup::sources;
use covup::{CoverallsPayload, ReportFormat};

const DEFAULT_SERVICE_NAME: &str = "covup";
const DEFAULT_JOB_ID: &str = "0";
const DEFAULT_SERVER_URL: &str = "https://coveralls.io";

#[derive(Parser)]
#[command(name = "covup")]
#[command(about = "Convert code coverage reports and upload them to a Coveralls-compatible service")]
#[command(version)]
struct Cli {
    /// Report format for all inputs (monocov, opencover, dynamiccodecoverage, lcov, chutzpah)
    #[arg(long, conflicts_with = "multiple")]
    format: Option<String>,

    /// Treat inputs as format=path pairs, each parsed with its own format
    #[arg(long)]
    multiple: bool,

    /// Report file or directory (repeatable; format=path pairs with --multiple)
    #[arg(short, long, required = true)]
    input: Vec<String>,

    /// Repo token identifying the project on the aggregation service
    #[arg(long, env = "COVERALLS_REPO_TOKEN", hide_env_values = true)]
    repo_token: Option<String>,

    /// Job id reported to the service (detected from CI when omitted)
    #[arg(long)]
    service_job_id: Option<String>,

    /// Service name reported to the service
    #[arg(long)]
    service_name: Option<String>,

    /// Mark this upload as one of several parallel partial submissions
    #[arg(long)]
    parallel: bool,

    /// Prefix stripped from source paths to make them repository-relative
    #[arg(long)]
    base_path: Option<String>,

    /// Branch name for the git section (detected when omitted)
    #[arg(long)]
    branch: Option<String>,

    /// Commit id for the git section (read from the local repository when omitted)
    #[arg(long)]
    commit_id: Option<String>,

    /// Commit author name for the git section
    #[arg(long)]
    commit_author: Option<String>,

    /// Commit author email for the git section
    #[arg(long)]
    commit_email: Option<String>,

    /// Commit message for the git section
    #[arg(long)]
    commit_message: Option<String>,

    /// Skip the git section entirely
    #[arg(long)]
    no_git: bool,

    /// Write the payload to this file
    #[arg(short, long)]
    output: Option<String>,

    /// Build the payload without uploading it
    #[arg(long)]
    dry_run: bool,

    /// Base URL of the aggregation service
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Exit zero even when the upload fails
    #[arg(long)]
    treat_upload_errors_as_warnings: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let requests = build_requests(&cli)?;
    let ci_env = ci::detect();

    let repo_token = match cli.repo_token.clone() {
        Some(token) => token,
        None if cli.dry_run => String::new(),
        None => bail!("A repo token is required (--repo-token or COVERALLS_REPO_TOKEN)"),
    };

    let branch = cli.branch.clone().or(ci_env.branch);
    let git = resolve_git(&cli, branch);

    let metadata = JobMetadata {
        repo_token,
        service_job_id: cli
            .service_job_id
            .clone()
            .or(ci_env.service_job_id)
            .unwrap_or_else(|| DEFAULT_JOB_ID.to_string()),
        service_name: cli
            .service_name
            .clone()
            .or(ci_env.service_name)
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        parallel: cli.parallel,
        git,
    };

    let options = ConvertOptions {
        base_path: cli.base_path.clone(),
    };

    let payload = pipeline::convert(requests, &options, metadata)?;
    let json = serde_json::to_string(&payload)?;

    println!(
        "{} Converted {} source files",
        "✓".green(),
        payload.source_files.len()
    );

    if let Some(output) = &cli.output {
        let path = PathBuf::from(shellexpand::tilde(output).as_ref());
        std::fs::write(&path, &json)
            .with_context(|| format!("Failed to write payload to {}", path.display()))?;
        println!("{} Wrote payload to {}", "✓".green(), path.display());
    }

    if cli.dry_run {
        if cli.output.is_none() {
            println!("{}", json);
        }
        println!("{}", "Dry run - skipping upload".dimmed());
        return Ok(());
    }

    match cmd_upload(&cli.server_url, &payload) {
        Ok(()) => println!("{} Coverage uploaded to {}", "✓".green(), cli.server_url),
        Err(e) if cli.treat_upload_errors_as_warnings => {
            eprintln!("{} {:#}", "Warning:".yellow().bold(), e);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

fn build_requests(cli: &Cli) -> Result<Vec<ConversionRequest>> {
    let mut requests = Vec::new();

    if cli.multiple {
        for input in &cli.input {
            let (tag, path) = input.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("--multiple inputs must be format=path pairs, got: {}", input)
            })?;
            let format = tag.parse::<ReportFormat>()?;
            requests.push(make_request(format, path)?);
        }
    } else {
        let tag = cli
            .format
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--format is required unless --multiple is used"))?;
        let format = tag.parse::<ReportFormat>()?;
        for path in &cli.input {
            requests.push(make_request(format, path)?);
        }
    }

    Ok(requests)
}

fn make_request(format: ReportFormat, raw_path: &str) -> Result<ConversionRequest> {
    let expanded = shellexpand::tilde(raw_path);
    let source = sources::load_report_source(Path::new(expanded.as_ref()))?;
    Ok(ConversionRequest { format, source })
}

fn resolve_git(cli: &Cli, branch: Option<String>) -> Option<GitMetadata> {
    if cli.no_git {
        return None;
    }

    if let Some(id) = &cli.commit_id {
        return Some(GitMetadata {
            head: GitHead {
                id: id.clone(),
                author_name: cli.commit_author.clone().unwrap_or_default(),
                author_email: cli.commit_email.clone().unwrap_or_default(),
                committer_name: cli.commit_author.clone().unwrap_or_default(),
                committer_email: cli.commit_email.clone().unwrap_or_default(),
                message: cli.commit_message.clone().unwrap_or_default(),
            },
            branch: branch.unwrap_or_default(),
            remotes: Vec::new(),
        });
    }

    git_info::resolve_git_metadata(Path::new("."), branch.as_deref())
}

#[tokio::main]
async fn cmd_upload(server_url: &str, payload: &CoverallsPayload) -> Result<()> {
    covup::upload::upload_payload(server_url, payload).await
}
