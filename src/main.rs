use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use ipp_publisher::app::{handle_fatal_error, init_logging, AppConfig};
use ipp_publisher::config::JobConfig;
use ipp_publisher::publish::{layout, verify_publication, JobContext, PublishPipeline};
use ipp_publisher::results::{load_result_set, ResultFormat};
use ipp_publisher::storage::StorageFactory;
use std::path::PathBuf;
use tracing::{debug, info};

/// Publish pricing/inventory job results to object storage
#[derive(Parser)]
#[command(name = "ipp-publisher", version)]
#[command(about = "Publish job results as per-client artifacts with a completion manifest", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition a result set, write its artifacts and manifest, and mark the job completed
    Publish {
        /// Job configuration file (IPP_* environment variables override it)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Result set exported by the compute stage
        #[arg(short = 'r', long)]
        results: PathBuf,

        /// Result set format (default: from the file extension)
        #[arg(long, value_enum)]
        format: Option<ResultFormat>,

        /// Maximum concurrent partition writes
        #[arg(long)]
        max_parallel: Option<usize>,
    },
    /// Check that a job's manifest and every artifact it lists are in place
    Verify {
        /// Job configuration file (IPP_* environment variables override it)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },
    /// Show a job's status record
    Status {
        /// Job configuration file (IPP_* environment variables override it)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app_config = AppConfig::new(cli.verbose).with_quiet(cli.quiet);
    init_logging(&app_config);

    let result = match cli.command {
        Commands::Publish {
            config,
            results,
            format,
            max_parallel,
        } => run_publish(config, results, format, max_parallel).await,
        Commands::Verify { config } => run_verify(config).await,
        Commands::Status { config } => run_status(config).await,
    };

    if let Err(e) = result {
        handle_fatal_error(e, cli.verbose);
    }
}

async fn run_publish(
    config: Option<PathBuf>,
    results: PathBuf,
    format: Option<ResultFormat>,
    max_parallel: Option<usize>,
) -> Result<()> {
    let mut job = JobConfig::load(config.as_deref()).await?;
    if let Some(max_parallel) = max_parallel {
        job.publish.max_parallel = max_parallel;
    }
    let ctx = JobContext::from_config(&job)?;
    debug!("Job context: {:?}", ctx);

    let result_set = load_result_set(&results, format, job.columns.clone()).await?;
    info!("Loaded {} rows from {}", result_set.len(), results.display());

    let handles = StorageFactory::from_config(&job.storage, &job.bucket, &job.status_table).await?;
    let pipeline = PublishPipeline::from_handles(handles, job.publish.clone());
    let report = pipeline.publish(&ctx, &result_set).await?;

    println!(
        "Published job {}: {} clients, {} rows",
        report.manifest.job_id, report.manifest.total_clients, report.manifest.total_rows
    );
    println!("Manifest: {}", report.manifest_location);
    Ok(())
}

async fn run_verify(config: Option<PathBuf>) -> Result<()> {
    let job = JobConfig::load(config.as_deref()).await?;
    layout::validate_segment("job_id", &job.job_id)?;

    let handles = StorageFactory::from_config(&job.storage, &job.bucket, &job.status_table).await?;
    let report = verify_publication(handles.objects.as_ref(), &job.job_id).await?;

    if !report.is_valid() {
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        return Err(anyhow!(
            "Publication of job {} is incomplete ({} issue(s))",
            job.job_id,
            report.issues.len()
        ));
    }

    println!(
        "Publication of job {} verified: {} artifacts",
        job.job_id, report.artifacts_checked
    );
    Ok(())
}

async fn run_status(config: Option<PathBuf>) -> Result<()> {
    let job = JobConfig::load(config.as_deref()).await?;
    layout::validate_segment("job_id", &job.job_id)?;

    let handles = StorageFactory::from_config(&job.storage, &job.bucket, &job.status_table).await?;
    match handles.statuses.get_status(&job.job_id).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => return Err(anyhow!("No status record for job {}", job.job_id)),
    }
    Ok(())
}
