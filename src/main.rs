use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{
    job::{JobOptions, JobOutcome},
    ocr::textract::TextractProvider,
    platform::client::DocumentCloudClient,
    prelude::*,
    ui::Ui,
    upload::UploadOptions,
};

mod aws;
mod eligibility;
mod geometry;
mod job;
mod ocr;
mod pages;
mod platform;
mod prelude;
mod ui;
mod upload;

/// Default bucket where DocumentCloud hosts document PDFs.
const DEFAULT_BUCKET: &str = "s3.documentcloud.org";

/// OCR DocumentCloud documents with AWS Textract.
#[derive(Debug, Parser)]
#[clap(
    version,
    after_help = r#"
Environment Variables:
  - DC_API_TOKEN: The DocumentCloud API token.
  - DC_API_URL (optional): Override the DocumentCloud API endpoint.
  - DC_S3_BUCKET (optional): Bucket hosting document PDFs, if --bucket
    is not passed.
  - TOKEN (optional): Full AWS credentials file contents, written to the
    shared credentials file before the job starts.

  Standard AWS environment variables and credential files are used for
  Textract itself.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    /// IDs of the documents to OCR.
    ids: Vec<u64>,

    /// S3 bucket where the platform hosts document PDFs.
    #[clap(long)]
    bucket: Option<String>,

    /// Record `ocr_engine` in each document's metadata on success.
    #[clap(long)]
    tag: bool,

    /// Page records per upload chunk.
    #[clap(long, default_value_t = 50)]
    batch_size: usize,

    /// Seconds between status polls while an update is applied.
    #[clap(long, default_value_t = 5)]
    poll_interval: u64,

    /// Status polls to attempt before giving up on a chunk.
    #[clap(long, default_value_t = 120)]
    max_poll_attempts: u32,
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main]
async fn main() -> Result<()> {
    let ui = Ui::init();

    // Initialize tracing.
    let directive =
        Directive::from_str("info").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);

    tracing_subscriber::registry().with(subscriber).init();

    // Call our real `main` function now that logging is set up.
    real_main(ui).await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<()> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);

    let bucket = opts
        .bucket
        .clone()
        .or_else(|| std::env::var("DC_S3_BUCKET").ok())
        .unwrap_or_else(|| DEFAULT_BUCKET.to_owned());

    // Build our clients. AWS file-based credentials are written out first
    // so the SDK's provider chain can find them.
    let store = DocumentCloudClient::from_env()?;
    aws::bootstrap_credentials_file().await?;
    let poll_interval = Duration::from_secs(opts.poll_interval);
    let provider = TextractProvider::new(poll_interval).await?;

    let job_opts = JobOptions {
        bucket,
        tag_engine: opts.tag,
        upload: UploadOptions {
            batch_size: opts.batch_size,
            poll_interval,
            max_poll_attempts: opts.max_poll_attempts,
        },
    };

    match job::run_job(&ui, &store, &provider, &opts.ids, &job_opts).await? {
        JobOutcome::Completed { document_count } => {
            ui.display_message("✅", &format!("OCRed {document_count} document(s)"));
        }
        JobOutcome::NoDocuments => {
            ui.display_message(
                "ℹ️",
                "It looks like no documents were selected. Select some and run again.",
            );
        }
        JobOutcome::InsufficientCredits => {
            ui.display_message(
                "ℹ️",
                "You do not have sufficient AI credits to run this job.",
            );
        }
    }
    Ok(())
}
