//! Release Editor CLI
//!
//! The `release-editor` command drives the editor core against a live
//! server: load a release, inspect its files, apply scripted edits and
//! report validation errors.
//!
//! ## Commands
//!
//! - `show`: load a release and print a summary
//! - `files`: list the files of one or every category
//! - `validate`: apply `--set path=value` edits and report errors
//! - `delete-file` / `clear-category`: remove files, then print the refreshed listing
//! - `upload-picture`: upload a profile picture for a user

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, Level};

use release_editor::{
    EditorConfig, ErrorTree, Path, ProfileEditor, ReleaseEditor, ReviewStatus, METRICS,
};
use release_gateway::{FileCategory, FileDescriptor, GatewayConfig, HttpGateway};

#[derive(Parser)]
#[command(name = "release-editor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and edit software releases", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Server base URL
    #[arg(long, global = true, env = "RELEASE_EDITOR_BASE_URL")]
    base_url: Option<String>,

    /// API token
    #[arg(long, global = true, env = "RELEASE_EDITOR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "RELEASE_EDITOR_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Validation quiet period in milliseconds
    #[arg(long, global = true, env = "RELEASE_EDITOR_QUIET_MS")]
    quiet_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Release addressed by a command.
#[derive(Args, Debug, Clone)]
struct Target {
    /// Codebase identifier
    identifier: String,

    /// Release version number
    version: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a release and print a summary
    Show {
        #[command(flatten)]
        target: Target,

        /// Print the full release payload
        #[arg(long)]
        payload: bool,
    },

    /// List release files
    Files {
        #[command(flatten)]
        target: Target,

        /// Only this category (code, data, docs, results)
        #[arg(short, long)]
        category: Option<FileCategory>,
    },

    /// Apply edits and report validation errors
    Validate {
        #[command(flatten)]
        target: Target,

        /// Edit as `path=value`; the value is parsed as JSON, else taken as text
        #[arg(long = "set", value_name = "PATH=VALUE")]
        edits: Vec<String>,
    },

    /// Delete one file and print the refreshed category
    DeleteFile {
        #[command(flatten)]
        target: Target,

        category: FileCategory,

        /// Server path of the file
        path: String,
    },

    /// Delete every file of a category
    ClearCategory {
        #[command(flatten)]
        target: Target,

        category: FileCategory,
    },

    /// Upload a profile picture
    UploadPicture {
        /// User key
        user: String,

        /// Image file
        file: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct ReleaseSummary {
    release: String,
    live: bool,
    review_status: Option<ReviewStatus>,
    contributors: usize,
    files: BTreeMap<FileCategory, usize>,
    media: usize,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    errors: ErrorTree,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    release_editor::init_tracing(cli.json, level);

    let gateway = Arc::new(build_gateway(&cli)?);
    let config = editor_config(cli.quiet_ms);

    let result = match cli.command {
        Commands::Show { target, payload } => {
            let editor = load(&config, &gateway, &target).await?;
            cmd_show(&editor, payload)
        }
        Commands::Files { target, category } => {
            let editor = load(&config, &gateway, &target).await?;
            cmd_files(&editor, category)
        }
        Commands::Validate { target, edits } => {
            let editor = load(&config, &gateway, &target).await?;
            cmd_validate(&editor, &edits).await
        }
        Commands::DeleteFile {
            target,
            category,
            path,
        } => {
            let editor = load(&config, &gateway, &target).await?;
            cmd_delete_file(&editor, category, &path).await
        }
        Commands::ClearCategory { target, category } => {
            let editor = load(&config, &gateway, &target).await?;
            cmd_clear_category(&editor, category).await
        }
        Commands::UploadPicture { user, file } => {
            cmd_upload_picture(&config, gateway.clone(), &user, &file).await
        }
    };

    METRICS.flush();
    result
}

fn build_gateway(cli: &Cli) -> Result<HttpGateway> {
    let mut config = match &cli.base_url {
        Some(url) => GatewayConfig::new(url.as_str()),
        None => GatewayConfig::from_env().context("No server configured; pass --base-url")?,
    };
    if let Some(token) = &cli.token {
        config = config.with_token(token.as_str());
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    HttpGateway::new(config).context("Failed to build HTTP client")
}

fn editor_config(quiet_ms: Option<u64>) -> EditorConfig {
    match quiet_ms {
        Some(ms) => EditorConfig::new().with_quiet_period(Duration::from_millis(ms)),
        None => EditorConfig::from_env(),
    }
}

async fn load(
    config: &EditorConfig,
    gateway: &Arc<HttpGateway>,
    target: &Target,
) -> Result<ReleaseEditor> {
    let editor = ReleaseEditor::with_gateway(config.clone(), gateway.clone());
    editor
        .initialize(&target.identifier, &target.version)
        .await
        .with_context(|| format!("Failed to load {}@{}", target.identifier, target.version))?;
    info!(identifier = %target.identifier, version = %target.version, "release loaded");
    Ok(editor)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn summarize(editor: &ReleaseEditor) -> ReleaseSummary {
    let store = editor.store();
    let files = store.files();
    ReleaseSummary {
        release: store.identity().to_string(),
        live: store.is_live(),
        review_status: store.review_status(),
        contributors: store.contributors().len(),
        files: files
            .originals
            .iter()
            .map(|(category, listing)| (*category, listing.len()))
            .collect(),
        media: files.media.len(),
    }
}

fn cmd_show(editor: &ReleaseEditor, payload: bool) -> Result<()> {
    if payload {
        print_json(&editor.store().payload())
    } else {
        print_json(&summarize(editor))
    }
}

fn cmd_files(editor: &ReleaseEditor, category: Option<FileCategory>) -> Result<()> {
    let listing: BTreeMap<FileCategory, Vec<FileDescriptor>> = match category {
        Some(category) => [(category, editor.store().category(category))].into(),
        None => editor.store().files().originals,
    };
    print_json(&listing)
}

/// Split `path=value`; the value is JSON when it parses, otherwise text.
fn parse_edit(raw: &str) -> Result<(Path, Value)> {
    let (path, value) = raw
        .split_once('=')
        .with_context(|| format!("Edit '{}' is not of the form path=value", raw))?;
    let path: Path = path
        .trim()
        .parse()
        .with_context(|| format!("Invalid path in edit '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((path, value))
}

async fn cmd_validate(editor: &ReleaseEditor, edits: &[String]) -> Result<()> {
    for raw in edits {
        let (path, value) = parse_edit(raw)?;
        editor
            .set_at_path(&path, value)
            .with_context(|| format!("Failed to apply edit '{}'", raw))?;
    }
    editor.settle().await;

    let valid = editor.validate_all();
    print_json(&ValidationReport {
        valid,
        errors: editor.store().errors(),
    })
}

async fn cmd_delete_file(editor: &ReleaseEditor, category: FileCategory, path: &str) -> Result<()> {
    editor
        .delete_file(category, path)
        .await
        .with_context(|| format!("Failed to delete {}", path))?;
    print_json(&editor.store().category(category))
}

async fn cmd_clear_category(editor: &ReleaseEditor, category: FileCategory) -> Result<()> {
    editor
        .clear_category(category)
        .await
        .with_context(|| format!("Failed to clear {} files", category))?;
    print_json(&editor.store().category(category))
}

async fn cmd_upload_picture(
    config: &EditorConfig,
    gateway: Arc<HttpGateway>,
    user: &str,
    file: &std::path::Path,
) -> Result<()> {
    let image =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let editor = ProfileEditor::new(config, user, Value::Object(Default::default()), gateway);
    let reference = editor
        .upload_image(image)
        .await
        .context("Failed to upload picture")?;
    println!("{}", reference);
    Ok(())
}
