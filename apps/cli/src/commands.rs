//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use catalog_import_core::{
    AssignOutcome, CategoryImporter, ImportOutcome, ImportSummary, StorageDenormalizer,
};
use catalog_import_shared::{
    AppConfig, CatalogImportError, CategoryRecord, init_config, load_config, parse_json_values,
    value_to_int,
};
use catalog_import_storage::Storage;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// catalog-import: load legacy category exports into the shop catalog.
#[derive(Parser)]
#[command(
    name = "catalog-import",
    version,
    about = "Import legacy category exports and article assignments into the shop catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Catalog database path (overrides the config file).
    #[arg(long, global = true, env = "CATALOG_IMPORT_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Import category records from a JSON array or JSON-lines file.
    Import {
        /// Export file to read.
        file: PathBuf,

        /// Abort at the first record whose parent category is missing.
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Link one article to one category.
    Assign {
        /// Article identifier.
        #[arg(long)]
        article: String,

        /// Category identifier.
        #[arg(long)]
        category: String,
    },

    /// Link articles to categories from a file of `{article, category}` objects.
    Link {
        /// Assignment file (JSON array or JSON lines).
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "catalog_import=info",
        1 => "catalog_import=debug",
        _ => "catalog_import=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db;
    match cli.command {
        Command::Import {
            file,
            stop_on_error,
        } => cmd_import(db.as_deref(), &file, stop_on_error).await,
        Command::Assign { article, category } => {
            cmd_assign(db.as_deref(), &article, &category).await
        }
        Command::Link { file } => cmd_link(db.as_deref(), &file).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Open the catalog database, preferring the `--db` flag over the config file.
async fn open_storage(db: Option<&Path>, config: &AppConfig) -> Result<Storage> {
    let path = db
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.database.path));
    info!(path = %path.display(), "opening catalog database");
    Ok(Storage::open(&path).await?)
}

fn read_values(file: &Path) -> Result<Vec<Value>> {
    let content =
        std::fs::read_to_string(file).map_err(|e| CatalogImportError::io(file, e))?;
    Ok(parse_json_values(&content)?)
}

/// First present field among `names`, coerced to an identifier (0 if absent).
fn int_field(value: &Value, names: &[&str]) -> i64 {
    names
        .iter()
        .find_map(|name| value.get(*name))
        .map(value_to_int)
        .unwrap_or(0)
}

fn progress_bar(len: usize, verb: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {verb} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))?
        .progress_chars("=> "),
    );
    Ok(bar)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_import(db: Option<&Path>, file: &Path, stop_on_error: bool) -> Result<()> {
    let config = load_config()?;
    let stop_on_error = stop_on_error || config.import.stop_on_error;

    let values = read_values(file)?;
    let storage = open_storage(db, &config).await?;
    let denormalizer = config
        .import
        .denormalize
        .then(|| StorageDenormalizer::new(&storage));
    let importer = CategoryImporter::new(&storage, denormalizer);

    info!(file = %file.display(), records = values.len(), "importing categories");

    let bar = progress_bar(values.len(), "Importing")?;
    let mut summary = ImportSummary::default();

    for (idx, value) in values.into_iter().enumerate() {
        let record = CategoryRecord::from_value(value)
            .map_err(|e| eyre!("record {}: {e}", idx + 1))?;
        let outcome = importer.import(record).await?;
        summary.record(&outcome);
        bar.inc(1);

        if let ImportOutcome::ParentNotFound(parent) = outcome {
            if stop_on_error {
                bar.abandon();
                return Err(eyre!(
                    "record {}: parent category {parent} not found, stopping",
                    idx + 1
                ));
            }
        }
    }
    bar.finish_and_clear();

    println!();
    println!("  Import finished.");
    println!("  Created:        {}", summary.created);
    println!("  Updated:        {}", summary.updated);
    println!("  Parent missing: {}", summary.parent_missing);
    println!("  Total:          {}", summary.total());
    println!();

    Ok(())
}

async fn cmd_assign(db: Option<&Path>, article: &str, category: &str) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;
    let denormalizer = config
        .import
        .denormalize
        .then(|| StorageDenormalizer::new(&storage));
    let mut importer = CategoryImporter::new(&storage, denormalizer);

    let article_id = value_to_int(&Value::String(article.into()));
    let category_id = value_to_int(&Value::String(category.into()));

    let outcome = importer
        .assign_articles_to_category(article_id, category_id)
        .await?;

    match outcome {
        AssignOutcome::Skipped => println!("Nothing to do: identifiers must be non-zero."),
        AssignOutcome::Inserted => {
            println!("Linked article {article_id} to category {category_id}.")
        }
        AssignOutcome::Unchanged => println!(
            "Article {article_id} was already linked to category {category_id}, or the category does not exist."
        ),
        AssignOutcome::Failed => println!("Linking article {article_id} failed."),
    }
    Ok(())
}

async fn cmd_link(db: Option<&Path>, file: &Path) -> Result<()> {
    let config = load_config()?;
    let values = read_values(file)?;
    let storage = open_storage(db, &config).await?;
    let denormalizer = config
        .import
        .denormalize
        .then(|| StorageDenormalizer::new(&storage));
    let mut importer = CategoryImporter::new(&storage, denormalizer);

    info!(file = %file.display(), links = values.len(), "assigning articles");

    let bar = progress_bar(values.len(), "Linking")?;
    let (mut inserted, mut unchanged, mut skipped, mut failed) = (0usize, 0usize, 0usize, 0usize);

    for (idx, value) in values.iter().enumerate() {
        let article_id = int_field(value, &["article", "article_id", "articleID"]);
        let category_id = int_field(value, &["category", "category_id", "categoryID"]);

        match importer
            .assign_articles_to_category(article_id, category_id)
            .await?
        {
            AssignOutcome::Inserted => inserted += 1,
            AssignOutcome::Unchanged => unchanged += 1,
            AssignOutcome::Skipped => {
                warn!(entry = idx + 1, "skipping assignment with zero identifier");
                skipped += 1;
            }
            AssignOutcome::Failed => failed += 1,
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!();
    println!("  Assignment finished.");
    println!("  Inserted:  {inserted}");
    println!("  Unchanged: {unchanged}");
    println!("  Skipped:   {skipped}");
    println!("  Failed:    {failed}");
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
