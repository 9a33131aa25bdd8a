use anyhow::{bail, Context, Result};
use clap::Parser;
use csvload::{
    duck, infer_schema, ColumnType, ConnectOptions, ImportOptions, ImportSummary, Importer, Sink,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Load a CSV file into a database table")]
struct Args {
    /// Target table, optionally `schema.table`
    #[arg(short, long)]
    table: String,
    /// Source CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// PostgreSQL host, optionally `host:port`
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long, env = "CSVLOAD_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
    #[arg(long)]
    database: Option<String>,

    /// Load into a DuckDB file instead of PostgreSQL
    #[arg(long, conflicts_with = "host")]
    duckdb: Option<String>,
    /// Print the inferred schema as JSON and exit
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value_t = csvload::config::DEFAULT_SAMPLE_ROWS)]
    sample_rows: usize,
    #[arg(long, default_value_t = csvload::config::DEFAULT_TEXT_LIMIT, value_parser = parse_text_limit)]
    text_limit: usize,
    /// Force a column type, e.g. `--column date_added=date`
    #[arg(long = "column", value_parser = parse_override)]
    columns: Vec<(String, ColumnType)>,
}

fn parse_override(s: &str) -> Result<(String, ColumnType), String> {
    let (name, ty) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=type, got `{}`", s))?;
    Ok((name.trim().to_string(), ty.parse()?))
}

fn parse_text_limit(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("text limit must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    // ─── 2) options ──────────────────────────────────────────────────
    let mut options = ImportOptions::default()
        .with_sample_rows(args.sample_rows)
        .with_text_limit(args.text_limit);
    for (name, ty) in &args.columns {
        options = options.with_override(name.clone(), *ty);
    }

    // ─── 3) pick a sink and run ──────────────────────────────────────
    if args.dry_run {
        let schema = infer_schema(&args.file, &options)?;
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let summary = if let Some(path) = &args.duckdb {
        let conn = duck::open_disk_db(path).with_context(|| format!("opening {}", path))?;
        run(Importer::with_sink(conn), options, &args.table, &args.file)?
    } else {
        let (Some(host), Some(user), Some(database)) = (&args.host, &args.user, &args.database)
        else {
            bail!("--host, --user and --database are required unless --duckdb or --dry-run is given");
        };
        let importer = Importer::connect(&ConnectOptions::new(host, user, &args.password, database))?;
        run(importer, options, &args.table, &args.file)?
    };

    info!(
        table = %summary.table,
        created = summary.created,
        inserted = summary.inserted,
        skipped = summary.skipped,
        nulled_cells = summary.nulled_cells,
        "done"
    );
    Ok(())
}

fn run<S: Sink>(
    importer: Importer<S>,
    options: ImportOptions,
    table: &str,
    file: &Path,
) -> Result<ImportSummary> {
    let mut importer = importer.with_options(options);
    let summary = importer
        .import_file(table, file)
        .with_context(|| format!("importing {} into {}", file.display(), table))?;
    importer.close()?;
    Ok(summary)
}
