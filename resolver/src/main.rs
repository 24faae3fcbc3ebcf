//! InChI resolver CLI - annotate compound tables with InChI structures
//!
//! # Main Commands
//!
//! ```bash
//! inchi-resolver resolve compounds.tsv --name name --cas CAS --drugbank DrugbankID
//! inchi-resolver serve                      # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! inchi-resolver lookup cactus "benzoic acid"   # One adapter call
//! inchi-resolver parse compounds.tsv            # Just parse the table to JSON
//! ```
//!
//! Service URLs, timeout, retries and priority come from `INCHI_*`
//! environment variables (see `config`); flags override them.

use clap::{Parser, Subcommand, ValueEnum};
use inchi_resolver::{
    format_delimiter, parse_file, resolve_file, AdapterOutcome, FieldMapping, Identifier,
    PriorityOrder, ResolveOptions, Resolver, ResolverConfig, Source, DEFAULT_RESULT_COLUMN,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "inchi-resolver")]
#[command(about = "Resolve InChI structures by DrugBank ID, CAS number or name", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every row of a table and write it back with a result column
    Resolve {
        /// Input CSV/TSV file
        input: PathBuf,

        /// Column holding compound names
        #[arg(long)]
        name: Option<String>,

        /// Column holding CAS registry numbers
        #[arg(long)]
        cas: Option<String>,

        /// Column holding DrugBank IDs
        #[arg(long)]
        drugbank: Option<String>,

        /// Lookup order (default from INCHI_PRIORITY, else drugbank-first)
        #[arg(long)]
        priority: Option<PriorityOrder>,

        /// Result column, created or overwritten
        #[arg(long, default_value = DEFAULT_RESULT_COLUMN)]
        column: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Delimiter for input and output (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Transport retries per request
        #[arg(long)]
        retries: Option<u32>,
    },

    /// Query a single source for one identifier
    Lookup {
        /// cactus, drugbank or pubchem
        source: Source,

        /// Name, CAS number or DrugBank ID
        identifier: String,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            input,
            name,
            cas,
            drugbank,
            priority,
            column,
            format,
            delimiter,
            output,
            timeout,
            retries,
        } => {
            let mapping = FieldMapping {
                name,
                cas,
                drugbank_id: drugbank,
            };
            let overrides = Overrides {
                priority,
                timeout,
                retries,
            };
            cmd_resolve(&input, mapping, column, format, delimiter, output.as_deref(), overrides).await
        }

        Commands::Lookup { source, identifier } => cmd_lookup(source, &identifier).await,

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Flag values that take precedence over the environment.
#[derive(Default)]
struct Overrides {
    priority: Option<PriorityOrder>,
    timeout: Option<u64>,
    retries: Option<u32>,
}

fn load_config(overrides: Overrides) -> Result<ResolverConfig, Box<dyn std::error::Error>> {
    let mut config = ResolverConfig::from_env()?;
    if let Some(priority) = overrides.priority {
        config = config.with_priority(priority);
    }
    if let Some(secs) = overrides.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = overrides.retries {
        config = config.with_retries(retries);
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_resolve(
    input: &Path,
    mapping: FieldMapping,
    column: String,
    format: OutputFormat,
    delimiter: Option<char>,
    output: Option<&Path>,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    if mapping.is_empty() {
        return Err("map at least one of --name, --cas or --drugbank to a column".into());
    }

    let config = load_config(overrides)?;
    let resolver = Resolver::from_config(&config)?;
    let options = ResolveOptions::new(mapping).with_column(column);

    eprintln!("📄 Processing: {}", input.display());
    eprintln!("   Priority: {}", resolver.priority());

    let result = resolve_file(input, delimiter, &options, &resolver).await?;
    let stats = &result.report.stats;

    eprintln!("\n📊 Summary");
    eprintln!("   Rows:        {}", stats.total);
    eprintln!("   Resolved:    {}", stats.resolved);
    eprintln!("     DrugBank:  {}", stats.via_drugbank);
    eprintln!("     CACTUS:    {}", stats.via_cactus);
    eprintln!("     PubChem:   {}", stats.via_pubchem);
    eprintln!("   Unresolved:  {}", stats.unresolved);
    if stats.no_identifiers > 0 {
        eprintln!("     No identifiers: {}", stats.no_identifiers);
    }
    if stats.aborted > 0 {
        eprintln!("     Aborted:   {}", stats.aborted);
    }

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result.dataset.to_json_records())?,
        OutputFormat::Csv => {
            let used = delimiter
                .or_else(|| result.csv_info.as_ref().map(|info| info.delimiter))
                .unwrap_or(',');
            let byte = u8::try_from(used)
                .map_err(|_| format!("delimiter '{}' is not a single byte", format_delimiter(used)))?;
            result.dataset.to_csv_string(byte)?
        }
    };
    write_output(&content, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

async fn cmd_lookup(source: Source, identifier: &str) -> Result<(), Box<dyn std::error::Error>> {
    let identifier =
        Identifier::new(identifier).ok_or("identifier is empty or a missing-value marker")?;

    let config = load_config(Overrides::default())?;
    let resolver = Resolver::from_config(&config)?;

    eprintln!("🔎 {} → {}", identifier, source);

    match resolver.lookup(source, &identifier).await {
        AdapterOutcome::Success(inchi) => {
            println!("{}", inchi);
            Ok(())
        }
        other => Err(format!("{}: {}", source, other.summary()).into()),
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_file(input, delimiter)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.dataset.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.dataset.len());

    let json = serde_json::to_string_pretty(&result.dataset.to_json_records())?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(Overrides::default())?;
    inchi_resolver::server::start_server(port, config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
