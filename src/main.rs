use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Generate Go type declarations from JSON Schema protocol definitions.
///
/// Reads a JSON Schema document describing a set of related record types
/// and emits a single Go source file of struct type definitions ready to
/// json.Unmarshal into, with optional constructors, decode dispatch, and
/// handling scaffolds.
#[derive(Parser)]
#[command(name = "jsonschema-go-gen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a JSON Schema document and cache it locally.
    #[cfg(feature = "download")]
    DownloadSchema {
        /// URL of the JSON Schema document to fetch.
        #[arg(
            long,
            default_value = "https://raw.githubusercontent.com/microsoft/vscode-debugadapter-node/main/debugProtocol.json",
            env = "JSONSCHEMA_URL"
        )]
        url: String,

        /// File path to save the downloaded schema to.
        #[arg(long, default_value = "protocol.json")]
        output: PathBuf,
    },

    /// Generate Go source from a JSON Schema document.
    Generate {
        /// Path to the JSON Schema document.
        #[arg(long)]
        schema: PathBuf,

        /// Go package name for the generated source.
        #[arg(long)]
        package: String,

        /// Output file for the generated Go source; stdout if omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Base type to generate a downcast accessor and variant
        /// constructors for (repeatable).
        #[arg(long = "ctor-base", value_name = "BASE")]
        ctor_bases: Vec<String>,

        /// Base type and discriminator property to generate decode
        /// dispatch for (repeatable).
        ///
        /// Example: --decode-helper ProtocolMessage=type
        #[arg(long = "decode-helper", value_name = "BASE=PROP", value_parser = parse_pair)]
        decode_helpers: Vec<(String, String)>,

        /// Input and output base types to generate a handling scaffold
        /// for (repeatable).
        ///
        /// Example: --scaffold Request=Response
        #[arg(long = "scaffold", value_name = "INBASE=OUTBASE", value_parser = parse_pair)]
        scaffolds: Vec<(String, String)>,

        /// Override one primitive type mapping, e.g. number=float64
        /// (repeatable).
        #[arg(long = "map-type", value_name = "NAME=GOTYPE", value_parser = parse_pair)]
        map_types: Vec<(String, String)>,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },
}

/// Parse one KEY=VALUE command-line pair.
fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn run(cli: Cli) -> jsonschema_go_gen::error::Result<()> {
    match cli.command {
        #[cfg(feature = "download")]
        Commands::DownloadSchema { url, output } => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| jsonschema_go_gen::error::Error::Schema(e.to_string()))?;
            rt.block_on(jsonschema_go_gen::schema::download_schema(&url, &output))?;
        }

        Commands::Generate {
            schema,
            package,
            output,
            ctor_bases,
            decode_helpers,
            scaffolds,
            map_types,
            quiet,
        } => {
            if !quiet {
                eprintln!("Loading schema from {}", schema.display());
            }
            let doc = jsonschema_go_gen::schema::load_schema(&schema)?;
            if !quiet {
                eprintln!(
                    "Loaded schema '{}': {} definitions",
                    doc.title,
                    doc.definitions.len()
                );
            }

            let mut opts = jsonschema_go_gen::codegen::Options::new(package);
            opts.ctor_base_types = ctor_bases;
            opts.decode_helpers = decode_helpers.into_iter().collect();
            opts.handling_scaffolds = scaffolds.into_iter().collect();
            for (name, go_type) in map_types {
                opts.type_map.set(name, go_type);
            }

            let generated = jsonschema_go_gen::codegen::generate(&doc, &opts)?;

            match &output {
                Some(path) => {
                    std::fs::write(path, &generated).map_err(|e| {
                        jsonschema_go_gen::error::Error::Write {
                            path: path.clone(),
                            source: e,
                        }
                    })?;
                    if !quiet {
                        eprintln!("Wrote {} bytes to {}", generated.len(), path.display());
                    }
                }
                None => {
                    print!("{generated}");
                }
            }
        }
    }

    Ok(())
}
