//! Command-line interface for cfgtree
//! Inspects, queries, merges and validates INI configuration files.
//!
//! Usage:
//!   cfgtree tokens `<file>` [--format simple|json]        - Dump the INI tokens of a file
//!   cfgtree parse `<file>` [--format `<format>`]          - Parse a file and render the tree
//!   cfgtree get `<file>` `<path>` [--node]                - Print a property or a subtree
//!   cfgtree merge `<base>` `<overlay>` [--format `<format>`] - Merge overlay into base
//!   cfgtree validate `<file>` `<schema>` [--all] [--allow-unknown] - Check a file against a schema
//!
//! Global options: `--settings <toml>` layers a settings file over the defaults, `-v`
//! (repeatable) raises the log level.

use anyhow::{bail, Context, Result};
use cfgtree::config::{ConfigDocument, Resource, ValidationFlags};
use cfgtree::formats::ini::IniParser;
use cfgtree::formats::{FormatRegistry, IniFormatter};
use cfgtree::settings::{Loader, Settings};
use cfgtree::NodeRef;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

fn cli() -> Command {
    let format_arg = Arg::new("format")
        .long("format")
        .short('f')
        .help("Output format: json, yaml, ini or paths (defaults to output.format)");

    Command::new("cfgtree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting and combining INI configuration files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("settings")
                .long("settings")
                .global(true)
                .help("Settings file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("tokens")
                .about("Dump the INI tokens of a file")
                .arg(Arg::new("file").required(true).index(1))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["simple", "json"])
                        .default_value("simple"),
                ),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a file and render the resulting tree")
                .arg(Arg::new("file").required(true).index(1))
                .arg(format_arg.clone()),
        )
        .subcommand(
            Command::new("get")
                .about("Print the property at a dotted path, or a whole node with --node")
                .arg(Arg::new("file").required(true).index(1))
                .arg(Arg::new("path").required(true).index(2))
                .arg(
                    Arg::new("node")
                        .long("node")
                        .action(ArgAction::SetTrue)
                        .help("Treat the path as a node and print its subtree as INI"),
                ),
        )
        .subcommand(
            Command::new("merge")
                .about("Merge an overlay file into a base file")
                .arg(Arg::new("base").required(true).index(1))
                .arg(Arg::new("overlay").required(true).index(2))
                .arg(format_arg),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a file against a schema file")
                .arg(Arg::new("file").required(true).index(1))
                .arg(Arg::new("schema").required(true).index(2))
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Report every violation instead of stopping at the first"),
                )
                .arg(
                    Arg::new("allow-unknown")
                        .long("allow-unknown")
                        .action(ArgAction::SetTrue)
                        .help("Accept nodes and properties the schema doesn't mention"),
                ),
        )
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"))?;
    let settings = load_settings(&matches)?;

    match matches.subcommand() {
        Some(("tokens", sub)) => handle_tokens(sub, &settings),
        Some(("parse", sub)) => handle_parse(sub, &settings),
        Some(("get", sub)) => handle_get(sub, &settings),
        Some(("merge", sub)) => handle_merge(sub, &settings),
        Some(("validate", sub)) => handle_validate(sub, &settings),
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

/// - 0 (default): `RUST_LOG`, or warnings and errors
/// - 1 (-v): info
/// - 2 (-vv): debug
/// - 3+ (-vvv): trace
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

fn load_settings(matches: &ArgMatches) -> Result<Settings> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("settings") {
        loader = loader.with_file(path);
    }
    let settings = loader.build().context("Failed to load settings")?;
    tracing::debug!(?settings, "settings loaded");
    Ok(settings)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("missing argument '{name}'"))
}

fn load_document(path: &str, settings: &Settings) -> Result<ConfigDocument> {
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let mut parser = IniParser::with_settings(&settings.ini)?;
    let document = ConfigDocument::load(Resource::file(path), BufReader::new(file), &mut parser)
        .with_context(|| format!("Failed to parse {path}"))?;
    Ok(document)
}

fn render(node: NodeRef<'_>, format: Option<&str>, settings: &Settings) -> Result<()> {
    let format = format.unwrap_or(settings.output.format.as_str());
    let mut registry = FormatRegistry::with_defaults(settings.output.pretty);
    registry.register(IniFormatter::new(settings.ini.clone()));
    let text = registry.render(node, format)?;
    print!("{text}");
    if !text.is_empty() && !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn format_arg(matches: &ArgMatches) -> Option<&str> {
    matches.get_one::<String>("format").map(String::as_str)
}

fn handle_tokens(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let path = required(matches, "file")?;
    let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let parser = IniParser::with_settings(&settings.ini)?;
    let tokens = parser.tokenize_reader(BufReader::new(file))?;

    match format_arg(matches) {
        Some("json") => println!("{}", serde_json::to_string_pretty(&tokens)?),
        _ => {
            for token in &tokens {
                println!(
                    "{}:{}\t{:?}\t{:?}",
                    token.line, token.column, token.kind, token.text
                );
            }
        }
    }
    Ok(())
}

fn handle_parse(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let document = load_document(required(matches, "file")?, settings)?;
    render(document.root(), format_arg(matches), settings)
}

fn handle_get(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let document = load_document(required(matches, "file")?, settings)?;
    let path = required(matches, "path")?;
    let root = document.root();

    if matches.get_flag("node") {
        render(root.child(path)?, Some("ini"), settings)
    } else {
        println!("{}", root.property(path)?);
        Ok(())
    }
}

fn handle_merge(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let mut base = load_document(required(matches, "base")?, settings)?;
    let mut overlay = load_document(required(matches, "overlay")?, settings)?.into_tree();
    // keep the base document's name
    overlay.root_mut().set_name("")?;
    base.merge(&overlay)?;
    render(base.root(), format_arg(matches), settings)
}

fn handle_validate(matches: &ArgMatches, settings: &Settings) -> Result<()> {
    let file = required(matches, "file")?;
    let mut document = load_document(file, settings)?;
    let schema = load_document(required(matches, "schema")?, settings)?;

    let mut flags = ValidationFlags::NONE;
    if !matches.get_flag("all") {
        flags = flags | ValidationFlags::FIRST_ONLY;
    }
    if matches.get_flag("allow-unknown") {
        flags = flags | ValidationFlags::ALLOW_UNKNOWN;
    }

    document
        .root_mut()
        .set_schema(Some(Arc::new(schema.into_tree())));
    document.root().validate(flags)?;
    println!("{file}: valid");
    Ok(())
}
