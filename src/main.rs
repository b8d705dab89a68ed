//! xbrlstream CLI - summarize and list facts of XBRL instance documents

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser as ClapParser, Subcommand};
use colored::*;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use xbrlstream::{Document, FactFilter, Parser, QName};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Streaming XBRL instance parser
///
/// Without a subcommand, prints the number of schemaRefs, contexts, units
/// and facts in the instance.
#[derive(ClapParser)]
#[command(name = "xbrlstream")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Instance document
    input: Option<PathBuf>,

    /// Show parse time
    #[arg(short, long)]
    stats: bool,

    /// More log output (RUST_LOG overrides)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List facts, optionally filtered
    Facts(FactsArgs),
}

#[derive(Args)]
struct FactsArgs {
    /// Instance document
    input: PathBuf,

    /// Concept local name
    #[arg(long)]
    concept_local: Option<String>,

    /// Concept namespace URI
    #[arg(long)]
    concept_uri: Option<String>,

    /// Context id (contextRef)
    #[arg(long = "context")]
    context_id: Option<String>,

    /// Unit id (unitRef)
    #[arg(long = "unit")]
    unit_id: Option<String>,

    /// Only facts with xsi:nil="true"
    #[arg(long, conflicts_with = "exclude_nil")]
    only_nil: bool,

    /// Only facts without xsi:nil="true"
    #[arg(long)]
    exclude_nil: bool,

    /// Required explicit member, as {dimension-uri}local={member-uri}local
    #[arg(long = "dimension", value_name = "DIM=MEMBER", value_parser = parse_dimension)]
    dimensions: Vec<(QName, QName)>,

    /// Collapse whitespace in displayed values
    #[arg(long)]
    normalize_spaces: bool,

    /// Write facts as a JSON array
    #[arg(long)]
    json: bool,

    /// Indent JSON output
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Load schemaRefs from files next to the instance and show concept value kinds
    #[arg(long)]
    taxonomy: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Facts(args)) => list_facts(args),
        None => match cli.input {
            Some(input) => summarize(&input, cli.stats),
            None => bail!("missing instance document"),
        },
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse(input: &Path, parser: &Parser) -> Result<Document> {
    parser
        .parse_file(input)
        .with_context(|| format!("Failed to parse {}", input.display()))
}

fn summarize(input: &Path, stats: bool) -> Result<()> {
    let start = Instant::now();
    let doc = parse(input, &Parser::new())?;
    let elapsed = start.elapsed();

    println!("{} {}", "✓".green().bold(), input.display());
    println!("  schemaRefs: {}", doc.schema_refs().len());
    println!("  contexts  : {}", doc.contexts().len());
    println!("  units     : {}", doc.units().len());
    println!("  facts     : {}", doc.facts().len());

    if stats {
        println!("  Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
        println!(
            "  Throughput: {:.0} facts/sec",
            doc.facts().len() as f64 / elapsed.as_secs_f64()
        );
    }
    Ok(())
}

fn list_facts(args: FactsArgs) -> Result<()> {
    let parser = Parser::new().with_schema_loading(args.taxonomy);
    let doc = parse(&args.input, &parser)?;

    let filter = build_filter(&args);
    let facts = doc.filter_facts(&filter);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.json {
        xbrlstream::export::encode_facts_json(&mut out, facts.iter().copied(), args.pretty)
            .context("Failed to write JSON")?;
        out.flush()?;
        return Ok(());
    }

    if facts.is_empty() {
        writeln!(out, "{}", "no facts matched the filter".yellow())?;
        out.flush()?;
        return Ok(());
    }

    for fact in facts {
        let value = if fact.is_nil() {
            "(nil)".dimmed().to_string()
        } else if args.normalize_spaces {
            fact.normalized_value()
        } else {
            fact.value().to_owned()
        };

        write!(
            out,
            "{}\tctx={}\tunit={}\tdecimals={}",
            fact.name().to_string().cyan(),
            fact.context_ref(),
            fact.unit_ref(),
            fact.decimals(),
        )?;
        if args.taxonomy {
            let kind = xbrlstream::value::value_kind_of(doc.concept_of(fact));
            write!(out, "\tkind={kind}")?;
        }
        writeln!(out, "\tvalue={value}")?;
    }
    out.flush()?;
    Ok(())
}

fn build_filter(args: &FactsArgs) -> FactFilter {
    let mut filter = FactFilter::new()
        .concept_local(args.concept_local.as_deref().unwrap_or_default())
        .concept_uri(args.concept_uri.as_deref().unwrap_or_default())
        .context_id(args.context_id.as_deref().unwrap_or_default())
        .unit_id(args.unit_id.as_deref().unwrap_or_default());

    if args.only_nil {
        filter = filter.only_nil();
    } else if args.exclude_nil {
        filter = filter.exclude_nil();
    }

    for (dimension, member) in &args.dimensions {
        filter = filter.dimension(dimension.clone(), member.clone());
    }
    filter
}

fn parse_dimension(s: &str) -> Result<(QName, QName), String> {
    let (dimension, member) = split_pair(s)
        .ok_or_else(|| format!("expected DIM=MEMBER in Clark notation, got {s:?}"))?;
    Ok((parse_clark(dimension)?, parse_clark(member)?))
}

/// Split at the first `=` outside a `{...}` namespace part.
fn split_pair(s: &str) -> Option<(&str, &str)> {
    let mut in_uri = false;
    for (i, c) in s.char_indices() {
        match c {
            '{' => in_uri = true,
            '}' => in_uri = false,
            '=' if !in_uri => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

/// `{uri}local`, or a bare `local` in no namespace.
fn parse_clark(s: &str) -> Result<QName, String> {
    let s = s.trim();
    let (uri, local) = match s.strip_prefix('{') {
        Some(rest) => rest
            .split_once('}')
            .ok_or_else(|| format!("unterminated namespace in {s:?}"))?,
        None => ("", s),
    };
    if local.is_empty() {
        return Err(format!("missing local name in {s:?}"));
    }
    Ok(QName::new("", local, uri))
}
