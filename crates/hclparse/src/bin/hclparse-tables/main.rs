mod cli;

use hclparse::cache::TableCache;
use hclparse::grammar::{NonTerminal, Rule, Terminal, FORMAT_VERSION};
use hclparse::table::Action;
use hclparse::{CacheMode, ParseTable, ParserConfig};
use std::path::PathBuf;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLPARSE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let command_result = match cli.command {
        cli::Command::Generate(generate_cli) => generate(generate_cli),
        cli::Command::Verify(verify_cli) => verify(verify_cli),
        cli::Command::Fingerprint => {
            println!("{}", hclparse::grammar::Fingerprint::of_grammar());
            Ok(())
        }
        cli::Command::Stats(stats_cli) => stats(stats_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

/// `--output`, or the location the library would use
fn cache_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match ParserConfig::from_env().cache {
        CacheMode::File(path) => Ok(path),
        CacheMode::Disabled => anyhow::bail!(
            "Table cache is disabled via {}, pass --output",
            hclparse::config::CACHE_ENV
        ),
    }
}

pub fn generate(cli: cli::GenerateCommand) -> anyhow::Result<()> {
    let cache = TableCache::new(cache_path(cli.output)?);

    if !cli.force {
        match cache.load() {
            Ok(_) => {
                tracing::info!(path=%cache.path().display(), "cache file is up to date");
                println!("{}", cache.path().display());
                return Ok(());
            }
            Err(err) => tracing::info!(path=%cache.path().display(), error=%err, "regenerating"),
        }
    }

    let table = ParseTable::build();
    anyhow::ensure!(
        table.conflicts().is_empty(),
        "Grammar has {} unresolved conflicts",
        table.conflicts().len()
    );
    cache.store(&table)?;

    println!("{}", cache.path().display());
    Ok(())
}

pub fn verify(cli: cli::VerifyCommand) -> anyhow::Result<()> {
    let cache = TableCache::new(cache_path(cli.input)?);
    let table = cache.load()?;
    anyhow::ensure!(
        table == ParseTable::build(),
        "Cache file {} differs from a fresh build",
        cache.path().display()
    );
    println!("{}: ok ({})", cache.path().display(), table.fingerprint());
    Ok(())
}

#[derive(serde::Serialize)]
struct TableStats {
    fingerprint: String,
    format_version: u32,
    terminals: usize,
    non_terminals: usize,
    rules: usize,
    states: usize,
    shifts: usize,
    reduces: usize,
    gotos: usize,
    conflicts: usize,
}

impl TableStats {
    fn of(table: &ParseTable) -> Self {
        let states = table.state_count();
        let actions: Vec<Action> = (0..states as u32)
            .flat_map(|state| {
                Terminal::ALL
                    .into_iter()
                    .map(move |terminal| table.action(state, terminal))
            })
            .collect();
        let gotos = (0..states as u32)
            .flat_map(|state| {
                NonTerminal::ALL
                    .into_iter()
                    .filter_map(move |non_terminal| table.goto(state, non_terminal))
            })
            .count();

        Self {
            fingerprint: table.fingerprint().to_string(),
            format_version: FORMAT_VERSION,
            terminals: Terminal::ALL.len(),
            non_terminals: NonTerminal::ALL.len(),
            rules: Rule::ALL.len(),
            states,
            shifts: actions
                .iter()
                .filter(|action| matches!(action, Action::Shift(_)))
                .count(),
            reduces: actions
                .iter()
                .filter(|action| matches!(action, Action::Reduce(_)))
                .count(),
            gotos,
            conflicts: table.conflicts().len(),
        }
    }
}

fn stats(cli: cli::StatsCommand) -> anyhow::Result<()> {
    let stats = TableStats::of(&ParseTable::build());

    match cli.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &stats)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &stats)?,
    };

    Ok(())
}
