use anyhow::{Context, Result};
use apexfmt::{parse, IndentStyle, RenderConfig, SourceRenderer};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("apexfmt")
        .about("Format Apex source into canonical layout")
        .arg(
            Arg::new("input")
                .help("Apex source file (.cls)")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON config file (overrides the user config)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("chain-threshold")
                .long("chain-threshold")
                .help("Explode method chains with at least this many links")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .help("Indentation style")
                .value_parser(["tabs", "spaces"]),
        )
        .arg(
            Arg::new("indent-width")
                .long("indent-width")
                .help("Spaces per level with --indent spaces")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("tree")
                .long("tree")
                .help("Print the parsed syntax tree as JSON instead of formatting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("apexfmt={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<RenderConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RenderConfig::from_file(path)?,
        None => RenderConfig::discover()?,
    };

    if let Some(threshold) = matches.get_one::<usize>("chain-threshold") {
        config.chain_threshold = *threshold;
    }
    if let Some(style) = matches.get_one::<String>("indent") {
        config.indent_style = match style.as_str() {
            "spaces" => IndentStyle::Spaces,
            _ => IndentStyle::Tabs,
        };
    }
    if let Some(width) = matches.get_one::<usize>("indent-width") {
        config.indent_width = *width;
    }

    debug!(?config, "effective configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let input_file = matches
        .get_one::<PathBuf>("input")
        .context("missing input file")?;
    let config = load_config(&matches)?;

    let source = fs::read_to_string(input_file)
        .with_context(|| format!("failed to read {}", input_file.display()))?;
    let unit = parse(&source).with_context(|| format!("failed to parse {}", input_file.display()))?;
    info!(declaration = unit.declaration.name(), "parsed {}", input_file.display());

    if matches.get_flag("tree") {
        println!("{}", serde_json::to_string_pretty(&unit)?);
        return Ok(());
    }

    let output = SourceRenderer::new(&config)
        .render(&unit)
        .with_context(|| format!("failed to render {}", input_file.display()))?;
    print!("{}", output);

    Ok(())
}
