use anyhow::{Context, Result, bail};
use folio_config::Config;
use folio_engine::clipboard::export::export_selection;
use folio_engine::clipboard::import::{ImportOptions, import_html, import_plain_text};
use folio_engine::clipboard::{FRAGMENT_MIME, Fragment};
use folio_engine::selection::select_all;
use folio_engine::{Document, format_nodes};
use std::{env, path::PathBuf, process};

const USAGE: &str = "Usage: folio-cli [--config <path>] <import|plain|roundtrip|json> <file>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// HTML file to canonical tree
    Import,
    /// Text file to canonical tree
    Plain,
    /// HTML file imported, then exported again
    Roundtrip,
    /// HTML file to the same-editor fragment payload
    Json,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "import" => Some(Command::Import),
            "plain" => Some(Command::Plain),
            "roundtrip" => Some(Command::Roundtrip),
            "json" => Some(Command::Json),
            _ => None,
        }
    }
}

struct Args {
    config: Option<PathBuf>,
    command: Command,
    file: PathBuf,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut rest = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config needs a path")?;
            config = Some(PathBuf::from(path));
        } else {
            rest.push(arg.as_str());
        }
    }
    let [command, file] = rest.as_slice() else {
        bail!("expected a command and a file");
    };
    let Some(command) = Command::parse(command) else {
        bail!("unknown command '{command}'");
    };
    Ok(Args {
        config,
        command,
        file: PathBuf::from(file),
    })
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => Config::expand_path(&path).unwrap_or(path),
        None => Config::config_path(),
    };
    let config = Config::load_from_path(&config_path)?;
    if config.is_none() {
        log::debug!("no config at {}, using defaults", config_path.display());
    }
    Ok(config.unwrap_or_default())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config)?;
    let input = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let fragment = match args.command {
        Command::Plain => import_plain_text(&input),
        _ => import_html(&input, &config.import),
    };
    log::info!("imported {} blocks from {}", fragment.blocks.len(), args.file.display());

    match args.command {
        Command::Import | Command::Plain => print!("{}", format_nodes(&fragment.blocks)),
        Command::Roundtrip => roundtrip(&fragment, &config.import)?,
        Command::Json => println!("{}", serde_json::to_string_pretty(&fragment)?),
    }
    Ok(())
}

fn roundtrip(fragment: &Fragment, options: &ImportOptions) -> Result<()> {
    let doc = Document::new(fragment.blocks.clone());
    let data = export_selection(&doc, &select_all(&doc));
    for mime in data.mimes().filter(|m| *m != FRAGMENT_MIME) {
        println!("--- {mime}");
        println!("{}", data.get(mime).unwrap_or_default());
    }
    let again = import_html(data.html().unwrap_or_default(), options);
    if format_nodes(&again.blocks) != format_nodes(&fragment.blocks) {
        log::warn!("re-importing the exported HTML gives a different tree");
        println!("--- reimported");
        print!("{}", format_nodes(&again.blocks));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };
    run(args)
}
