use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use apisurface::{load_module, ApiWriter, CSharpRenderer, EntityRenderer, MarkdownRenderer};

fn cli() -> Command {
    Command::new("apisurface")
        .about("Render the public API of a .NET module model as C# text")
        .arg(
            Arg::new("input")
                .help("Module model JSON file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("include-internals")
                .long("include-internals")
                .help("Also render internal and private protected entities")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("binary-enums")
                .long("binary-enums")
                .help("Write enum values as binary literals")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hex-enums")
                .long("hex-enums")
                .help("Write enum values as hexadecimal literals")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("char-enums")
                .long("char-enums")
                .help("Write printable enum values as char literals")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("include-attribute")
                .long("include-attribute")
                .value_name("PATTERN")
                .help("Only render attributes whose full name matches (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("exclude-attribute")
                .long("exclude-attribute")
                .value_name("PATTERN")
                .help("Never render attributes whose full name matches (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["csharp", "markdown"])
                .default_value("csharp")
                .help("Output syntax"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_parser(value_parser!(PathBuf))
                .help("Write to a file instead of stdout"),
        )
}

fn run<R: EntityRenderer>(renderer: R, matches: &clap::ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<PathBuf>("input")
        .context("missing input file")?;
    let module = load_module(input)?;

    let mut writer = ApiWriter::new(renderer);
    writer
        .include_internals(matches.get_flag("include-internals"))
        .enable_binary_enums(matches.get_flag("binary-enums"))
        .enable_hex_enums(matches.get_flag("hex-enums"))
        .enable_char_enums(matches.get_flag("char-enums"));
    if let Some(patterns) = matches.get_many::<String>("include-attribute") {
        writer.include_attributes(patterns)?;
    }
    if let Some(patterns) = matches.get_many::<String>("exclude-attribute") {
        writer.exclude_attributes(patterns)?;
    }

    let mut out: Box<dyn Write> = match matches.get_one::<PathBuf>("output") {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for line in writer.lines(&module) {
        writeln!(out, "{}", line.unwrap_or_default())?;
    }
    out.flush()?;

    for diagnostic in writer.diagnostics() {
        eprintln!("warning: {}", diagnostic);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.get_one::<String>("format").map(String::as_str) {
        Some("markdown") => run(MarkdownRenderer::new(), &matches),
        _ => run(CSharpRenderer::new(), &matches),
    }
}
