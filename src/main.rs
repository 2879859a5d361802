use anyhow::{Context, Result};
use clap::{ArgAction, Parser as ClapParser, Subcommand, ValueEnum};
use rtfread_rust::codepage::{Latin1, Windows1252};
use rtfread_rust::lexer::tokenize;
use rtfread_rust::{CodepageDecoder, Converter, InterpreterOptions};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;

#[derive(ClapParser)]
#[command(name = "rtfread")]
#[command(about = "Extract plain text from RTF documents", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize the input file and print the events
    Lex {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Convert the input file to plain text
    Text {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Apply hex escapes at every group depth, not just the document group
        #[arg(long)]
        hex_any_depth: bool,

        /// Skip groups of the form {\*\unknown ...}
        #[arg(long)]
        skip_unknown_ignorable: bool,

        /// Leave \bin payloads in the input instead of discarding them
        #[arg(long)]
        keep_binary: bool,

        /// Decoder for 8-bit text in hex escapes
        #[arg(long, value_enum, default_value_t = DecoderChoice::Windows1252)]
        codepage_decoder: DecoderChoice,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DecoderChoice {
    Raw,
    Latin1,
    Windows1252,
}

impl DecoderChoice {
    fn decoder(self) -> Option<Box<dyn CodepageDecoder>> {
        match self {
            DecoderChoice::Raw => None,
            DecoderChoice::Latin1 => Some(Box::new(Latin1)),
            DecoderChoice::Windows1252 => Some(Box::new(Windows1252)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Lex { file } => lex_file(&file)?,
        Commands::Text {
            file,
            output,
            hex_any_depth,
            skip_unknown_ignorable,
            keep_binary,
            codepage_decoder,
        } => {
            let options = InterpreterOptions {
                hex_group_level: if hex_any_depth { None } else { Some(1) },
                skip_unknown_ignorable,
                skip_binary: !keep_binary,
            };
            text_file(&file, output.as_deref(), options, codepage_decoder)?
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn lex_file(path: &PathBuf) -> Result<()> {
    let input = fs::read(path).with_context(|| format!("failed to read file '{}'", path.display()))?;

    let tokens = tokenize(&input)
        .with_context(|| format!("failed to tokenize '{}'", path.display()))?;

    for token in &tokens {
        println!(
            "{}:{}:{} {}",
            path.display(),
            token.pos.line,
            token.pos.column,
            token.event
        );
    }

    println!("\nTotal events: {}", tokens.len());

    Ok(())
}

fn text_file(
    path: &PathBuf,
    output: Option<&std::path::Path>,
    options: InterpreterOptions,
    decoder: DecoderChoice,
) -> Result<()> {
    let mut converter = Converter::new().with_options(options);
    if let Some(decoder) = decoder.decoder() {
        converter = converter.with_decoder(decoder);
    }

    let conversion = converter
        .convert_file(path)
        .with_context(|| format!("failed to convert '{}'", path.display()))?;

    for diagnostic in &conversion.diagnostics {
        eprintln!("{}:{}", path.display(), diagnostic);
    }

    match output {
        Some(output_path) => fs::write(output_path, &conversion.text)
            .with_context(|| format!("failed to write text to '{}'", output_path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(conversion.text.as_bytes())
            .context("failed to write text to stdout")?,
    }

    Ok(())
}
