//! Extract text from a PDF file.
//!
//! Usage:
//!   pdftext <file.pdf> [-d] [output.txt]
//!
//! Prints extracted text to stdout, or writes it UTF-8 BOM-prefixed to the
//! given output path. `-d` enables diagnostic logging on stderr.

use pdftext::{ExtractOptions, TextExtractor};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

struct CliArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    debug: bool,
}

impl CliArgs {
    fn parse() -> Option<Self> {
        let mut input = None;
        let mut output = None;
        let mut debug = false;

        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "-d" | "--debug" => debug = true,
                "-h" | "--help" => return None,
                _ if input.is_none() => input = Some(PathBuf::from(&arg)),
                _ if output.is_none() => output = Some(PathBuf::from(&arg)),
                other => {
                    eprintln!("ignoring extra argument: {}", other);
                },
            }
        }

        Some(Self {
            input: input?,
            output,
            debug,
        })
    }
}

fn run(args: &CliArgs) -> pdftext::Result<()> {
    let data = fs::read(&args.input)?;
    let options = ExtractOptions::default().with_debug(args.debug);
    let text = TextExtractor::with_options(options).extract_from_bytes(&data);

    match &args.output {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            // BOM so consumers that sniff encodings read the file as UTF-8
            file.write_all(b"\xEF\xBB\xBF")?;
            file.write_all(text.as_bytes())?;
            eprintln!("wrote {} bytes to {}", text.len(), path.display());
        },
        None => {
            println!("{}", text);
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = match CliArgs::parse() {
        Some(args) => args,
        None => {
            eprintln!("usage: pdftext <file.pdf> [-d] [output.txt]");
            return ExitCode::from(1);
        },
    };

    let mut builder = env_logger::Builder::from_default_env();
    if args.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        },
    }
}
