//! Where the magic happens for `uacdesc` binary!
use clap::{Parser, Subcommand};
use itertools::Itertools;
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use uacdesc::catalog::{self, DescriptorContext};
use uacdesc::codec::{self, DescriptorScanner};
use uacdesc::config::Config;
use uacdesc::descriptors::UacDescriptor;
use uacdesc::dump::Dumper;
use uacdesc::error::{Error, ErrorKind, Result};
use uacdesc::function::AudioControlBlock;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, max_term_width = 80)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Disable coloured output, can also use NO_COLOR environment variable
    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,

    /// Path to user config file to use for custom colours and defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Turn debugging information on. Alternatively can use RUST_LOG env: INFO, DEBUG, TRACE
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    debug: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode hex descriptor bytes; reads stdin if no bytes or file are given
    Decode {
        /// Interface or endpoint the descriptors were found in; default from config or AudioControl
        #[arg(long, value_enum)]
        context: Option<DescriptorContext>,

        /// Output as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Read hex from file rather than arguments
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Report unknown descriptors as errors rather than passing them through
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Bytes are a complete AudioControl interface: header followed by wTotalLength of entities
        #[arg(long, default_value_t = false)]
        block: bool,

        /// Hex bytes, separated by whitespace or commas, `0x` prefix optional
        hex: Vec<String>,
    },
    /// Encode descriptors given as JSON to hex; reads stdin if no JSON or file is given
    Encode {
        /// JSON is an AudioControl block rather than one or a list of descriptors
        #[arg(long, default_value_t = false)]
        block: bool,

        /// Read JSON from file rather than argument
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// JSON
        json: Option<String>,
    },
    /// List every supported descriptor kind with its layout and control table
    Catalog {
        /// Output as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// One descriptor or a list, as accepted by `encode`
#[derive(Deserialize)]
#[serde(untagged)]
enum EncodeInput {
    Many(Vec<UacDescriptor>),
    One(UacDescriptor),
}

fn read_input(file: Option<&PathBuf>, args: Option<String>) -> Result<String> {
    if let Some(path) = file {
        fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                &format!("Failed to read {}: {}", path.display(), e),
            )
        })
    } else if let Some(s) = args {
        Ok(s)
    } else {
        log::info!("Reading from stdin");
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        Ok(s)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn decode(
    config: &Config,
    context: Option<DescriptorContext>,
    json: bool,
    file: Option<&PathBuf>,
    strict: bool,
    block: bool,
    hex: Vec<String>,
) -> Result<()> {
    let hex = (!hex.is_empty()).then(|| hex.join(" "));
    let bytes = codec::parse_hex(&read_input(file, hex)?)?;
    let json = json || config.json;
    log::debug!("Decoding {} bytes", bytes.len());

    if block {
        let block = AudioControlBlock::decode(&bytes)?;
        if json {
            return print_json(&block);
        }
        let mut dumper = Dumper::new(config.colours.clone());
        dumper.dump_descriptor(
            &UacDescriptor::Header(block.header),
            DescriptorContext::AudioControl,
            0,
        );
        for e in &block.entities {
            dumper.dump_descriptor(e, DescriptorContext::AudioControl, 0);
        }
        print!("{}", dumper.finish());
        return Ok(());
    }

    let context = context
        .or(config.context)
        .unwrap_or(DescriptorContext::AudioControl);
    let passthrough = config.passthrough && !strict;
    let results: Vec<_> = DescriptorScanner::new(&bytes, context)
        .passthrough(passthrough)
        .collect();

    if json {
        let decoded: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        print_json(&decoded)?;
    } else {
        let mut dumper = Dumper::new(config.colours.clone());
        dumper.dump_scan(&results, context, 0);
        print!("{}", dumper.finish());
    }

    let mut errors: Vec<_> = results.into_iter().filter_map(|r| r.err()).collect();
    let last = errors.pop();
    for e in &errors {
        eprintln!("{}", e);
    }
    match last {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn encode(block: bool, file: Option<&PathBuf>, json: Option<String>) -> Result<()> {
    let input = read_input(file, json)?;
    let bytes = if block {
        serde_json::from_str::<AudioControlBlock>(&input)?.encode()?
    } else {
        let descriptors = match serde_json::from_str::<EncodeInput>(&input)? {
            EncodeInput::Many(v) => v,
            EncodeInput::One(d) => vec![d],
        };
        let mut ret = Vec::new();
        for d in &descriptors {
            ret.extend(codec::encode_descriptor(d)?);
        }
        ret
    };
    println!("{}", bytes.iter().map(|b| format!("{:02x}", b)).join(" "));
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::sys()?,
    };
    log::trace!("Config: {:?}", config);

    if args.no_color || config.no_color {
        colored::control::set_override(false);
    }

    match args.command {
        Command::Decode {
            context,
            json,
            file,
            strict,
            block,
            hex,
        } => decode(&config, context, json, file.as_ref(), strict, block, hex),
        Command::Encode { block, file, json } => encode(block, file.as_ref(), json),
        Command::Catalog { json } => {
            if json || config.json {
                print_json(&catalog::entries())
            } else {
                let mut dumper = Dumper::new(config.colours.clone());
                dumper.dump_catalog();
                print!("{}", dumper.finish());
                Ok(())
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = uacdesc::set_log_level(args.debug) {
        eprintln!("{}", e);
    }

    match run(args) {
        Ok(_) => (),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
