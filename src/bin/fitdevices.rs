//! Print the creator and the other devices described by FIT files as JSON.

use std::{
    fs::File,
    io::{BufReader, Read, stdin},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use freewheel::{
    avec::reader::{self, inflate},
    devices::extract_devices,
};
use serde_json::json;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fail on the first decoding error instead of reporting what was decoded.
    #[arg(long)]
    strict: bool,
    /// FIT files, optionally gzip-compressed. Standard input is read when
    /// none are given.
    fit_files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    freewheel::host::init();

    let args = Args::parse();
    debug!(?args, "arguments");

    if args.fit_files.is_empty() {
        return print_devices(&args, stdin().lock());
    }

    for path in &args.fit_files {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        print_devices(&args, inflate(BufReader::new(file))?)
            .with_context(|| format!("decoding {}", path.display()))?;
    }

    Ok(())
}

fn print_devices(args: &Args, input: impl Read) -> anyhow::Result<()> {
    let mut failure = None;

    let records = reader::records(input)
        .map_while(|item| match item {
            Ok(record) => Some(Some(record)),
            Err(err) if args.strict => {
                failure = Some(err);
                None
            }
            Err(err) => {
                error!(%err, "skipping undecodable input");
                Some(None)
            }
        })
        .flatten();

    let (creator, devices) = extract_devices(records);

    if let Some(err) = failure {
        return Err(err.into());
    }

    println!("{}", json!({ "creator": creator, "devices": devices }));
    Ok(())
}
