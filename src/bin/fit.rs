//! Print the records of FIT files as JSON, one record per line.

use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use freewheel::avec::reader::{self, inflate};
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Add the position in degrees to records carrying one, as `coordinates`.
    #[arg(long)]
    wgs84: bool,
    /// FIT files, optionally gzip-compressed.
    fit_files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    freewheel::host::init();

    let args = Args::parse();
    debug!(?args, "arguments");

    for path in &args.fit_files {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let input = inflate(BufReader::new(file))?;

        for item in reader::records(input) {
            let record = match item {
                Ok(record) => record,
                Err(reader::Error::Decode(warning)) if !warning.is_fatal() => {
                    warn!(%warning, path = %path.display(), "decoding");
                    continue;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("decoding {}", path.display()));
                }
            };

            let mut json = serde_json::to_value(&record)?;
            if args.wgs84
                && let Some(coordinates) = record.coordinates()
            {
                json["coordinates"] = serde_json::to_value(coordinates)?;
            }

            println!("{json}");
        }
    }

    Ok(())
}
