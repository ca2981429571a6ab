use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use env_logger::Env;
use timetable_parser::{convert, read_table_from_path, Options};

mod cli;
mod server;

use cli::Mode;

fn setup_logging() {
    env_logger::Builder::from_env(
        Env::new().filter_or("LOG", "timetable_ics=info,timetable_parser=info"),
    )
    .init();
}

fn convert_file(input: &Path, output: Option<&Path>, json: bool, options: &Options) -> Result<()> {
    let rows = read_table_from_path(input)
        .with_context(|| format!("Failed to read timetable {}", input.display()))?;
    let calendar = convert(&rows, options)?;

    if !calendar.skipped.is_empty() {
        log::warn!(
            "{} of {} rows could not be converted",
            calendar.skipped.len(),
            rows.len()
        );
    }

    let rendered = if json {
        serde_json::to_string_pretty(&calendar)?
    } else {
        calendar.to_ics(&options.time_zone)
    };

    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }

    log::info!("Wrote {} events", calendar.events.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    setup_logging();

    match args.mode {
        Mode::Convert {
            input,
            output,
            json,
        } => convert_file(&input, output.as_deref(), json, &args.options),
        Mode::Serve { address } => server::serve(address, args.options)
            .await
            .context("HTTP server failed"),
    }
}
