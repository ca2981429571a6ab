use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use getopts::Options as Opts;
use timetable_parser::{Language, Options, TimeZoneId};

const ADDRESS_VAR: &str = "TIMETABLE_ICS_ADDR";

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Convert {
        input: PathBuf,
        output: Option<PathBuf>,
        json: bool,
    },
    Serve {
        address: SocketAddr,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub mode: Mode,
    pub options: Options,
}

fn opts() -> Opts {
    let mut opts = Opts::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "i",
        "input",
        "Convert this .xlsx timetable and exit instead of serving HTTP",
        "FILE",
    );
    opts.optopt(
        "o",
        "output",
        "Write the converted calendar here [Default: stdout]",
        "FILE",
    );
    opts.optflag(
        "j",
        "json",
        "Emit events and skipped rows as JSON instead of ICS",
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "z",
        "timezone",
        "Time zone attached to every event [Default: Europe/Prague]",
        "TZID",
    );
    opts.optopt(
        "l",
        "language",
        "Language of the description labels, cz or en [Default: cz]",
        "LANG",
    );
    opts
}

fn usage(opts: &Opts) -> String {
    opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME")))
}

/// Parses the arguments, `None` meaning help was requested.
fn try_parse(args: Vec<String>, env_address: Option<String>) -> Result<Option<Args>, String> {
    let opts = opts();
    let matches = opts.parse(args).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        return Ok(None);
    }

    if let Some(arg) = matches.free.first() {
        return Err(format!("Unexpected argument '{arg}'"));
    }

    let time_zone = matches
        .opt_get_default("timezone", TimeZoneId::default())
        .map_err(|err| format!("Provided value for option 'timezone' is invalid: {err}"))?;

    let language = matches
        .opt_get_default("language", Language::default())
        .map_err(|err| format!("Provided value for option 'language' is invalid: {err}"))?;

    let mode = match matches.opt_str("input") {
        Some(input) => Mode::Convert {
            input: input.into(),
            output: matches.opt_str("output").map(PathBuf::from),
            json: matches.opt_present("json"),
        },
        None => {
            let default = match env_address {
                Some(value) => value
                    .parse()
                    .map_err(|err| format!("Failed to parse `{ADDRESS_VAR}`: {err}"))?,
                None => SocketAddr::from(([127, 0, 0, 1], 8080)),
            };
            let address = matches
                .opt_get_default("address", default)
                .map_err(|err| format!("Provided value for option 'address' is invalid: {err}"))?;
            Mode::Serve { address }
        }
    };

    Ok(Some(Args {
        mode,
        options: Options {
            time_zone,
            language,
        },
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(args, env::var(ADDRESS_VAR).ok()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", usage(&opts()));
            process::exit(0);
        }
        Err(message) => {
            eprintln!("{message}");
            process::exit(1);
        }
    }
}
