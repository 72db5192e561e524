#![allow(non_snake_case)]

use std::io::{self, IsTerminal};

use clap;
use tracing_subscriber::EnvFilter;

use shared::error::Error;

use lisp::builtin;
use lisp::runtime_env;
use lisp::user_utils;

fn initLogging()
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Error>
{
    let matches = clap::App::new("lisp")
        .version("0.1")
        .about("A minimal Lisp interpreter")
        .arg(clap::Arg::with_name("FILE")
             .help("Source file to eval. Start a line loop on stdin if not issued.")
             .required(false))
        .arg(clap::Arg::with_name("Load")
             .short("l")
             .long("load")
             .takes_value(true)
             .multiple(true)
             .number_of_values(1)
             .help("Library file to eval before anything else. May be repeated."))
        .arg(clap::Arg::with_name("ListBuiltins")
             .long("inspect-builtins")
             .help("List builtin names and exit."))
        .get_matches();

    initLogging();

    if matches.is_present("ListBuiltins")
    {
        let mut names = builtin::names();
        names.sort();
        for name in names
        {
            println!("{}", name);
        }
        return Ok(())
    }

    let libs: Vec<&str> = matches.values_of("Load")
        .map(|v| v.collect()).unwrap_or_default();

    if let Some(filename) = matches.value_of("FILE")
    {
        user_utils::runFile(filename, &libs)?;
        Ok(())
    }
    else
    {
        let e = user_utils::getEval(&libs)?;
        let stdin = io::stdin();
        let prompt = runtime_env::findPrompt();
        let prompt = if stdin.is_terminal() { Some(prompt.as_str()) } else { None };
        let mut stdout = io::stdout();
        user_utils::runRepl(&e, stdin.lock(), &mut stdout, prompt)
    }
}
