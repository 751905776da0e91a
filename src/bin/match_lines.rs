// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `match-lines <regex> <file>`: compile `regex` and run it against every
//! line of `file`, printing a summary and the matching lines themselves.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

#[derive(Parser)]
#[command(about = "Run a regex over every line of a file and report the matches")]
struct Cli {
    /// The regex pattern to search with.
    regex: String,
    /// The file to scan, one candidate per line.
    file: PathBuf,
}

#[derive(Debug)]
enum Error {
    Compile(regexvm::Error),
    Io(std::io::Error, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Compile(err) => write!(f, "failed to compile regex: {}", err),
            Error::Io(err, path) => write!(f, "reading \"{}\" failed: {}", path.display(), err),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let re = regexvm::Regex::new(&cli.regex).map_err(Error::Compile)?;
    let text = fs::read_to_string(&cli.file).map_err(|err| Error::Io(err, cli.file.clone()))?;

    let start = Instant::now();
    let matches: Vec<&str> = text.lines().filter(|line| re.is_match(line)).collect();
    let elapsed = start.elapsed();

    println!("{} matches in {:.6} s", matches.len(), elapsed.as_secs_f64());
    for line in matches {
        println!("{}", line);
    }
    Ok(())
}
