// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `compile-regex <regex> [out-file]`: compile a pattern to its textual
//! assembly form (§6.4) and write it to `out-file`, or to standard output if
//! no file is given.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(about = "Compile a regex to its textual bytecode assembly")]
struct Cli {
    /// The regex pattern to compile.
    regex: String,
    /// Where to write the assembly. Prints to standard output if omitted.
    out_file: Option<PathBuf>,
}

#[derive(Debug)]
enum Error {
    Compile(regexvm::Error),
    Io(io::Error, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Compile(err) => write!(f, "failed to compile regex: {}", err),
            Error::Io(err, path) => write!(f, "writing \"{}\" failed: {}", path.display(), err),
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
    let assembly = re.program().to_string();

    match &cli.out_file {
        None => {
            print!("{}", assembly);
            Ok(())
        }
        Some(path) => {
            let mut file = File::create(path).map_err(|err| Error::Io(err, path.clone()))?;
            file.write_all(assembly.as_bytes())
                .map_err(|err| Error::Io(err, path.clone()))
        }
    }
}
