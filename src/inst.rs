// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The instruction model: the seven-variant bytecode this crate's code
//! generator emits and its interpreter executes, plus the lossless textual
//! assembly form of §6.2.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::error::Error;

/// Index of an instruction within a [`Program`].
pub type InstIdx = usize;

/// A single bytecode instruction.
///
/// `Compare`/`InvCompare` test the current input byte against an inclusive
/// `[lo, hi]` range; `OptCompare` does the same but branches instead of
/// failing. See `spec.md` §3 for the full semantics table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inst {
    /// Declare success; the interpreter records the captured interval.
    Match,
    /// Store the current input position at capture slot `.0`.
    Save(usize),
    /// Unconditional jump.
    Jump(InstIdx),
    /// Fork: try `.0` first, `.1` as the alternative.
    Split(InstIdx, InstIdx),
    /// Consume one byte if it falls in `[lo, hi]`, else fail.
    Compare(u8, u8),
    /// Consume one byte if it does *not* fall in `[lo, hi]`, else fail.
    InvCompare(u8, u8),
    /// If the current byte falls in `[lo, hi]`, jump to `dest` (no consume);
    /// otherwise fall through to the next instruction.
    OptCompare(u8, u8, InstIdx),
}

/// Always consumes one byte, unconditionally. `InvCompare 0xFF 0xFF` can
/// never have its range match (no byte is outside `[0, 255]` twice over),
/// so it always takes the "not in range" branch and advances.
pub const CONSUME: Inst = Inst::InvCompare(0xFF, 0xFF);

/// Always fails. `Compare 0xFF 0xFF` matches only the byte `0xFF` against
/// itself at both ends... no byte can be simultaneously be compared true
/// here because the sentinel range is deliberately impossible to use as a
/// real character class, reserved for this purpose.
pub const DIE: Inst = Inst::Compare(0xFF, 0xFF);

/// Maximum number of instructions a program may contain: `Save`/`Jump`/
/// `Split`'s first destination occupy 13 bits in the binary encoding.
pub const MAX_PROGRAM_LEN: usize = 1 << 13;

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Inst::Match => write!(f, "Match"),
            Inst::Save(i) => write!(f, "Save {}", i),
            Inst::Jump(d) => write!(f, "Jump {}", d),
            Inst::Split(d1, d2) => write!(f, "Split {} {}", d1, d2),
            Inst::Compare(lo, hi) => {
                write!(f, "Compare {} {}", format_byte(lo), format_byte(hi))
            }
            Inst::InvCompare(lo, hi) => {
                write!(f, "InvCompare {} {}", format_byte(lo), format_byte(hi))
            }
            Inst::OptCompare(lo, hi, d) => write!(
                f,
                "OptCompare {} {} {}",
                format_byte(lo),
                format_byte(hi),
                d
            ),
        }
    }
}

impl FromStr for Inst {
    type Err = Error;

    fn from_str(line: &str) -> Result<Inst, Error> {
        let toks: Vec<&str> = line.split_whitespace().collect();
        let bad = || Error::Syntax(format!("malformed instruction line: {:?}", line));
        match toks.as_slice() {
            ["Match"] => Ok(Inst::Match),
            ["Save", i] => Ok(Inst::Save(i.parse().map_err(|_| bad())?)),
            ["Jump", d] => Ok(Inst::Jump(d.parse().map_err(|_| bad())?)),
            ["Split", d1, d2] => Ok(Inst::Split(
                d1.parse().map_err(|_| bad())?,
                d2.parse().map_err(|_| bad())?,
            )),
            ["Compare", lo, hi] => Ok(Inst::Compare(parse_byte(lo)?, parse_byte(hi)?)),
            ["InvCompare", lo, hi] => Ok(Inst::InvCompare(parse_byte(lo)?, parse_byte(hi)?)),
            ["OptCompare", lo, hi, d] => Ok(Inst::OptCompare(
                parse_byte(lo)?,
                parse_byte(hi)?,
                d.parse().map_err(|_| bad())?,
            )),
            _ => Err(bad()),
        }
    }
}

/// Encode a byte operand as the single assembly token `e(c)` from `spec.md`
/// §4.1: printable and not `%`/`,`/whitespace characters appear as
/// themselves, everything else (including the `0xFF` sentinels) is escaped
/// as `%<decimal>`.
fn format_byte(b: u8) -> String {
    let printable = (0x21..=0x7E).contains(&b) && b != b'%' && b != b',';
    if printable {
        (b as char).to_string()
    } else {
        format!("%{}", b)
    }
}

/// Inverse of [`format_byte`]: decode a single assembly token back to a byte.
fn parse_byte(tok: &str) -> Result<u8, Error> {
    if let Some(rest) = tok.strip_prefix('%') {
        rest.parse()
            .map_err(|_| Error::Syntax(format!("bad escaped byte token: {:?}", tok)))
    } else {
        let mut chars = tok.chars();
        let c = chars
            .next()
            .ok_or_else(|| Error::Syntax("empty character token".into()))?;
        if chars.next().is_some() {
            return Err(Error::Syntax(format!("token {:?} is not a single character", tok)));
        }
        let mut buf = [0u8; 4];
        let encoded = c.encode_utf8(&mut buf);
        if encoded.len() != 1 {
            return Err(Error::Encoding(c));
        }
        Ok(encoded.as_bytes()[0])
    }
}

/// A compiled regular expression: a flat, zero-indexed sequence of
/// instructions terminating in [`Inst::Match`], plus the source text it was
/// compiled from (kept for diagnostics and the `# regex: ...` assembly
/// header).
#[derive(Clone, Debug)]
pub struct Program {
    /// The regex source this program was compiled from.
    pub original: String,
    /// The flat instruction sequence.
    pub insts: Vec<Inst>,
}

impl Program {
    pub fn new(original: String, insts: Vec<Inst>) -> Result<Program, Error> {
        if insts.len() > MAX_PROGRAM_LEN {
            return Err(Error::ProgramTooLarge(insts.len()));
        }
        Ok(Program { original, insts })
    }
}

impl Deref for Program {
    type Target = [Inst];

    fn deref(&self) -> &[Inst] {
        &self.insts
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# regex: {}", self.original)?;
        for inst in &self.insts {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}

impl FromStr for Program {
    type Err = Error;

    /// Parse the textual assembly form of §6.2 back into a [`Program`].
    /// The first `# regex: ...` comment line supplies `original`; any other
    /// line beginning with `#` is ignored.
    fn from_str(text: &str) -> Result<Program, Error> {
        let mut original = String::new();
        let mut insts = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("# regex:") {
                original = rest.trim().to_string();
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            insts.push(line.parse()?);
        }
        Program::new(original, insts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_round_trip_through_text() {
        assert_eq!(CONSUME.to_string(), "InvCompare %255 %255");
        assert_eq!(DIE.to_string(), "Compare %255 %255");
        assert_eq!("InvCompare %255 %255".parse::<Inst>().unwrap(), CONSUME);
        assert_eq!("Compare %255 %255".parse::<Inst>().unwrap(), DIE);
    }

    #[test]
    fn escapes_whitespace_percent_and_comma() {
        assert_eq!(Inst::Compare(b' ', b' ').to_string(), "Compare %32 %32");
        assert_eq!(Inst::Compare(b'%', b'%').to_string(), "Compare %37 %37");
        assert_eq!(Inst::Compare(b',', b',').to_string(), "Compare %44 %44");
    }

    #[test]
    fn textual_round_trip_for_every_variant() {
        let insts = vec![
            Inst::Match,
            Inst::Save(1),
            Inst::Jump(3),
            Inst::Split(1, 4),
            Inst::Compare(b'a', b'z'),
            Inst::InvCompare(b'0', b'9'),
            Inst::OptCompare(b'a', b'z', 7),
        ];
        for inst in insts {
            let text = inst.to_string();
            assert_eq!(text.parse::<Inst>().unwrap(), inst);
        }
    }

    #[test]
    fn program_text_round_trip() {
        let prog = Program::new(
            "ab".into(),
            vec![Inst::Compare(b'a', b'a'), Inst::Compare(b'b', b'b'), Inst::Match],
        )
        .unwrap();
        let text = prog.to_string();
        let parsed: Program = text.parse().unwrap();
        assert_eq!(parsed.original, "ab");
        assert_eq!(&parsed.insts[..], &prog.insts[..]);
    }

    #[test]
    fn program_too_large_is_rejected() {
        let insts = vec![Inst::Match; MAX_PROGRAM_LEN + 1];
        assert!(Program::new(String::new(), insts).is_err());
    }
}
