// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types shared by the parser, code generator, assembler and CLI.

use thiserror::Error as ThisError;

/// Anything that can go wrong while parsing, compiling or assembling a
/// regular expression.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The regex source could not be parsed: unbalanced brackets, a
    /// quantifier with no operand, an empty alternative, an unsupported
    /// escape, a malformed `{m,n}` count, or a character-class range with
    /// out-of-order or non-alphanumeric endpoints.
    #[error("syntax error in regex: {0}")]
    Syntax(String),

    /// The regex uses a construct outside the supported grammar (e.g. an
    /// escape sequence other than `\s \S \d \D \w \W`).
    #[error("unsupported construct in regex: {0}")]
    Unsupported(String),

    /// Code generation would need more than 2^13 instructions to represent
    /// the program in the 32-bit binary encoding.
    #[error("program too large: {0} instructions exceeds the 8192-instruction limit")]
    ProgramTooLarge(usize),

    /// A character operand does not fit in a single byte once encoded.
    #[error("character {0:?} does not fit in a single encoded byte")]
    Encoding(char),

    /// A code-generator invariant was violated (e.g. a `Some`/`Any`/`Option`
    /// node whose body produced no instructions). The `Expr` type makes this
    /// unrepresentable (a quantifier's body is always a present `Box<Expr>`),
    /// so this variant is never actually constructed; it is kept for parity
    /// with the InternalError kind in the error taxonomy.
    #[error("internal error: {0}")]
    Internal(String),
}
