// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The code generator: lowers an [`Expr`] to a flat [`Inst`] program.
//!
//! Each lowering rule is expressed as `lower(node, pc) -> (fragment, next_pc)`
//! with `next_pc = pc + fragment.len()` (§8 property 6); label destinations
//! for `Split`/`Jump`/`OptCompare` are computed purely from the pc arithmetic
//! documented inline at each case, following `spec.md` §4.1 exactly.

use crate::ast::Expr;
use crate::error::Error;
use crate::inst::{Inst, Program, CONSUME, DIE};

/// Lower a parsed regex to a compiled [`Program`].
///
/// `anchored` is the "starts with `$`" hint from the parser (§4.4): when
/// false, an implicit `.*` prefix is spliced in front of the match so the
/// program behaves as if it could start anywhere in the input.
pub fn compile(expr: &Expr, anchored: bool) -> Result<Program, Error> {
    compile_named(expr, anchored, String::new())
}

/// Same as [`compile`], but records `original` in the resulting [`Program`]
/// (used by the parser-facing entry point, which knows the source text).
pub fn compile_named(expr: &Expr, anchored: bool, original: String) -> Result<Program, Error> {
    let grouped = Expr::Group { index: 0, expr: Box::new(expr.clone()) };
    let root = if anchored {
        grouped
    } else {
        Expr::Sequence(vec![Expr::Any(Box::new(Expr::WildCard)), grouped])
    };
    let (mut insts, next_pc) = lower(&root, 0)?;
    debug_assert_eq!(next_pc, insts.len());
    log::trace!("lowered {} instructions for {:?}", insts.len(), original);
    insts.push(Inst::Match);
    Program::new(original, insts)
}

/// Encode a single Unicode scalar value as the one-byte operand the VM
/// compares against. Multi-byte UTF-8 characters are rejected: the VM
/// compares raw bytes, per the Character domain design note in `spec.md` §9.
fn char_to_byte(c: char) -> Result<u8, Error> {
    let mut buf = [0u8; 4];
    let encoded = c.encode_utf8(&mut buf);
    if encoded.len() != 1 {
        return Err(Error::Encoding(c));
    }
    Ok(encoded.as_bytes()[0])
}

fn lower(expr: &Expr, pc: usize) -> Result<(Vec<Inst>, usize), Error> {
    match *expr {
        Expr::Literal(c) => {
            let b = char_to_byte(c)?;
            Ok((vec![Inst::Compare(b, b)], pc + 1))
        }

        Expr::WildCard => Ok((vec![CONSUME], pc + 1)),

        Expr::CharSet(ref set) => lower_charset(set, pc),

        Expr::Group { index, ref expr } => {
            let (body, pc1) = lower(expr, pc + 1)?;
            let mut code = Vec::with_capacity(body.len() + 2);
            code.push(Inst::Save(2 * index));
            code.extend(body);
            code.push(Inst::Save(2 * index + 1));
            Ok((code, pc1 + 1))
        }

        Expr::Sequence(ref children) => {
            let mut code = Vec::new();
            let mut cur = pc;
            for child in children {
                let (frag, next) = lower(child, cur)?;
                code.extend(frag);
                cur = next;
            }
            Ok((code, cur))
        }

        // Split L1, L2
        // L1: code for alt1
        //     Jump L3
        // L2: code for alt2
        // L3:
        Expr::Alternatives(ref a, ref b) => {
            let l1 = pc + 1;
            let (code1, pc1) = lower(a, l1)?;
            let l2 = pc1 + 1;
            let (code2, l3) = lower(b, l2)?;
            let mut code = Vec::with_capacity(code1.len() + code2.len() + 2);
            code.push(Inst::Split(l1, l2));
            code.extend(code1);
            code.push(Inst::Jump(l3));
            code.extend(code2);
            Ok((code, l3))
        }

        // Split L1, L2
        // L1: code for e
        // L2:
        Expr::Option(ref e) => {
            let l1 = pc + 1;
            let (code, l2) = lower(e, l1)?;
            let mut out = Vec::with_capacity(code.len() + 1);
            out.push(Inst::Split(l1, l2));
            out.extend(code);
            Ok((out, l2))
        }

        // L1: code for e
        //     Split L1, L3
        // L3:
        Expr::Some(ref e) => {
            let l1 = pc;
            let (mut code, pc1) = lower(e, l1)?;
            let l3 = pc1 + 1;
            code.push(Inst::Split(l1, l3));
            Ok((code, l3))
        }

        // L1: Split L2, L3
        // L2: code for e
        //     Jump L1
        // L3:
        Expr::Any(ref e) => {
            let l1 = pc;
            let l2 = pc + 1;
            let (code, pc1) = lower(e, l2)?;
            let l3 = pc1 + 1;
            let mut out = Vec::with_capacity(code.len() + 2);
            out.push(Inst::Split(l2, l3));
            out.extend(code);
            out.push(Inst::Jump(l1));
            Ok((out, l3))
        }
    }
}

/// Lower a character class. Single characters and single ranges collapse to
/// one `Compare`/`InvCompare`; everything else becomes a chain of
/// `OptCompare`s feeding into the `die`/`consume` sentinels, per `spec.md`
/// §4.1.
fn lower_charset(set: &crate::ast::CharSet, pc: usize) -> Result<(Vec<Inst>, usize), Error> {
    let compare = if set.inverse { Inst::InvCompare } else { Inst::Compare };

    if set.is_single_char() {
        let b = char_to_byte(set.chars[0])?;
        return Ok((vec![compare(b, b)], pc + 1));
    }
    if set.is_single_range() {
        let (lo, hi) = set.ranges[0];
        return Ok((vec![compare(char_to_byte(lo)?, char_to_byte(hi)?)], pc + 1));
    }

    let n = set.chars.len() + set.ranges.len();
    let l0 = pc + n;
    let (l1, l2, postfix): (usize, usize, Vec<Inst>) = if !set.inverse {
        (l0 + 1, l0 + 2, vec![DIE, CONSUME])
    } else {
        (l0 + 2, l0 + 3, vec![CONSUME, Inst::Jump(l0 + 3), DIE])
    };

    let mut code = Vec::with_capacity(n + postfix.len());
    for &c in &set.chars {
        let b = char_to_byte(c)?;
        code.push(Inst::OptCompare(b, b, l1));
    }
    for &(lo, hi) in &set.ranges {
        code.push(Inst::OptCompare(char_to_byte(lo)?, char_to_byte(hi)?, l1));
    }
    code.extend(postfix);
    Ok((code, l2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::CharSet;

    fn lit(c: char) -> Expr {
        Expr::Literal(c)
    }

    #[test]
    fn code_length_invariant_holds_for_every_node_kind() {
        let nodes = vec![
            lit('a'),
            Expr::WildCard,
            Expr::CharSet(CharSet::new(vec![], vec!['a'], false)),
            Expr::CharSet(CharSet::new(vec![('a', 'z')], vec![], false)),
            Expr::CharSet(CharSet::new(vec![('a', 'z')], vec!['_'], false)),
            Expr::CharSet(CharSet::new(vec![('a', 'z')], vec!['_'], true)),
            Expr::Sequence(vec![lit('a'), lit('b')]),
            Expr::Alternatives(Box::new(lit('a')), Box::new(lit('b'))),
            Expr::Option(Box::new(lit('a'))),
            Expr::Some(Box::new(lit('a'))),
            Expr::Any(Box::new(lit('a'))),
            Expr::Group { index: 0, expr: Box::new(lit('a')) },
        ];
        for node in nodes {
            let (frag, next_pc) = lower(&node, 3).unwrap();
            assert_eq!(next_pc - 3, frag.len(), "node {:?}", node);
        }
    }

    #[test]
    fn anchored_pattern_has_no_prefix_loop() {
        let prog = compile(&lit('a'), true).unwrap();
        // Group(0, 'a') -> Save 0, Compare a a, Save 1, Match: 4 instructions.
        assert_eq!(prog.insts.len(), 4);
        assert_eq!(prog.insts[0], Inst::Save(0));
    }

    #[test]
    fn unanchored_pattern_gets_wildcard_prefix() {
        let prog = compile(&lit('a'), false).unwrap();
        // Split L2,L3 / consume / Jump L1 / Save 0 / Compare / Save 1 / Match
        assert_eq!(prog.insts[0], Inst::Split(1, 3));
        assert_eq!(prog.insts[1], CONSUME);
        assert_eq!(prog.insts[2], Inst::Jump(0));
        assert_eq!(prog.insts[3], Inst::Save(0));
    }

    #[test]
    fn multi_byte_literal_is_rejected() {
        let err = compile(&lit('é'), true).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }
}
