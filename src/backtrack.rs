// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The backtracking matching engine.
//!
//! This explores every alternative a [`Split`](crate::inst::Inst::Split)
//! offers, not just the first one that leads to a match: §4.3 requires the
//! *longest* of all recorded match intervals, with ties broken by whichever
//! was recorded first. That rules out the usual bounded-backtracking trick of
//! returning as soon as one thread reaches `Match` (the teacher's
//! `backtrack.rs` does exactly that, since it only needs *a* match, not the
//! longest one).
//!
//! Threads are realised as an explicit work stack of owned `Thread` values
//! rather than native recursion, per the Design Notes' own suggested
//! mitigation for unbounded recursion depth on inputs with long `.*`
//! prefixes. `Split` still gets its value semantics for the capture map: the
//! deferred alternative is pushed with a cloned capture vector, while the
//! preferred alternative continues in place with the original.
//!
//! This is not a bounded engine: a pattern with nested zero-width loops
//! (`spec.md`'s example is `(a*)*`) together with long input is exponential
//! in the worst case, exactly as `spec.md` §4.3 option (ii) documents. The
//! only safety net here is a per-thread `(pc, sc)` visited guard that
//! prevents a single thread from looping forever when it makes no forward
//! progress; it is reset for every thread popped off the stack; it does not
//! bound the number of threads that can be spawned.

use std::collections::HashSet;

use crate::inst::{Inst, Program};

struct Thread {
    pc: usize,
    sc: usize,
    caps: Vec<Option<usize>>,
}

fn num_capture_slots(prog: &Program) -> usize {
    let mut max = 0;
    for inst in prog.insts.iter() {
        if let Inst::Save(slot) = *inst {
            max = max.max(slot + 1);
        }
    }
    max
}

/// Run `prog` against `text`, returning the `(start, end)` byte offsets of
/// the longest recorded match, or `None` if no thread ever reached `Match`.
///
/// Comparisons are byte-wise (`spec.md` §9: "the VM compares on single
/// bytes"); `text` need not be valid UTF-8 for this function, though
/// [`crate::Regex::find`] only ever calls it with `str::as_bytes`.
pub fn search(prog: &Program, text: &[u8]) -> Option<(usize, usize)> {
    let nslots = num_capture_slots(prog);
    let mut matches: Vec<(usize, usize)> = Vec::new();
    let mut stack: Vec<Thread> = Vec::new();
    let mut current = Thread { pc: 0, sc: 0, caps: vec![None; nslots] };

    loop {
        run_thread(prog, text, &mut current, &mut stack, &mut matches);
        match stack.pop() {
            Some(next) => current = next,
            None => break,
        }
    }

    log::debug!("recorded {} candidate match(es)", matches.len());
    longest(matches)
}

/// Advance `th` until it matches, fails, or forks. A fork pushes the deferred
/// alternative onto `stack` (with its own capture snapshot) and keeps
/// running the preferred one in `th` in place, so a chain of forks never
/// grows the native call stack.
fn run_thread(
    prog: &Program,
    text: &[u8],
    th: &mut Thread,
    stack: &mut Vec<Thread>,
    matches: &mut Vec<(usize, usize)>,
) {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    loop {
        if !seen.insert((th.pc, th.sc)) {
            // Zero-width loop: this thread is revisiting a state it has
            // already been in without consuming any input. Nothing further
            // down this path can differ from what already ran, so stop.
            return;
        }
        match prog.insts[th.pc] {
            Inst::Match => {
                let start = th.caps.get(0).copied().flatten();
                let end = th.caps.get(1).copied().flatten();
                if let (Some(start), Some(end)) = (start, end) {
                    matches.push((start, end));
                }
                return;
            }
            Inst::Save(slot) => {
                if slot < th.caps.len() {
                    th.caps[slot] = Some(th.sc);
                }
                th.pc += 1;
            }
            Inst::Jump(dest) => th.pc = dest,
            Inst::Split(d1, d2) => {
                stack.push(Thread { pc: d2, sc: th.sc, caps: th.caps.clone() });
                th.pc = d1;
            }
            Inst::Compare(lo, hi) => match text.get(th.sc) {
                Some(&b) if lo <= b && b <= hi => {
                    th.sc += 1;
                    th.pc += 1;
                }
                _ => return,
            },
            Inst::InvCompare(lo, hi) => match text.get(th.sc) {
                Some(&b) if !(lo <= b && b <= hi) => {
                    th.sc += 1;
                    th.pc += 1;
                }
                _ => return,
            },
            Inst::OptCompare(lo, hi, dest) => match text.get(th.sc) {
                Some(&b) if lo <= b && b <= hi => th.pc = dest,
                _ => th.pc += 1,
            },
        }
    }
}

/// Pick the longest interval, earliest-recorded on ties.
fn longest(matches: Vec<(usize, usize)>) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (start, end) in matches {
        let len = end - start;
        let better = match best {
            None => true,
            Some((bs, be)) => len > be - bs,
        };
        if better {
            best = Some((start, end));
        }
    }
    best
}
