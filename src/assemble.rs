// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The binary assembler: a bijection between [`Inst`] and a packed 32-bit
//! word (§4.2), plus little-endian whole-program (de)serialization (§6.3).

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;
use crate::inst::{Inst, Program};

const OP_JUMP: u32 = 0b000;
const OP_SPLIT: u32 = 0b001;
const OP_COMPARE: u32 = 0b010;
const OP_BRANCH: u32 = 0b011;
const OP_SAVE: u32 = 0b100;
const OP_MATCH: u32 = 0b111;

const OPCODE_SHIFT: u32 = 29;
const SAVE_INDEX_SHIFT: u32 = 16;
const INVERTED_SHIFT: u32 = 28;
const DEST_SHIFT: u32 = 16;
const DEST2_SHIFT: u32 = 2;
const CHAR_LO_SHIFT: u32 = 8;
const CHAR_HI_SHIFT: u32 = 0;

const DEST_MASK_13: u32 = (1 << 13) - 1;
const DEST_MASK_14: u32 = (1 << 14) - 1;

/// Encode a single instruction as a packed 32-bit word.
///
/// `dest`/`index` operands of [`Inst::Save`], [`Inst::Jump`] and
/// [`Inst::Split`]'s first destination must fit in 13 bits
/// ([`crate::inst::MAX_PROGRAM_LEN`]); this is upheld by [`Program::new`]
/// rejecting over-long programs, so encoding itself cannot fail on that
/// account.
pub fn encode(inst: &Inst) -> u32 {
    match *inst {
        Inst::Match => OP_MATCH << OPCODE_SHIFT,
        Inst::Save(index) => (OP_SAVE << OPCODE_SHIFT) | ((index as u32 & DEST_MASK_13) << SAVE_INDEX_SHIFT),
        Inst::Jump(dest) => (OP_JUMP << OPCODE_SHIFT) | ((dest as u32 & DEST_MASK_13) << DEST_SHIFT),
        Inst::Split(dest1, dest2) => {
            (OP_SPLIT << OPCODE_SHIFT)
                | ((dest1 as u32 & DEST_MASK_13) << DEST_SHIFT)
                | ((dest2 as u32 & DEST_MASK_14) << DEST2_SHIFT)
        }
        Inst::Compare(lo, hi) => {
            (OP_COMPARE << OPCODE_SHIFT) | ((lo as u32) << CHAR_LO_SHIFT) | ((hi as u32) << CHAR_HI_SHIFT)
        }
        Inst::InvCompare(lo, hi) => {
            (OP_COMPARE << OPCODE_SHIFT)
                | (1 << INVERTED_SHIFT)
                | ((lo as u32) << CHAR_LO_SHIFT)
                | ((hi as u32) << CHAR_HI_SHIFT)
        }
        Inst::OptCompare(lo, hi, dest) => {
            (OP_BRANCH << OPCODE_SHIFT)
                | ((dest as u32 & DEST_MASK_13) << DEST_SHIFT)
                | ((lo as u32) << CHAR_LO_SHIFT)
                | ((hi as u32) << CHAR_HI_SHIFT)
        }
    }
}

/// Decode a packed 32-bit word back into an [`Inst`].
pub fn decode(word: u32) -> Result<Inst, Error> {
    let opcode = word >> OPCODE_SHIFT;
    match opcode {
        OP_MATCH => Ok(Inst::Match),
        OP_SAVE => Ok(Inst::Save(((word >> SAVE_INDEX_SHIFT) & DEST_MASK_13) as usize)),
        OP_JUMP => Ok(Inst::Jump(((word >> DEST_SHIFT) & DEST_MASK_13) as usize)),
        OP_SPLIT => Ok(Inst::Split(
            ((word >> DEST_SHIFT) & DEST_MASK_13) as usize,
            ((word >> DEST2_SHIFT) & DEST_MASK_14) as usize,
        )),
        OP_COMPARE => {
            let lo = ((word >> CHAR_LO_SHIFT) & 0xFF) as u8;
            let hi = ((word >> CHAR_HI_SHIFT) & 0xFF) as u8;
            if (word >> INVERTED_SHIFT) & 1 == 1 {
                Ok(Inst::InvCompare(lo, hi))
            } else {
                Ok(Inst::Compare(lo, hi))
            }
        }
        OP_BRANCH => {
            let dest = ((word >> DEST_SHIFT) & DEST_MASK_13) as usize;
            let lo = ((word >> CHAR_LO_SHIFT) & 0xFF) as u8;
            let hi = ((word >> CHAR_HI_SHIFT) & 0xFF) as u8;
            Ok(Inst::OptCompare(lo, hi, dest))
        }
        _ => Err(Error::Syntax(format!("unrecognised opcode {:#05b}", opcode))),
    }
}

/// Write a whole program as a stream of little-endian 32-bit words, no
/// header and no footer, per §6.3.
pub fn write_binary<W: Write>(prog: &Program, mut w: W) -> io::Result<()> {
    for inst in prog.insts.iter() {
        w.write_u32::<LittleEndian>(encode(inst))?;
    }
    Ok(())
}

/// Read a whole program back from its binary form. The resulting
/// [`Program`] carries an empty `original` string, since the source text is
/// not part of the binary encoding.
pub fn read_binary<R: Read>(mut r: R) -> Result<Program, Error> {
    let mut insts = Vec::new();
    loop {
        match r.read_u32::<LittleEndian>() {
            Ok(word) => insts.push(decode(word)?),
            Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::Syntax(format!("binary read failed: {}", e))),
        }
    }
    Program::new(String::new(), insts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_decode_round_trip_for_every_variant() {
        let insts = vec![
            Inst::Match,
            Inst::Save(5),
            Inst::Jump(42),
            Inst::Split(1, 200),
            Inst::Compare(b'a', b'z'),
            Inst::InvCompare(0, 255),
            Inst::OptCompare(b'0', b'9', 99),
        ];
        for inst in insts {
            assert_eq!(decode(encode(&inst)).unwrap(), inst);
        }
    }

    #[test]
    fn binary_program_round_trip() {
        let prog = Program::new(
            "a".into(),
            vec![Inst::Compare(b'a', b'a'), Inst::Match],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_binary(&prog, &mut buf).unwrap();
        assert_eq!(buf.len(), 8);
        let back = read_binary(&buf[..]).unwrap();
        assert_eq!(&back.insts[..], &prog.insts[..]);
    }

    proptest! {
        #[test]
        fn prop_compare_round_trips(lo: u8, hi: u8) {
            let inst = Inst::Compare(lo, hi);
            prop_assert_eq!(decode(encode(&inst)).unwrap(), inst);
        }

        #[test]
        fn prop_split_round_trips(d1 in 0u32..(1 << 13), d2 in 0u32..(1 << 14)) {
            let inst = Inst::Split(d1 as usize, d2 as usize);
            prop_assert_eq!(decode(encode(&inst)).unwrap(), inst);
        }
    }
}
