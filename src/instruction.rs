use std::fmt;

/// One fully decoded instruction, ready for rendering.
///
/// The raw header fields (direction, sign-extension, mod/reg/rm) are
/// consumed during decoding; what survives is the width and the two
/// resolved operand slots.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Instruction {
  pub mnemonic: Mnemonic,
  pub width: Width,
  pub dst: Operand,
  pub src: Operand,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mnemonic {
  Mov,
  Add,
  Sub,
  Cmp,
}

impl Mnemonic {
  /// Secondary dispatch for the shared `0x80..=0x83` leading pattern: the
  /// reg field of the second byte selects the arithmetic mnemonic.
  pub fn from_group_op(op: u8) -> Option<Self> {
    match op {
      0b_000 => Some(Mnemonic::Add),
      0b_101 => Some(Mnemonic::Sub),
      0b_111 => Some(Mnemonic::Cmp),
      _ => None,
    }
  }
}

impl fmt::Display for Mnemonic {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(match self {
      Mnemonic::Mov => "mov",
      Mnemonic::Add => "add",
      Mnemonic::Sub => "sub",
      Mnemonic::Cmp => "cmp",
    })
  }
}

/// Operand size selected by the instruction's W bit.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Width {
  Byte,
  Word,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Operand {
  /// A named register, already resolved for the instruction's width.
  Register(&'static str),
  /// A memory reference through a base-register expression plus a signed
  /// displacement (zero when the encoding carried none).
  Memory { expr: &'static str, disp: i16 },
  /// An absolute 16-bit address with no base register (mod 00, rm 110).
  Direct(u16),
  /// Immediate data, stored as the raw 16-bit value after any extension.
  Immediate(u16),
}

pub fn register(reg: u8, width: Width) -> &'static str {
  match (reg, width) {
    (0b_000, Width::Byte) => "al",
    (0b_001, Width::Byte) => "cl",
    (0b_010, Width::Byte) => "dl",
    (0b_011, Width::Byte) => "bl",
    (0b_100, Width::Byte) => "ah",
    (0b_101, Width::Byte) => "ch",
    (0b_110, Width::Byte) => "dh",
    (0b_111, Width::Byte) => "bh",
    (0b_000, Width::Word) => "ax",
    (0b_001, Width::Word) => "cx",
    (0b_010, Width::Word) => "dx",
    (0b_011, Width::Word) => "bx",
    (0b_100, Width::Word) => "sp",
    (0b_101, Width::Word) => "bp",
    (0b_110, Width::Word) => "si",
    (0b_111, Width::Word) => "di",
    _ => unreachable!("register selector is 3 bits"),
  }
}

/// Base-register expression for a memory operand, per the rm selector.
/// `0b110` only applies outside mod 00; in mod 00 it encodes a direct
/// address instead and never reaches this table.
pub fn effective_address(rm: u8) -> &'static str {
  match rm {
    0b_000 => "bx + si",
    0b_001 => "bx + di",
    0b_010 => "bp + si",
    0b_011 => "bp + di",
    0b_100 => "si",
    0b_101 => "di",
    0b_110 => "bp",
    0b_111 => "bx",
    _ => unreachable!("rm selector is 3 bits"),
  }
}
