use crate::error::DecodeError;
use crate::instruction::{effective_address, register, Instruction, Mnemonic, Operand, Width};
use crate::render::render_line;
use std::io::Write;

/// Decodes `bytes` as a linear stream of instructions, writing the two
/// header lines and one rendered line per instruction into `out`.
///
/// On failure, everything rendered before the stopping point has already
/// been written; the error says why and where decoding stopped.
pub fn disassemble<W: Write>(bytes: &[u8], out: &mut W) -> Result<(), DecodeError> {
  writeln!(out, "; disassembly")?;
  writeln!(out, "bits 16")?;
  let mut pos = 0;
  while pos < bytes.len() {
    let byte = bytes[pos];
    let format = classify(byte).ok_or(DecodeError::UnknownOpcode { offset: pos, byte })?;
    let mut reader = Reader::new(bytes, pos);
    let inst = decode_one(&mut reader, format)?;
    let consumed = reader.pos - pos;
    if consumed == 0 {
      // A decoder that reads nothing would loop forever; fail instead.
      return Err(DecodeError::Stalled { offset: pos });
    }
    out.write_all(render_line(&inst).as_bytes())?;
    pos += consumed;
  }
  Ok(())
}

/// Which encoding family a leading byte belongs to. The `0x80..=0x83`
/// group is shared between add/sub/cmp; its mnemonic comes from the reg
/// field of the second byte, so classification defers it to the decoder.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Format {
  RegRm(Mnemonic),
  ImmToAcc(Mnemonic),
  ImmToReg,
  ImmToRmGroup,
  MovImmToRm,
}

fn classify(byte: u8) -> Option<Format> {
  match byte {
    0b_000000_00..=0b_000000_11 => Some(Format::RegRm(Mnemonic::Add)),
    0b_0000010_0..=0b_0000010_1 => Some(Format::ImmToAcc(Mnemonic::Add)),
    0b_001010_00..=0b_001010_11 => Some(Format::RegRm(Mnemonic::Sub)),
    0b_0010110_0..=0b_0010110_1 => Some(Format::ImmToAcc(Mnemonic::Sub)),
    0b_001110_00..=0b_001110_11 => Some(Format::RegRm(Mnemonic::Cmp)),
    0b_0011110_0..=0b_0011110_1 => Some(Format::ImmToAcc(Mnemonic::Cmp)),
    0b_100000_00..=0b_100000_11 => Some(Format::ImmToRmGroup),
    0b_100010_00..=0b_100010_11 => Some(Format::RegRm(Mnemonic::Mov)),
    0b_1011_0000..=0b_1011_1111 => Some(Format::ImmToReg),
    0b_1100011_0..=0b_1100011_1 => Some(Format::MovImmToRm),
    _ => None,
  }
}

/// Bounds-checked cursor over the input. Reading past the end is a
/// `Truncated` error, never an out-of-bounds access.
struct Reader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Reader<'a> {
  fn new(bytes: &'a [u8], pos: usize) -> Self {
    Self { bytes, pos }
  }

  fn read_u8(&mut self) -> Result<u8, DecodeError> {
    let byte = *self
      .bytes
      .get(self.pos)
      .ok_or(DecodeError::Truncated { offset: self.pos })?;
    self.pos += 1;
    Ok(byte)
  }

  fn read_u16(&mut self) -> Result<u16, DecodeError> {
    let lo = self.read_u8()? as u16;
    let hi = self.read_u8()? as u16;
    Ok(hi << 8 | lo)
  }

  /// Immediate data field: one byte or a little-endian word, per the
  /// width flag, zero-extended.
  fn read_data(&mut self, width: Width) -> Result<u16, DecodeError> {
    match width {
      Width::Byte => Ok(self.read_u8()? as u16),
      Width::Word => self.read_u16(),
    }
  }
}

fn width_bit(set: bool) -> Width {
  if set {
    Width::Word
  } else {
    Width::Byte
  }
}

/// Trailing displacement for a mod/rm pair: 0, 1, or 2 bytes.
///
/// Mod 00 normally carries none, but rm 110 repurposes the slot as a
/// 16-bit direct address. The 8-bit form is sign-extended here so that a
/// negative displacement stays negative through rendering.
fn displacement(reader: &mut Reader, mode: u8, rm: u8) -> Result<i16, DecodeError> {
  match mode {
    0b_11 => Ok(0),
    0b_00 if rm == 0b_110 => Ok(reader.read_u16()? as i16),
    0b_00 => Ok(0),
    0b_01 => Ok(reader.read_u8()? as i8 as i16),
    _ => Ok(reader.read_u16()? as i16),
  }
}

fn rm_operand(mode: u8, rm: u8, width: Width, disp: i16) -> Operand {
  match mode {
    0b_11 => Operand::Register(register(rm, width)),
    0b_00 if rm == 0b_110 => Operand::Direct(disp as u16),
    _ => Operand::Memory { expr: effective_address(rm), disp },
  }
}

/// Assigns the reg and rm operands to the destination/source slots. The
/// direction flag decides which slot the reg selector fills; the rm slot
/// may be a register, a memory reference, or a direct address.
fn resolve_operands(
  mode: u8,
  reg: u8,
  rm: u8,
  reg_is_dst: bool,
  width: Width,
  disp: i16,
) -> (Operand, Operand) {
  let reg_op = Operand::Register(register(reg, width));
  let rm_op = rm_operand(mode, rm, width, disp);
  if reg_is_dst {
    (reg_op, rm_op)
  } else {
    (rm_op, reg_op)
  }
}

fn decode_one(reader: &mut Reader, format: Format) -> Result<Instruction, DecodeError> {
  match format {
    Format::RegRm(mnemonic) => decode_reg_rm(reader, mnemonic),
    Format::ImmToAcc(mnemonic) => decode_imm_to_acc(reader, mnemonic),
    Format::ImmToReg => decode_imm_to_reg(reader),
    Format::ImmToRmGroup => decode_imm_to_rm_group(reader),
    Format::MovImmToRm => decode_mov_imm_to_rm(reader),
  }
}

fn decode_reg_rm(reader: &mut Reader, mnemonic: Mnemonic) -> Result<Instruction, DecodeError> {
  let b0 = reader.read_u8()?;
  debug_assert!(matches!(
    b0 >> 2,
    0b_000000 | 0b_001010 | 0b_001110 | 0b_100010
  ));
  let reg_is_dst = b0 & 0b_10 != 0;
  let width = width_bit(b0 & 0b_1 != 0);
  let b1 = reader.read_u8()?;
  let mode = b1 >> 6;
  let reg = (b1 >> 3) & 0b_111;
  let rm = b1 & 0b_111;
  let disp = displacement(reader, mode, rm)?;
  let (dst, src) = resolve_operands(mode, reg, rm, reg_is_dst, width, disp);
  Ok(Instruction { mnemonic, width, dst, src })
}

fn decode_imm_to_reg(reader: &mut Reader) -> Result<Instruction, DecodeError> {
  let b0 = reader.read_u8()?;
  debug_assert_eq!(b0 >> 4, 0b_1011);
  let width = width_bit(b0 & 0b_1000 != 0);
  let reg = b0 & 0b_111;
  let data = reader.read_data(width)?;
  Ok(Instruction {
    mnemonic: Mnemonic::Mov,
    width,
    dst: Operand::Register(register(reg, width)),
    src: Operand::Immediate(data),
  })
}

fn decode_imm_to_rm_group(reader: &mut Reader) -> Result<Instruction, DecodeError> {
  let header_offset = reader.pos;
  let b0 = reader.read_u8()?;
  debug_assert_eq!(b0 >> 2, 0b_100000);
  let sign_extend = b0 & 0b_10 != 0;
  let width = width_bit(b0 & 0b_1 != 0);
  let b1 = reader.read_u8()?;
  let mode = b1 >> 6;
  let op = (b1 >> 3) & 0b_111;
  let rm = b1 & 0b_111;
  let mnemonic = Mnemonic::from_group_op(op)
    .ok_or(DecodeError::UnknownGroupOp { offset: header_offset, op })?;
  let disp = displacement(reader, mode, rm)?;
  let dst = rm_operand(mode, rm, width, disp);
  let src = Operand::Immediate(group_immediate(reader, sign_extend, width)?);
  Ok(Instruction { mnemonic, width, dst, src })
}

/// Immediate field of the `0x80..=0x83` group: a full word only when the
/// width flag is set and sign extension is not; an 8-bit value otherwise,
/// sign-extended to 16 bits exactly when both flags are set.
fn group_immediate(
  reader: &mut Reader,
  sign_extend: bool,
  width: Width,
) -> Result<u16, DecodeError> {
  match (sign_extend, width) {
    (false, Width::Word) => reader.read_u16(),
    (true, Width::Word) => Ok(reader.read_u8()? as i8 as i16 as u16),
    (_, Width::Byte) => Ok(reader.read_u8()? as u16),
  }
}

fn decode_mov_imm_to_rm(reader: &mut Reader) -> Result<Instruction, DecodeError> {
  let b0 = reader.read_u8()?;
  debug_assert_eq!(b0 >> 1, 0b_1100011);
  let width = width_bit(b0 & 0b_1 != 0);
  let b1 = reader.read_u8()?;
  let mode = b1 >> 6;
  let rm = b1 & 0b_111;
  let disp = displacement(reader, mode, rm)?;
  let dst = rm_operand(mode, rm, width, disp);
  let src = Operand::Immediate(reader.read_data(width)?);
  Ok(Instruction { mnemonic: Mnemonic::Mov, width, dst, src })
}

fn decode_imm_to_acc(reader: &mut Reader, mnemonic: Mnemonic) -> Result<Instruction, DecodeError> {
  let b0 = reader.read_u8()?;
  debug_assert!(matches!(b0 >> 1, 0b_0000010 | 0b_0010110 | 0b_0011110));
  let width = width_bit(b0 & 0b_1 != 0);
  let data = reader.read_data(width)?;
  Ok(Instruction {
    mnemonic,
    width,
    dst: Operand::Register(register(0b_000, width)),
    src: Operand::Immediate(data),
  })
}
