use crate::instruction::{Instruction, Operand, Width};

/// Renders one instruction record as a single assembler line, terminated
/// by a line break. `mnemonic dst, src`.
pub fn render_line(inst: &Instruction) -> String {
  format!(
    "{} {}, {}\n",
    inst.mnemonic,
    operand(&inst.dst, inst.width),
    operand(&inst.src, inst.width)
  )
}

fn operand(op: &Operand, width: Width) -> String {
  match op {
    Operand::Register(name) => (*name).to_string(),
    // A zero displacement is omitted; a non-zero one renders signed, so an
    // 8-bit negative displacement shows up as e.g. `[bx + -37]`.
    Operand::Memory { expr, disp: 0 } => format!("{} [{}]", qualifier(width), expr),
    Operand::Memory { expr, disp } => format!("{} [{} + {}]", qualifier(width), expr, disp),
    Operand::Direct(addr) => format!("word [{}]", *addr as i16),
    Operand::Immediate(value) => format!("{}", *value as i16),
  }
}

fn qualifier(width: Width) -> &'static str {
  match width {
    Width::Byte => "byte",
    Width::Word => "word",
  }
}
