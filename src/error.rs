use thiserror::Error;

/// Why a decode pass stopped. Lines rendered before the stopping point
/// remain valid output; none of these abort the host process.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("unrecognized opcode 0b{byte:08b} at offset {offset}")]
  UnknownOpcode { offset: usize, byte: u8 },
  #[error("unsupported operation 0b{op:03b} in immediate group at offset {offset}")]
  UnknownGroupOp { offset: usize, op: u8 },
  #[error("truncated instruction: input ends at offset {offset}")]
  Truncated { offset: usize },
  #[error("decoder consumed no bytes at offset {offset}")]
  Stalled { offset: usize },
  #[error("failed writing output: {0}")]
  Io(#[from] std::io::Error),
}
