mod decode;
mod error;
mod instruction;
mod render;

use std::fs::File;
use std::io::{self, Write};
use std::process;

fn main() {
  let args: Vec<String> = std::env::args().collect();
  let (input, output) = match args.len() {
    2 => (args[1].as_str(), None),
    4 if args[1] == "-f" => (args[3].as_str(), Some(args[2].as_str())),
    _ => {
      eprintln!("Usage: dasm-8086 [-f OUTPUT-FILE] INPUT-FILE");
      process::exit(1);
    }
  };

  let data = match std::fs::read(input) {
    Ok(data) => data,
    Err(err) => {
      eprintln!("dasm-8086: failed reading `{input}`: {err}");
      process::exit(1);
    }
  };

  let mut out: Box<dyn Write> = match output {
    Some(path) => match File::create(path) {
      Ok(file) => Box::new(file),
      Err(err) => {
        eprintln!("dasm-8086: failed creating `{path}`: {err}");
        process::exit(1);
      }
    },
    None => Box::new(io::stdout().lock()),
  };

  // Lines decoded before a failure have already reached the sink; the
  // diagnostic goes to stderr so it never mixes with the listing.
  if let Err(err) = decode::disassemble(&data, &mut out) {
    eprintln!("dasm-8086: {err}");
    process::exit(1);
  }
}
