//! Interactive confirmation prompt
//!
//! Thin I/O glue gating the download phase. Generic over reader and writer so
//! tests drive it with in-memory buffers.

use std::io::{BufRead, Error, ErrorKind, Write};

/// Ask the operator whether to proceed with the download
///
/// Prints the prompt, reads one line, and accepts exactly `y` or `n`
/// (surrounding whitespace ignored). Any other input re-prompts in a loop —
/// never recursively, so pathological input cannot grow the stack. EOF before
/// an answer is an error.
pub fn confirm_download<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<bool> {
    loop {
        write!(output, "Do you want to download it? (y/n): ")?;
        output.flush()?;

        let mut response = String::new();
        if input.read_line(&mut response)? == 0 {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "input closed before confirmation",
            ));
        }

        match response.trim() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => continue,
        }
    }
}
