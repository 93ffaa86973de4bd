use autoesc::{HtmlEscapingWriter, IoSink};
use std::io::{self, Read};

/// Reads trusted HTML from stdin and writes the normalized form to stdout:
/// comments elided, unquoted attributes quoted, stray `<` escaped.
fn main() -> io::Result<()> {
    let mut html = String::new();
    io::stdin().read_to_string(&mut html)?;

    let stdout = io::stdout();
    let mut w = HtmlEscapingWriter::new(IoSink(stdout.lock()));
    if let Err(e) = w.write_safe(&html) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    if let Err(e) = w.close() {
        eprintln!("{e}");
        std::process::exit(1);
    }
    Ok(())
}
