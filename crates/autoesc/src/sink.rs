//! The output side of the writer.
//!
//! Escapers are generic over [`TextSink`] so the same streaming transforms
//! serve a `String`, an [`std::io::Write`], and the transient wrappers the
//! writer installs around attribute values.

use std::io;

use crate::replacement::ReplacementTable;

/// A destination for text output.
pub trait TextSink {
    fn write_str(&mut self, s: &str) -> io::Result<()>;

    fn write_char(&mut self, c: char) -> io::Result<()> {
        self.write_str(c.encode_utf8(&mut [0u8; 4]))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TextSink for String {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.push_str(s);
        Ok(())
    }

    fn write_char(&mut self, c: char) -> io::Result<()> {
        self.push(c);
        Ok(())
    }
}

impl<S: TextSink + ?Sized> TextSink for &mut S {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        (**self).write_str(s)
    }

    fn write_char(&mut self, c: char) -> io::Result<()> {
        (**self).write_char(c)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Adapts any byte writer into a UTF-8 text sink.
#[derive(Debug)]
pub struct IoSink<W: io::Write>(pub W);

impl<W: io::Write> TextSink for IoSink<W> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.0.write_all(s.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// A sink that re-encodes everything written through it with a replacement
/// table. The writer installs one of these around escaper output inside
/// quoted attribute values so the active delimiter cannot appear unescaped.
pub(crate) struct EscapingSink<'a, S: TextSink> {
    out: &'a mut S,
    table: &'static ReplacementTable,
}

impl<'a, S: TextSink> EscapingSink<'a, S> {
    pub(crate) fn new(out: &'a mut S, table: &'static ReplacementTable) -> Self {
        EscapingSink { out, table }
    }
}

impl<S: TextSink> TextSink for EscapingSink<'_, S> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.table.escape_onto(s, self.out)
    }

    fn write_char(&mut self, c: char) -> io::Result<()> {
        self.table.escape_char_onto(c, self.out)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_sink_accumulates() {
        let mut s = String::new();
        s.write_str("a").unwrap();
        s.write_char('b').unwrap();
        assert_eq!(s, "ab");
    }

    #[test]
    fn io_sink_writes_utf8() {
        let mut buf = Vec::new();
        {
            let mut sink = IoSink(&mut buf);
            sink.write_str("héllo").unwrap();
            sink.flush().unwrap();
        }
        assert_eq!(buf, "héllo".as_bytes());
    }
}
