use crate::context::Context;

/// Errors reported while writing a document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The trusted template text itself is malformed, e.g. a quote inside an
    /// attribute name or an unterminated escape sequence. The sink is intact
    /// up to the last safe emission.
    #[error("template error: {0}")]
    Template(String),

    /// `close` was called while the writer was not back in the HTML text
    /// state, so the output is not a full, valid fragment.
    #[error("incomplete document fragment ended in {0}")]
    IncompleteDocument(Context),

    /// A previous failure while emitting an untrusted value left the output
    /// at an unknown boundary; the writer refuses further use.
    #[error("writer poisoned by an earlier write failure")]
    Poisoned,

    /// The underlying sink failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a template error pointing at the offending character:
    /// the reported text reads `msg` followed by the chunk with a `^`
    /// spliced in ahead of the problem position.
    pub(crate) fn template_at(s: &str, off: usize, pos: usize, end: usize, msg: &str) -> Error {
        let mut rendered = String::with_capacity(msg.len() + (end - off) + 1);
        rendered.push_str(msg);
        rendered.push_str(&s[off..pos]);
        rendered.push('^');
        rendered.push_str(&s[pos..end]);
        Error::Template(rendered)
    }
}
