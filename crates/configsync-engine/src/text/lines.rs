use xi_rope::Rope;

use super::span::Span;

/// A borrowed view of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRef<'a> {
    /// 0-based line number.
    pub index: usize,
    /// Byte span of the whole line, terminator included.
    pub span: Span,
    /// Line content without its terminator.
    pub text: &'a str,
    /// `"\n"`, `"\r\n"` or `""` for an unterminated last line.
    pub terminator: &'a str,
}

impl LineRef<'_> {
    /// Byte span of the content, terminator excluded.
    pub fn content_span(&self) -> Span {
        Span::new(self.span.start, self.span.start + self.text.len())
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Iterates the lines of `text` with their byte spans.
///
/// Splits on `\n` and keeps the terminator separate so callers can rewrite the
/// content of a line while re-emitting its original line ending.
pub fn lines(text: &str) -> impl Iterator<Item = LineRef<'_>> + '_ {
    let mut offset = 0usize;
    text.split_inclusive('\n')
        .enumerate()
        .map(move |(index, raw)| {
            let start = offset;
            offset += raw.len();
            let content = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .unwrap_or(raw);
            LineRef {
                index,
                span: Span::new(start, offset),
                text: content,
                terminator: &raw[content.len()..],
            }
        })
}

/// A line read out of a rope, owning its text.
#[derive(Debug, Clone)]
pub struct RopeLine {
    /// Byte span of this line in the rope (includes newline if present).
    pub span: Span,
    /// The line text with its newline.
    pub text: String,
}

/// Returns an iterator over rope lines with their byte spans.
///
/// Uses `lines_raw` to preserve newline characters so spans stay exact.
pub fn lines_with_spans(rope: &Rope) -> impl Iterator<Item = RopeLine> + '_ {
    let mut offset = 0usize;
    rope.lines_raw(..).map(move |line| {
        let start = offset;
        let len = line.len();
        offset += len;
        RopeLine {
            span: Span::new(start, offset),
            text: line.into_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_keeps_terminators() {
        let got: Vec<_> = lines("a\r\nbb\nc").collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].text, "a");
        assert_eq!(got[0].terminator, "\r\n");
        assert_eq!(got[1].span, Span::new(3, 6));
        assert_eq!(got[1].content_span(), Span::new(3, 5));
        assert_eq!(got[2].text, "c");
        assert_eq!(got[2].terminator, "");
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert_eq!(lines("").count(), 0);
    }

    #[test]
    fn rope_lines_cover_the_whole_buffer() {
        let rope = Rope::from("one\ntwo\n");
        let spans: Vec<_> = lines_with_spans(&rope).map(|l| l.span).collect();
        assert_eq!(spans, vec![Span::new(0, 4), Span::new(4, 8)]);
    }
}
