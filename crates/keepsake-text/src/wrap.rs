#![forbid(unsafe_code)]

//! Paragraph-preserving word wrap against a measured width.
//!
//! Input is split on `\n` into paragraphs. A paragraph that is empty or only
//! whitespace becomes one empty line, so stanza breaks survive wrapping.
//! Other paragraphs are split on whitespace and greedily packed: a word
//! moves to the next line only when appending it would exceed `max_width`
//! and the current line already holds something. A single word wider than
//! `max_width` therefore occupies a line of its own rather than being
//! broken mid-word.

/// Wrap `text` into lines no wider than `max_width` where possible.
///
/// `measure` returns the advance width of a candidate line.
pub fn wrap_paragraphs<F>(text: &str, max_width: f64, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> f64,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate_len = current.len() + 1 + word.len();
            let mut candidate = String::with_capacity(candidate_len);
            candidate.push_str(&current);
            candidate.push(' ');
            candidate.push_str(word);
            if measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_owned()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(line: &str) -> f64 {
        line.chars().count() as f64
    }

    #[test]
    fn greedy_packing() {
        let lines = wrap_paragraphs("Hello world foo bar", 10.0, chars);
        assert_eq!(lines, vec!["Hello", "world foo", "bar"]);
    }

    #[test]
    fn blank_paragraphs_are_kept() {
        let lines = wrap_paragraphs("one\n\n  \ntwo", 20.0, chars);
        assert_eq!(lines, vec!["one", "", "", "two"]);
    }

    #[test]
    fn trailing_newline_adds_blank_line() {
        assert_eq!(wrap_paragraphs("one\n", 20.0, chars), vec!["one", ""]);
        assert_eq!(wrap_paragraphs("", 20.0, chars), vec![""]);
    }

    #[test]
    fn long_word_gets_its_own_line() {
        let lines = wrap_paragraphs("a extraordinarily b", 5.0, chars);
        assert_eq!(lines, vec!["a", "extraordinarily", "b"]);
    }

    #[test]
    fn whitespace_runs_collapse() {
        let lines = wrap_paragraphs("  run \t of   spaces\r\nnext", 40.0, chars);
        assert_eq!(lines, vec!["run of spaces", "next"]);
    }
}
