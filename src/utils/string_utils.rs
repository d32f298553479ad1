//! String utility functions
//!
//! Utilities for working with strings and text data.

/// Trims trailing null characters from a byte buffer
pub fn trim_trailing_nulls(buffer: &mut Vec<u8>) {
    while buffer.last() == Some(&0) {
        buffer.pop();
    }
}

/// Splits text into lines on `\n`, `\r\n` or a lone `\r`
///
/// A trailing line terminator does not produce an empty final line.
pub fn split_lines(text: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < text.len() {
        match text[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            },
            b'\r' => {
                lines.push(&text[start..i]);
                if text.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            },
            _ => {}
        }
        i += 1;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_mixed_terminators() {
        let lines = split_lines(b"Aperio Image\r\nlabel 387x463\rmacro\nlast");
        assert_eq!(lines, vec![&b"Aperio Image"[..], b"label 387x463", b"macro", b"last"]);
    }

    #[test]
    fn test_split_lines_trailing_newline() {
        assert_eq!(split_lines(b"one\n"), vec![&b"one"[..]]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_trim_trailing_nulls() {
        let mut buffer = b"abc\0\0".to_vec();
        trim_trailing_nulls(&mut buffer);
        assert_eq!(buffer, b"abc");
    }
}
