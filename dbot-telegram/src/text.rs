//! Splitting long replies into Telegram-sized messages.

/// Maximum length of one Telegram text message, in characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Splits `text` into chunks of at most `limit` characters, breaking between lines where
/// possible and inside a line only when the line alone is too long.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    fn flush(chunks: &mut Vec<String>, current: &mut String) {
        let chunk = current.trim_end_matches('\n');
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        current.clear();
    }

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && current_len > 0 {
            flush(&mut chunks, &mut current);
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        for ch in line.chars() {
            if current_len == limit {
                flush(&mut chunks, &mut current);
                current_len = 0;
            }
            current.push(ch);
            current_len += 1;
        }
    }
    flush(&mut chunks, &mut current);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_message("hello\nworld", 100), vec!["hello\nworld"]);
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn test_splits_between_lines() {
        assert_eq!(split_message("aaa\nbbb\nccc", 8), vec!["aaa\nbbb", "ccc"]);
    }

    #[test]
    fn test_long_line_is_cut() {
        assert_eq!(split_message("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(split_message("ab\nабвгд", 3), vec!["ab", "абв", "гд"]);
    }
}
