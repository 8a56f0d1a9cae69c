//! Sentence splitting for sequential playback.

/// Split a response into playback units on terminating punctuation.
///
/// Each unit keeps its terminator. A trailing run with no terminator is its
/// own unit, so nothing a model says is silently dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let unit = current.trim();
            if !unit.is_empty() {
                units.push(unit.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        units.push(tail.to_string());
    }

    units
}
