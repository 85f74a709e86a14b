//! Display names derived from member names.

/// Turns a member name into a label: `m_maxHealth` → `Max Health`,
/// `spawn_rate` → `Spawn Rate`, `HTTPPort` → `HTTP Port`.
pub fn nicify(name: &str) -> String {
    let trimmed = name
        .strip_prefix("m_")
        .unwrap_or(name)
        .trim_start_matches('_');

    let chars: Vec<char> = trimmed.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // camelCase hump, or the last capital of an acronym followed by a word
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
