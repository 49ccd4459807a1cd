use crate::checker::dictionary::Dictionary;
use strsim::levenshtein;

/// Generate spelling suggestions, closest first
pub fn generate(word: &str, dictionary: &Dictionary, max_suggestions: usize) -> Vec<String> {
    if max_suggestions == 0 {
        return Vec::new();
    }

    let lower = word.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let mut suggestions: Vec<String> = Vec::new();

    let push = |suggestions: &mut Vec<String>, candidate: String| {
        if candidate != lower && !suggestions.contains(&candidate) {
            suggestions.push(candidate);
        }
        suggestions.len() >= max_suggestions
    };

    // 1. Prefix matching (fast)
    if chars.len() >= 3 {
        let prefix: String = chars[..3].iter().collect();
        for candidate in ranked(&lower, dictionary.words_with_prefix(&prefix), 2) {
            if push(&mut suggestions, candidate) {
                return restore_case(word, suggestions);
            }
        }
    }

    // 2. Single edits that land in the dictionary
    for candidate in transformations(&chars) {
        if dictionary.contains(&candidate) && push(&mut suggestions, candidate) {
            return restore_case(word, suggestions);
        }
    }

    // 3. Shorter prefix, looser distance
    if chars.len() >= 2 {
        let prefix: String = chars[..2].iter().collect();
        for candidate in ranked(&lower, dictionary.words_with_prefix(&prefix), 3) {
            if push(&mut suggestions, candidate) {
                break;
            }
        }
    }

    suggestions.truncate(max_suggestions);
    restore_case(word, suggestions)
}

/// Words within `max_distance` of `word`, closest first
fn ranked(word: &str, candidates: Vec<String>, max_distance: usize) -> Vec<String> {
    let mut scored: Vec<(usize, String)> = candidates
        .into_iter()
        .map(|c| (levenshtein(word, &c), c))
        .filter(|(d, _)| *d <= max_distance)
        .collect();
    scored.sort();
    scored.into_iter().map(|(_, c)| c).collect()
}

/// Capitalize suggestions for a capitalized word.
fn restore_case(word: &str, suggestions: Vec<String>) -> Vec<String> {
    if !word.chars().next().is_some_and(char::is_uppercase) {
        return suggestions;
    }
    suggestions.into_iter().map(|s| capitalize(&s)).collect()
}

/// Uppercase the first character.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deletions, adjacent swaps and common letter confusions
fn transformations(chars: &[char]) -> Vec<String> {
    const CONFUSIONS: &[(char, char)] = &[
        ('a', 'e'),
        ('e', 'i'),
        ('i', 'e'),
        ('o', 'u'),
        ('b', 'p'),
        ('c', 'k'),
        ('d', 't'),
        ('t', 'd'),
        ('f', 'v'),
        ('v', 'f'),
        ('s', 'z'),
        ('z', 's'),
        ('ä', 'e'),
        ('ü', 'u'),
        ('ö', 'o'),
    ];

    let mut out = Vec::new();

    for i in 0..chars.len() {
        let mut w = chars.to_vec();
        w.remove(i);
        out.push(w.iter().collect());
    }

    for i in 0..chars.len().saturating_sub(1) {
        let mut w = chars.to_vec();
        w.swap(i, i + 1);
        out.push(w.iter().collect());
    }

    for (i, &ch) in chars.iter().enumerate() {
        for &(from, to) in CONFUSIONS {
            if ch == from {
                let mut w = chars.to_vec();
                w[i] = to;
                out.push(w.iter().collect());
            }
        }
    }

    out
}

/// Similarity in `[0, 1]`: twice the longest common subsequence over the
/// total length, counted in characters. Two empty words are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    2.0 * prev[b.len()] as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(words: &[&str]) -> Dictionary {
        Dictionary::from_words(words.iter().map(|w| w.to_string())).unwrap()
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("haus", "haus"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        assert_eq!(similarity_ratio("Zeitpunkt", "Zeitpukt"), 16.0 / 17.0);
        assert_eq!(similarity_ratio("größe", "grösse"), 8.0 / 11.0);
    }

    #[test]
    fn test_transformations() {
        let chars: Vec<char> = "hello".chars().collect();
        let transforms = transformations(&chars);
        assert!(transforms.contains(&"hllo".to_string()));
        assert!(transforms.contains(&"ehllo".to_string()));
    }

    #[test]
    fn test_generate_prefers_close_words() {
        let dict = dictionary(&["haus", "hausen", "haut", "garten", "hund"]);
        let suggestions = generate("hause", &dict, 3);
        assert_eq!(suggestions[0], "haus");
        assert!(suggestions.len() <= 3);
        assert!(!suggestions.contains(&"garten".to_string()));
    }

    #[test]
    fn test_generate_keeps_capitalization() {
        let dict = dictionary(&["garten"]);
        assert_eq!(generate("Gartne", &dict, 5), vec!["Garten"]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("über"), "Über");
        assert_eq!(capitalize(""), "");
    }
}
