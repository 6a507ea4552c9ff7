//! Factsheet retrieval
//!
//! Scores factsheet lines against a free-text query. Matching is tried in
//! order: any query word as a substring, every query word as a substring,
//! then a Levenshtein fallback that returns the closest line with one line
//! of surrounding context. Queries with no match at all get a fixed
//! "not found" message.

/// Edit distances at or above this never produce a fuzzy match
const FUZZY_DISTANCE_THRESHOLD: usize = 20;

/// Look up the most relevant factsheet lines for `query`.
///
/// Pure function over the corpus text; never fails. An empty corpus (or a
/// corpus of blank lines) always yields the not-found message.
pub fn lookup(query: &str, corpus: &str) -> String {
    let lines: Vec<&str> = corpus
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let query_lower = query.to_lowercase();
    let query_words: Vec<&str> = query_lower.split_whitespace().collect();

    // At least one word from the query
    let candidates: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| {
            let l = line.to_lowercase();
            query_words.iter().any(|w| l.contains(w))
        })
        .collect();
    if !candidates.is_empty() {
        return candidates.join("\n");
    }

    // Every word from the query. Subsumed by the any-word pass above except
    // when the query has no word tokens at all; then the predicate is
    // vacuously true and the whole corpus is returned.
    let keyword_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| {
            let l = line.to_lowercase();
            query_words.iter().all(|w| l.contains(w))
        })
        .collect();
    if !keyword_lines.is_empty() {
        return keyword_lines.join("\n");
    }

    // Fuzzy fallback: closest line by edit distance, first minimum wins
    let normalized_query = normalize(query);
    let mut best: Option<(usize, usize)> = None;
    for (index, line) in lines.iter().enumerate() {
        let distance = levenshtein(&normalized_query, &normalize(line));
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, index));
        }
    }

    if let Some((distance, index)) = best {
        if distance < FUZZY_DISTANCE_THRESHOLD {
            // Context window: matched line plus immediate neighbors
            let start = index.saturating_sub(1);
            let end = (index + 2).min(lines.len());
            return lines[start..end].join("\n");
        }
    }

    format!("Sorry, I couldn't find anything relevant to \"{query}\".")
}

/// Lowercase and collapse runs of whitespace to single spaces
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classic dynamic-programming Levenshtein distance over chars, unit cost
/// for insert, delete and substitute.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
