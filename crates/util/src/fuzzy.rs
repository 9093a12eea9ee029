//! Fuzzy subsequence matcher used to rank the model catalog.
//!
//! Matching is a single left-to-right scan: every character of the
//! lower-cased query must appear, in order but not necessarily contiguously,
//! within the lower-cased candidate text. Scoring rewards contiguous runs
//! and matches aligned to word boundaries, then normalizes by candidate
//! length so short candidates outrank long ones containing the same match.

/// Base score for every matched character.
const BASE_CHAR_SCORE: u32 = 1;
/// Flat bonus for a match at the start of the text or right after a
/// separator.
const WORD_BOUNDARY_BONUS: u32 = 3;
/// Characters treated as word separators for the boundary bonus.
const SEPARATORS: [char; 3] = [' ', '-', '/'];

/// Result of scoring a query against one candidate.
///
/// A `score` of zero means "no match" and always comes with an empty
/// position list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuzzyMatch {
    /// Length-normalized match quality, `0.0` when the query is not a
    /// subsequence of the text.
    pub score: f64,
    /// Indices of the matched characters in the lower-cased text, ascending.
    pub positions: Vec<usize>,
}

impl FuzzyMatch {
    /// Whether the query matched at all.
    pub fn is_match(&self) -> bool {
        self.score > 0.0
    }

    fn none() -> Self {
        FuzzyMatch::default()
    }
}

/// Scores `query` against `text`.
///
/// An empty query or empty text never matches. The accumulated raw score is
/// divided by the text length (in characters) and scaled by 100.
pub fn fuzzy_match(query: &str, text: &str) -> FuzzyMatch {
    if query.is_empty() || text.is_empty() {
        return FuzzyMatch::none();
    }

    let text_chars: Vec<char> = text.chars().flat_map(|c| c.to_lowercase()).collect();
    let query_chars: Vec<char> = query.chars().flat_map(|c| c.to_lowercase()).collect();

    let mut positions = Vec::with_capacity(query_chars.len());
    let mut raw_score: u32 = 0;
    let mut run_length: u32 = 1;
    let mut previous_position: Option<usize> = None;
    let mut scan_from = 0usize;

    for &query_char in &query_chars {
        let Some(relative) = text_chars[scan_from..].iter().position(|&c| c == query_char) else {
            // Text exhausted before the query: the whole match is void.
            return FuzzyMatch::none();
        };
        let position = scan_from + relative;

        let mut char_score = BASE_CHAR_SCORE;
        match previous_position {
            Some(previous) if position == previous + 1 => {
                run_length += 1;
                char_score += run_length;
            }
            _ => run_length = 1,
        }
        if is_word_boundary(&text_chars, position) {
            char_score += WORD_BOUNDARY_BONUS;
        }

        raw_score += char_score;
        positions.push(position);
        previous_position = Some(position);
        scan_from = position + 1;
    }

    FuzzyMatch {
        score: f64::from(raw_score) / text_chars.len() as f64 * 100.0,
        positions,
    }
}

fn is_word_boundary(text_chars: &[char], position: usize) -> bool {
    position == 0 || text_chars.get(position - 1).is_some_and(|c| SEPARATORS.contains(c))
}
