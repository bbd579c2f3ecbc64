//! Name similarity scoring for fuzzy matching
//!
//! Compares a transaction's counterpart name against a customer's names
//! and returns a 0..=100 score. Four independent techniques each produce
//! a score and the best one wins: a single strong signal (say, an exact
//! alias hit) is enough even when the others disagree. The blend favors
//! recall; each technique is its own function so the policy stays
//! swappable and testable in isolation.
//!
//! Pure and infallible: empty strings score 0 against anything non-empty
//! and 100 against each other.

/// Case-normalize and collapse whitespace
fn normalize(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Technique 1: exact match after normalization
fn exact_score(a: &str, b: &str) -> u8 {
    if a == b {
        100
    } else {
        0
    }
}

/// Technique 2: substring containment, proportional to how much of the
/// combined length the shorter string covers
fn containment_score(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if !(a.contains(b) || b.contains(a)) {
        return 0;
    }
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let shorter = len_a.min(len_b);
    (2.0 * shorter as f64 / (len_a + len_b) as f64 * 100.0) as u8
}

/// Technique 3: Jaccard similarity of the two word sets
fn word_overlap_score(a: &str, b: &str) -> u8 {
    let words_a: std::collections::HashSet<&str> = a.split(' ').filter(|w| !w.is_empty()).collect();
    let words_b: std::collections::HashSet<&str> = b.split(' ').filter(|w| !w.is_empty()).collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0;
    }
    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    (intersection as f64 / union as f64 * 100.0) as u8
}

/// Technique 4: Levenshtein distance as a ratio of the longer length
fn edit_distance_score(a: &str, b: &str) -> u8 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 100;
    }
    let distance = levenshtein_distance(a, b);
    ((1.0 - distance as f64 / max_len as f64) * 100.0).max(0.0) as u8
}

/// Minimum number of single-character edits (insertions, deletions,
/// substitutions) turning one string into the other
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();

    if chars_a.is_empty() {
        return chars_b.len();
    }
    if chars_b.is_empty() {
        return chars_a.len();
    }

    let mut previous: Vec<usize> = (0..=chars_b.len()).collect();
    let mut current = vec![0; chars_b.len() + 1];

    for (i, ca) in chars_a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in chars_b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[chars_b.len()]
}

/// Score the similarity of two names, 0..=100
pub fn score(name_a: &str, name_b: &str) -> u8 {
    let a = normalize(name_a);
    let b = normalize(name_b);
    exact_score(&a, &b)
        .max(containment_score(&a, &b))
        .max(word_overlap_score(&a, &b))
        .max(edit_distance_score(&a, &b))
}

/// Score a counterpart name against every name a customer is known
/// under, keeping the best
pub fn score_against(counterpart: &str, names: &[&str]) -> u8 {
    names
        .iter()
        .map(|name| score(counterpart, name))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_names_score_100() {
        assert_eq!(score("ACME Corp", "ACME Corp"), 100);
        assert_eq!(score("acme  corp", "ACME Corp"), 100);
        assert_eq!(score("", ""), 100);
    }

    #[test]
    fn test_empty_against_non_empty_scores_0() {
        assert_eq!(score("", "ACME Corp"), 0);
        assert_eq!(score("ACME Corp", ""), 0);
    }

    #[test]
    fn test_all_techniques_are_symmetric() {
        let pairs = [
            ("acme corp", "acme"),
            ("jansen bv", "janssens bvba"),
            ("alpha beta", "beta gamma"),
            ("", "acme"),
        ];
        for (a, b) in pairs {
            assert_eq!(exact_score(a, b), exact_score(b, a));
            assert_eq!(containment_score(a, b), containment_score(b, a));
            assert_eq!(word_overlap_score(a, b), word_overlap_score(b, a));
            assert_eq!(edit_distance_score(a, b), edit_distance_score(b, a));
            assert_eq!(score(a, b), score(b, a));
        }
    }

    #[test]
    fn test_containment_is_proportional() {
        // "acme" (4) inside "acme corp" (9): 2*4/13*100 = 61
        assert_eq!(containment_score("acme", "acme corp"), 61);
        assert_eq!(containment_score("acme", "zenith"), 0);
    }

    #[test]
    fn test_word_overlap_is_jaccard() {
        // {alpha, beta} vs {beta, gamma}: 1 shared of 3 total = 33
        assert_eq!(word_overlap_score("alpha beta", "beta gamma"), 33);
        assert_eq!(word_overlap_score("alpha beta", "alpha beta"), 100);
    }

    #[test]
    fn test_edit_distance_ratio() {
        // distance 1 over max length 9
        assert_eq!(levenshtein_distance("acme corp", "acme gorp"), 1);
        assert_eq!(edit_distance_score("acme corp", "acme gorp"), 88);
        assert_eq!(edit_distance_score("abc", "xyz"), 0);
    }

    #[test]
    fn test_best_technique_wins() {
        // Containment (61) beats word overlap (50) and edit ratio here
        assert_eq!(score("ACME", "ACME Corp"), 61);
    }

    #[test]
    fn test_alias_list_takes_the_maximum() {
        let names = ["Jansen Holding NV", "ACME Corp", "Jansen Retail"];
        assert_eq!(score_against("ACME Corp", &names), 100);
        assert_eq!(score_against("", &names), 0);
        assert_eq!(score_against("ACME Corp", &[]), 0);
    }
}
