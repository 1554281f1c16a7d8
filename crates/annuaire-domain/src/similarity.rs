//! Trigram string similarity
//!
//! Follows the PostgreSQL `pg_trgm` definition: the text is lower-cased and
//! split into words on non-alphanumeric characters, each word is padded with
//! two leading spaces and one trailing space, and the set of distinct
//! three-character windows is collected. Similarity is the size of the
//! intersection of two trigram sets over the size of their union.

use std::collections::BTreeSet;

/// Trigram set of a string
pub fn trigrams(text: &str) -> BTreeSet<[char; 3]> {
    let lowered = text.to_lowercase();
    let mut set = BTreeSet::new();

    for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = [' ', ' ']
            .into_iter()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Similarity score in `[0.0, 1.0]`
///
/// Two strings without any trigram (empty or punctuation only) score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() && right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// Whether two values start with the same character
///
/// Mirrors SQL `LEFT(a, 1) = LEFT(b, 1)`: case-sensitive, and an empty value
/// never matches.
pub fn same_initial(a: &str, b: &str) -> bool {
    match (a.chars().next(), b.chars().next()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigrams_of_word() {
        let set = trigrams("Cat");
        let expected: BTreeSet<[char; 3]> = [
            [' ', ' ', 'c'],
            [' ', 'c', 'a'],
            ['c', 'a', 't'],
            ['a', 't', ' '],
        ]
        .into_iter()
        .collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(similarity("Dupont", "Dupont"), 1.0);
        assert_eq!(similarity("Dupont", "DUPONT"), 1.0);
    }

    #[test]
    fn test_known_pg_trgm_value() {
        // pg_trgm: similarity('word', 'two words') = 4 / 11
        let score = similarity("word", "two words");
        assert!((score - 4.0 / 11.0).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        assert!(similarity("Dupont", "Martin") <= 0.3);
        assert!(similarity("Dupont", "Dupond") > 0.3);
    }

    #[test]
    fn test_punctuation_is_a_separator() {
        assert_eq!(similarity("Jean-Pierre", "jean pierre"), 1.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("--", "Dupont"), 0.0);
    }

    #[test]
    fn test_accented_letters_are_word_characters() {
        assert_eq!(similarity("Genève", "genève"), 1.0);
        assert!(similarity("Genève", "Geneve") < 1.0);
    }

    #[test]
    fn test_same_initial() {
        assert!(same_initial("Jean", "Jeanne"));
        assert!(!same_initial("Jean", "jean"));
        assert!(!same_initial("", "Jean"));
        assert!(same_initial("Élodie", "Émile"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: score is symmetric
        #[test]
        fn test_symmetric(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
        }

        /// Property: score stays within [0, 1]
        #[test]
        fn test_bounded(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        /// Property: any string with a word character matches itself fully
        #[test]
        fn test_reflexive(a in "[a-zA-Z]{1,12}( [a-zA-Z]{1,12}){0,2}") {
            prop_assert_eq!(similarity(&a, &a), 1.0);
        }
    }
}
