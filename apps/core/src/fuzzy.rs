/// Greedy in-order subsequence score in `(0, 30]`, or `0.0` when some query
/// character cannot be found after the previous one. Dense, front-loaded
/// matches score higher than scattered ones.
pub fn fuzzy_score(query: &str, text: &str) -> f64 {
    let needle: Vec<char> = query.chars().collect();
    if needle.is_empty() {
        return 0.0;
    }

    let mut cursor = 0;
    let mut run = 0_usize;
    let mut longest_run = 0_usize;
    let mut text_len = 0_usize;

    for hay_char in text.chars() {
        text_len += 1;
        if cursor < needle.len() && hay_char == needle[cursor] {
            cursor += 1;
            run += 1;
            longest_run = longest_run.max(run);
        } else {
            run = 0;
        }
    }

    if cursor < needle.len() {
        return 0.0;
    }

    let length_ratio = needle.len() as f64 / text_len as f64;
    let consecutive_ratio = longest_run as f64 / needle.len() as f64;
    (0.3 * length_ratio + 0.7 * consecutive_ratio) * 30.0
}

#[cfg(test)]
mod tests {
    use super::fuzzy_score;

    #[test]
    fn missing_character_scores_zero() {
        assert_eq!(fuzzy_score("fxz", "firefox"), 0.0);
        assert_eq!(fuzzy_score("xof", "firefox"), 0.0);
    }

    #[test]
    fn identical_text_scores_maximum() {
        assert!((fuzzy_score("gimp", "gimp") - 30.0).abs() < 1e-9);
    }

    #[test]
    fn dense_match_beats_scattered_match() {
        let dense = fuzzy_score("term", "terminal");
        let scattered = fuzzy_score("term", "the remote manager");
        assert!(dense > scattered);
        assert!(scattered > 0.0);
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(fuzzy_score("", "anything"), 0.0);
    }
}
