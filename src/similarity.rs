//! Normalised edit-distance similarity.

/// Length gap beyond which two strings are treated as unrelated.
const MAX_LENGTH_GAP: usize = 3;

/// Levenshtein distance counted in Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Similarity in `[0.0, 1.0]`, where `1.0` means identical.
///
/// Strings whose lengths differ by more than three characters short-circuit
/// to `0.0` without computing the distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a.abs_diff(len_b) > MAX_LENGTH_GAP {
        return 0.0;
    }

    let longest = len_a.max(len_b);
    if longest == 0 {
        return 1.0;
    }

    1.0 - edit_distance(a, b) as f64 / longest as f64
}
