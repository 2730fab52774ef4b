//! String similarity scores on a 0–100 scale.
//!
//! All scores are built on the indel (insert/delete) distance: two strings
//! of total length `L` sharing a longest common subsequence of length `k`
//! score `200 * k / L`. Inputs are compared as Unicode scalar values and are
//! not normalized here; callers lowercase as needed.

/// Plain similarity of two strings.
///
/// Two empty strings are identical (100); one empty string scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best similarity of the shorter string against any equally long window
/// of the longer one, including windows clipped at either end.
///
/// Tolerates the shorter string being embedded in surrounding text: a
/// verbatim substring scores 100.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();
    let mut best = 0.0f64;

    // Full-width windows.
    for start in 0..=(n - m) {
        best = best.max(ratio_chars(short, &long[start..start + m]));
        if best >= 100.0 {
            return 100.0;
        }
    }

    // Windows clipped at the start and end of the longer string.
    for len in 1..m.min(n + 1) {
        best = best.max(ratio_chars(short, &long[..len]));
        best = best.max(ratio_chars(short, &long[n - len..]));
    }

    best
}

/// Similarity after splitting on whitespace and sorting the tokens, so word
/// order does not matter.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = lcs_len(a, b);
    200.0 * lcs as f64 / total as f64
}

/// Longest common subsequence length, single rolling row.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}
