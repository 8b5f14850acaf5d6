//! "Did you mean" suggestions for names that failed to resolve.

/// Score how well `candidate` matches `authored`.
///
/// Both strings are compared case-insensitively. The score sums the squared length of every
/// run of matching characters in their longest common subsequence, so long contiguous matches
/// beat scattered ones, and subtracts a tenth of the difference in length.
///
/// A candidate sharing fewer than half of the authored characters scores zero.
pub fn near_miss_score(authored: &str, candidate: &str) -> f64 {
    let authored: Vec<char> = authored.to_lowercase().chars().collect();
    let candidate: Vec<char> = candidate.to_lowercase().chars().collect();
    let runs = matching_runs(&authored, &candidate);
    let matched: usize = runs.iter().sum();
    if matched == 0 || matched * 2 < authored.len() {
        return 0.0;
    }
    let run_score: usize = runs.into_iter().map(|run| run * run).sum();
    let length_difference = authored.len().abs_diff(candidate.len()) as f64;
    run_score as f64 - 0.1 * length_difference
}

/// Lengths of the contiguous runs (in both strings) of one longest common subsequence.
fn matching_runs(a: &[char], b: &[char]) -> Vec<usize> {
    let (n, m) = (a.len(), b.len());
    // lcs[i][j]: length of the LCS of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut runs = vec![];
    let mut current = 0;
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            current += 1;
            i += 1;
            j += 1;
            continue;
        }
        if current > 0 {
            runs.push(current);
            current = 0;
        }
        if lcs[i + 1][j] >= lcs[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

/// The best matches for `authored` among `candidates`, best first.
///
/// Candidates scoring below `threshold` times the best score are dropped, and at most `limit`
/// are returned. Ties are broken by name so the result doesn't depend on candidate order.
pub fn near_misses<S: AsRef<str>>(
    authored: &str,
    candidates: &[S],
    limit: usize,
    threshold: f64,
) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .filter(|candidate| !candidate.is_empty() && *candidate != authored)
        .map(|candidate| (near_miss_score(authored, candidate), candidate))
        .filter(|(score, _)| *score > 0.0)
        .collect();
    scored.sort_by(|(a_score, a_name), (b_score, b_name)| {
        b_score.total_cmp(a_score).then_with(|| a_name.cmp(b_name))
    });
    scored.dedup_by(|a, b| a.1 == b.1);
    let Some(best) = scored.first().map(|(score, _)| *score) else {
        return vec![];
    };
    scored
        .into_iter()
        .take_while(|(score, _)| *score >= best * threshold)
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}
