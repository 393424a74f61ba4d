use super::normalize::normalize;

/// Find the candidates a (partial) search term refers to.
///
/// A blank query returns every candidate, `limit` notwithstanding. Otherwise
/// the result holds, in their original order, the first `limit` candidates
/// whose normalized form contains the normalized query. Plain substring
/// matching: no prefix anchoring and no edit distance.
pub fn find_matches<'a, S: AsRef<str>>(query: &str, candidates: &'a [S], limit: usize) -> Vec<&'a str> {
    let needle = normalize(query);
    if needle.is_empty() {
        return candidates.iter().map(|c| c.as_ref()).collect();
    }
    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| normalize(c).contains(&needle))
        .take(limit)
        .collect()
}
