use std::ops::Range;

/// Queries a single worker may get through per pass before throttling applies.
pub const QUERIES_PER_WORKER: usize = 170;

/// Hard cap of Queries per pass; the worker stops after this many and waits
/// to be invoked again.
pub const QUERIES_PER_PASS: usize = 5;

/// Positions of the Queries one pass will process, starting at `cursor`.
///
/// The window never runs past `total`; a cursor at or beyond the end yields an
/// empty range.
pub fn query_window(total: usize, cursor: usize, limit: usize) -> Range<usize> {
    let start = cursor.min(total);
    let end = start.saturating_add(limit).min(total);
    start..end
}

/// Per-pass limit: the throttled worker capacity, bounded by the pass cap.
pub fn pass_limit(queries_per_worker: usize, worker_count: usize, queries_per_pass: usize) -> usize {
    queries_per_worker
        .saturating_mul(worker_count.max(1))
        .min(queries_per_pass)
}

/// Prepare raw subject names for searching: trims, drops blanks, and appends
/// `region` to names that do not mention it already.
pub fn normalize_queries<I, S>(raw: I, region: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let region = region.map(str::trim).filter(|r| !r.is_empty());
    raw.into_iter()
        .map(|q| q.as_ref().trim().to_string())
        .filter(|q| !q.is_empty())
        .map(|q| match region {
            Some(region) if !q.contains(region) => format!("{q} {region}"),
            _ => q,
        })
        .collect()
}
