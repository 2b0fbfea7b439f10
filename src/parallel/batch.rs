//! Batch boundaries for chunked scans.
//!
//! The fallback query path processes records in batches: each batch fans
//! out across the worker pool, and the deadline/cancellation signal is
//! checked at batch boundaries so a long scan can stop promptly without
//! per-record clock reads.

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Batch count giving roughly `target_batch_size` records per batch, with
/// at least one batch for a non-empty scan.
pub fn batch_count_for(total: usize, target_batch_size: usize) -> usize {
    if total == 0 {
        return 0;
    }
    total.div_ceil(target_batch_size.max(1))
}
