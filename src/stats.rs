use serde_json::Value;

// Sum the counts of a `[[timestamp, count], ...]` series.
// Anything that is not a pair with an integer count is skipped.
pub fn sum_series(series: &[Value]) -> i64 {
    series
        .iter()
        .filter_map(|entry| match entry.as_array() {
            Some(pair) if pair.len() == 2 => pair[1].as_i64(),
            _ => None,
        })
        .sum()
}
