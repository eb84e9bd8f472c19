//! The `--only` selection mini-language.
//!
//! A selection is a comma separated list of tokens, each one of:
//! - `N`: the N-th source (1-based)
//! - `a-b`: sources `a` through `b` inclusive, in either order
//! - `<=N`: sources `1` through `N`
//!
//! Tokens are kept as ranges and only expanded once the number of configured
//! sources is known, so `1-18446744073709551615` costs nothing to parse.

use crate::error::SelectionError;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Set of 1-based source indices, stored as sorted disjoint ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<RangeInclusive<usize>>,
}

impl Selection {
    /// Select the first `n` sources.
    pub fn first(n: usize) -> Self {
        Self::from_ranges(if n == 0 { Vec::new() } else { vec![1..=n] })
    }

    fn from_ranges(mut ranges: Vec<RangeInclusive<usize>>) -> Self {
        ranges.sort_by_key(|r| *r.start());
        let mut merged: Vec<RangeInclusive<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if *range.start() <= last.end().saturating_add(1) => {
                    if range.end() > last.end() {
                        *last = *last.start()..=*range.end();
                    }
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    /// Sorted, disjoint, non-adjacent ranges.
    pub fn ranges(&self) -> &[RangeInclusive<usize>] {
        &self.ranges
    }

    /// Split the selection against `count` sources.
    ///
    /// Returns the selected indices in ascending order and the ranges that lie
    /// past the last source. Work is bounded by `count`, not by the ranges.
    pub fn resolve(&self, count: usize) -> (Vec<usize>, Vec<RangeInclusive<usize>>) {
        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for range in &self.ranges {
            let (start, end) = (*range.start(), *range.end());
            if start <= count {
                kept.extend(start..=end.min(count));
            }
            if end > count {
                dropped.push(start.max(count.saturating_add(1))..=end);
            }
        }
        (kept, dropped)
    }
}

impl FromStr for Selection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        let mut invalid = Vec::new();

        for raw in s.split(',') {
            let token = raw.trim();
            match parse_token(token) {
                Some(range) => ranges.push(range),
                None => invalid.push(token.to_string()),
            }
        }

        if invalid.is_empty() {
            Ok(Self::from_ranges(ranges))
        } else {
            Err(SelectionError::InvalidTokens(invalid))
        }
    }
}

fn parse_token(token: &str) -> Option<RangeInclusive<usize>> {
    if let Some(n) = token.strip_prefix("<=") {
        return positive(n).map(|n| 1..=n);
    }
    if let Some((a, b)) = token.split_once('-') {
        let (a, b) = (positive(a)?, positive(b)?);
        return Some(a.min(b)..=a.max(b));
    }
    positive(token).map(|n| n..=n)
}

fn positive(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// `a-b` for a span, `a` for a single index, joined by commas.
pub(crate) fn describe(ranges: &[RangeInclusive<usize>]) -> String {
    ranges
        .iter()
        .map(|r| {
            if r.start() == r.end() {
                r.start().to_string()
            } else {
                format!("{}-{}", r.start(), r.end())
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(&self.ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(s: &str, count: usize) -> Vec<usize> {
        s.parse::<Selection>().unwrap().resolve(count).0
    }

    #[test]
    fn test_bare_integers() {
        assert_eq!(indices("3", 5), vec![3]);
        assert_eq!(indices("4, 1,4", 5), vec![1, 4]);
    }

    #[test]
    fn test_ranges_are_normalized() {
        assert_eq!(indices("2-4", 5), vec![2, 3, 4]);
        assert_eq!(indices("4-2", 5), vec![2, 3, 4]);
        assert_eq!(indices("3-3", 5), vec![3]);
    }

    #[test]
    fn test_at_most() {
        assert_eq!(indices("<=3", 5), vec![1, 2, 3]);
        assert_eq!(indices("<=2,4", 5), vec![1, 2, 4]);
        assert_eq!("<=3".parse::<Selection>().unwrap(), Selection::first(3));
    }

    #[test]
    fn test_overlapping_tokens_merge() {
        let selection: Selection = "5,<=2,3-4,9".parse().unwrap();
        assert_eq!(selection.ranges(), &[1..=5, 9..=9]);
        assert_eq!(selection.to_string(), "1-5,9");
    }

    #[test]
    fn test_huge_ranges_resolve_against_count() {
        let selection: Selection = "1-18446744073709551615".parse().unwrap();
        let (kept, dropped) = selection.resolve(3);
        assert_eq!(kept, vec![1, 2, 3]);
        assert_eq!(dropped, vec![4..=usize::MAX]);

        let (kept, dropped) = "<=99999999999".parse::<Selection>().unwrap().resolve(2);
        assert_eq!(kept, vec![1, 2]);
        assert_eq!(dropped, vec![3..=99_999_999_999]);
    }

    #[test]
    fn test_out_of_range_spans_are_reported_once() {
        let (kept, dropped) = "2,7-9,12".parse::<Selection>().unwrap().resolve(3);
        assert_eq!(kept, vec![2]);
        assert_eq!(dropped, vec![7..=9, 12..=12]);
        assert_eq!(describe(&dropped), "7-9,12");
    }

    #[test]
    fn test_invalid_tokens_are_reported_together() {
        let err = "1,a,0,2-x,<=0,-3".parse::<Selection>().unwrap_err();
        assert_eq!(
            err,
            SelectionError::InvalidTokens(vec![
                "a".to_string(),
                "0".to_string(),
                "2-x".to_string(),
                "<=0".to_string(),
                "-3".to_string(),
            ])
        );
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!("".parse::<Selection>().is_err());
        assert!("1,,2".parse::<Selection>().is_err());
    }
}
