//! Price ranking.
//!
//! Orders scrape results by parsed price, highest first. Failed and
//! unparsable prices share [`UNPARSABLE`](crate::numeral::UNPARSABLE) and so
//! always land at the end. The sort is stable: equal prices keep their
//! input order.

use crate::models::PriceResult;

/// Rank `results` by price (descending) and keep at most `limit` entries.
///
/// The input is not modified.
pub fn rank(results: &[PriceResult], limit: Option<usize>) -> Vec<PriceResult> {
    let mut keyed: Vec<(f64, &PriceResult)> =
        results.iter().map(|r| (r.price.sort_value(), r)).collect();

    // Vec::sort_by is stable.
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));

    let take = limit.unwrap_or(keyed.len());
    keyed
        .into_iter()
        .take(take)
        .map(|(_, r)| r.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;

    fn ids(results: &[PriceResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending() {
        let results = vec![
            PriceResult::observed("a", 9, "1,000"),
            PriceResult::observed("b", 9, "2억"),
            PriceResult::observed("c", 9, "30,000"),
        ];
        let ranked = rank(&results, None);
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_failures_last() {
        let results = vec![
            PriceResult::failed("x", 9),
            PriceResult::observed("a", 9, "5"),
            PriceResult::observed("junk", 9, "N/A"),
            PriceResult::observed("b", 9, "0"),
        ];
        let ranked = rank(&results, None);
        assert_eq!(ids(&ranked), vec!["a", "b", "x", "junk"]);
    }

    #[test]
    fn test_rank_stable_on_ties() {
        let results = vec![
            PriceResult::observed("first", 9, "100"),
            PriceResult::observed("top", 9, "500"),
            PriceResult::observed("second", 9, "1백"),
            PriceResult::observed("third", 9, "100"),
        ];
        let ranked = rank(&results, None);
        assert_eq!(ids(&ranked), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_rank_limit() {
        let results = vec![
            PriceResult::observed("A", 9, "12,000"),
            PriceResult::failed("B", 9),
        ];
        let ranked = rank(&results, Some(1));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "A");
        assert_eq!(ranked[0].price, Price::Observed("12,000".to_string()));

        assert_eq!(rank(&results, Some(10)).len(), 2);
        assert!(rank(&results, Some(0)).is_empty());
    }

    #[test]
    fn test_rank_does_not_mutate_input() {
        let results = vec![
            PriceResult::observed("low", 9, "1"),
            PriceResult::observed("high", 9, "2"),
        ];
        let before = results.clone();
        let _ = rank(&results, None);
        assert_eq!(results, before);
    }

    #[test]
    fn test_rank_output_non_increasing() {
        let texts = ["3", "Error", "1만", "", "2,000", "만", "9천", "x", "10000"];
        let results: Vec<PriceResult> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| PriceResult::observed(i.to_string(), 10, *t))
            .collect();
        let ranked = rank(&results, Some(7));
        assert_eq!(ranked.len(), 7);
        for pair in ranked.windows(2) {
            assert!(pair[0].price.sort_value() >= pair[1].price.sort_value());
        }
    }
}
