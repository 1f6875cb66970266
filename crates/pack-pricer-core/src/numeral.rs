//! Price text → number conversion.
//!
//! The target page renders prices as a mix of ASCII digits, `,` thousands
//! separators, and Korean numeral words (`2,530억`, `1조 2,000억`,
//! `삼천만`). [`parse`] folds all of these into a plain magnitude.
//!
//! # Grammar
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `0-9`, `.` | digit run (decimal allowed) |
//! | `,`, whitespace | ignored |
//! | `영 공 일 이 삼 사 오 육 칠 팔 구` | single digit 0–9 |
//! | `십 백 천` | small unit, multiplies the pending number (default 1) |
//! | `만 억 조 경` | large unit, multiplies everything since the last large unit |
//!
//! Anything else makes the text unparsable. Unparsable text, including the
//! failure sentinel, ranks at [`UNPARSABLE`].

/// Ordering value of text that is not a number. Sorts below every price.
pub const UNPARSABLE: f64 = f64::NEG_INFINITY;

fn digit_word(c: char) -> Option<f64> {
    let d = match c {
        '영' | '공' => 0.0,
        '일' => 1.0,
        '이' => 2.0,
        '삼' => 3.0,
        '사' => 4.0,
        '오' => 5.0,
        '육' => 6.0,
        '칠' => 7.0,
        '팔' => 8.0,
        '구' => 9.0,
        _ => return None,
    };
    Some(d)
}

fn small_unit(c: char) -> Option<f64> {
    match c {
        '십' => Some(10.0),
        '백' => Some(100.0),
        '천' => Some(1_000.0),
        _ => None,
    }
}

fn large_unit(c: char) -> Option<f64> {
    match c {
        '만' => Some(1e4),
        '억' => Some(1e8),
        '조' => Some(1e12),
        '경' => Some(1e16),
        _ => None,
    }
}

#[derive(Default)]
struct Accumulator {
    /// Sum of closed large-unit groups.
    total: f64,
    /// Value built from small units since the last large unit.
    section: f64,
    /// Number not yet multiplied by any unit.
    pending: Option<f64>,
    digits: String,
    seen: bool,
}

impl Accumulator {
    fn flush_digits(&mut self) -> Option<()> {
        if self.digits.is_empty() {
            return Some(());
        }
        let value: f64 = self.digits.parse().ok()?;
        self.digits.clear();
        self.set_pending(value)
    }

    fn set_pending(&mut self, value: f64) -> Option<()> {
        if self.pending.is_some() {
            return None;
        }
        self.pending = Some(value);
        self.seen = true;
        Some(())
    }

    fn apply_small(&mut self, unit: f64) {
        self.section += self.pending.take().unwrap_or(1.0) * unit;
        self.seen = true;
    }

    fn apply_large(&mut self, unit: f64) {
        let group = match self.pending.take() {
            Some(n) => self.section + n,
            None if self.section == 0.0 => 1.0,
            None => self.section,
        };
        self.total += group * unit;
        self.section = 0.0;
        self.seen = true;
    }

    fn finish(mut self) -> Option<f64> {
        self.flush_digits()?;
        if !self.seen {
            return None;
        }
        let value = self.total + self.section + self.pending.unwrap_or(0.0);
        value.is_finite().then_some(value)
    }
}

/// Parse price text into a magnitude, or `None` when it is not a number.
pub fn parse(text: &str) -> Option<f64> {
    let mut acc = Accumulator::default();

    for c in text.chars() {
        if c.is_ascii_digit() || c == '.' {
            acc.digits.push(c);
            continue;
        }
        if c == ',' || c.is_whitespace() {
            continue;
        }

        acc.flush_digits()?;
        if let Some(d) = digit_word(c) {
            acc.set_pending(d)?;
        } else if let Some(unit) = small_unit(c) {
            acc.apply_small(unit);
        } else if let Some(unit) = large_unit(c) {
            acc.apply_large(unit);
        } else {
            return None;
        }
    }

    acc.finish()
}

/// Parsed value, or [`UNPARSABLE`] when the text is not a number.
pub fn sort_value(text: &str) -> f64 {
    parse(text).unwrap_or(UNPARSABLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_separated_digits() {
        assert_eq!(parse("12000"), Some(12_000.0));
        assert_eq!(parse("12,000"), Some(12_000.0));
        assert_eq!(parse("12,000,000"), Some(12_000_000.0));
        assert_eq!(parse(" 7 "), Some(7.0));
    }

    #[test]
    fn test_large_units_with_digits() {
        assert_eq!(parse("2,530억"), Some(253_000_000_000.0));
        assert_eq!(parse("1조 2,000억"), Some(1_200_000_000_000.0));
        assert_eq!(parse("1.5억"), Some(150_000_000.0));
        assert_eq!(parse("3만 5000"), Some(35_000.0));
    }

    #[test]
    fn test_korean_words() {
        assert_eq!(parse("삼천"), Some(3_000.0));
        assert_eq!(parse("일억이천만"), Some(120_000_000.0));
        assert_eq!(parse("1억 2천만"), Some(120_000_000.0));
        assert_eq!(parse("만"), Some(10_000.0));
        assert_eq!(parse("십오"), Some(15.0));
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(parse("Error"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse(","), None);
        assert_eq!(parse("1.2.3"), None);
        assert_eq!(parse("12 BP"), None);
        assert_eq!(parse("3삼"), None);
    }

    #[test]
    fn test_sort_value_is_deterministic() {
        assert_eq!(sort_value("Error"), UNPARSABLE);
        assert_eq!(sort_value("Error"), sort_value("Error"));
        assert_eq!(sort_value("9,999"), 9_999.0);
        assert!(sort_value("0") > UNPARSABLE);
    }
}
