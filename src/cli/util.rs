use ratatui::style::Color;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::funds::BucketKey;

/// Display-only metadata for a bucket. The domain model never sees this.
#[derive(Debug, Clone, Copy)]
pub struct BucketMeta {
    pub label: &'static str,
    pub icon: &'static str,
    pub color: Color,
}

pub fn bucket_meta(key: BucketKey) -> BucketMeta {
    let (label, icon, color) = match key {
        BucketKey::Necessity => ("Necessities", "🏠", Color::Rgb(79, 70, 229)),
        BucketKey::Education => ("Education", "🎓", Color::Rgb(249, 115, 22)),
        BucketKey::Enjoyment => ("Enjoyment", "🥳", Color::Rgb(244, 63, 94)),
        BucketKey::Investment => ("Investment", "📈", Color::Rgb(16, 185, 129)),
        BucketKey::Saving => ("Savings", "🏦", Color::Rgb(59, 130, 246)),
        BucketKey::Give => ("Giving", "🎁", Color::Rgb(168, 85, 247)),
    };
    BucketMeta { label, icon, color }
}

/// Formats an amount the way `vi-VN` money is written: `.` between
/// thousands, `,` before decimals, at most three decimals, `đ` suffix.
pub fn fmt_vnd(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out.push('đ');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(fmt_vnd(d("1000000")), "1.000.000đ");
        assert_eq!(fmt_vnd(d("550000")), "550.000đ");
        assert_eq!(fmt_vnd(d("999")), "999đ");
        assert_eq!(fmt_vnd(Decimal::ZERO), "0đ");
    }

    #[test]
    fn negatives_and_fractions() {
        assert_eq!(fmt_vnd(d("-120000")), "-120.000đ");
        assert_eq!(fmt_vnd(d("1234.5678")), "1.234,568đ");
        assert_eq!(fmt_vnd(d("0.0005")), "0,001đ");
        assert_eq!(fmt_vnd(d("-0.0001")), "0đ");
        assert_eq!(fmt_vnd(d("550000.000")), "550.000đ");
    }

    #[test]
    fn every_bucket_has_a_label() {
        for key in BucketKey::ALL {
            assert!(!bucket_meta(key).label.is_empty());
        }
    }
}
