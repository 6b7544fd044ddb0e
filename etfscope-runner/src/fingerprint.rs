//! Content hashes of analysis inputs.

use etfscope_core::PriceBar;

/// BLAKE3 over every bar's date and values, in order.
///
/// Two reports with the same fingerprint were computed from identical bars.
pub fn input_fingerprint(bars: &[PriceBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume, bar.amount] {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::synthetic_history;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn identical_bars_share_fingerprint() {
        let a = synthetic_history("510300", start(), 60);
        let b = synthetic_history("510300", start(), 60);
        assert_eq!(input_fingerprint(&a), input_fingerprint(&b));
        assert_eq!(input_fingerprint(&a).len(), 64);
    }

    #[test]
    fn any_change_alters_fingerprint() {
        let a = synthetic_history("510300", start(), 60);
        let mut b = a.clone();
        b[30].volume += 1.0;
        assert_ne!(input_fingerprint(&a), input_fingerprint(&b));
        assert_ne!(input_fingerprint(&a), input_fingerprint(&a[..59]));
    }
}
