//! Deterministic synthetic price histories for offline runs and demos.
//!
//! Bars are a seeded random walk; the seed is the BLAKE3 hash of the symbol,
//! so one symbol always produces the same history. These are not market data.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use etfscope_core::PriceBar;

/// `sessions` weekday bars starting at the first weekday on or after `start`.
pub fn synthetic_history(symbol: &str, start: NaiveDate, sessions: usize) -> Vec<PriceBar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut price: f64 = rng.gen_range(1.0..5.0);
    let drift: f64 = rng.gen_range(-0.0005..0.001);
    let base_volume: f64 = rng.gen_range(5e6..5e7);

    let mut bars = Vec::with_capacity(sessions);
    let mut day = start;
    while bars.len() < sessions {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day += Duration::days(1);
            continue;
        }

        let change = drift + rng.gen_range(-0.02..0.02);
        let open = price * (1.0 + rng.gen_range(-0.003..0.003));
        let close = (price * (1.0 + change)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = (base_volume * rng.gen_range(0.5..1.8)).round();

        bars.push(PriceBar {
            date: day,
            open: round3(open),
            high: round3(high),
            low: round3(low),
            close: round3(close),
            volume,
            amount: (volume * close).round(),
        });

        price = close;
        day += Duration::days(1);
    }

    tracing::debug!(symbol, sessions, "generated synthetic history");
    bars
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
