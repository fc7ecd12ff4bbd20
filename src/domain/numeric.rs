//! Shared numeric helpers: signs, percentage moves, guarded division and
//! display rounding.

/// -1, 0 or +1.
pub fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// `(to - from) / from * 100`. Callers guarantee `from > 0`.
pub fn pct_move(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub fn rate_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `sum / n`, or 0 when `n` is zero.
pub fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { sum / n as f64 }
}

pub fn round1(x: f64) -> f64 {
    round_dp(x, 10.0)
}

pub fn round2(x: f64) -> f64 {
    round_dp(x, 100.0)
}

pub fn round3(x: f64) -> f64 {
    round_dp(x, 1_000.0)
}

// Half away from zero, then normalise -0.0 so serialized output never shows "-0.0".
fn round_dp(x: f64, scale: f64) -> f64 {
    let r = (x * scale).round() / scale;
    if r == 0.0 { 0.0 } else { r }
}
