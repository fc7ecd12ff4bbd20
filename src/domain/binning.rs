//! Gap-size bins over absolute gap percentage.
//!
//! Four contiguous half-open bins partition `[effective_min, ∞)`:
//! `[effective_min, 0.5)`, `[0.5, 1.0)`, `[1.0, 1.5)`, `[1.5, ∞)`, where
//! `effective_min = max(min_gap, 0.1)`. When `effective_min` lies above a nominal
//! edge, lower edges are clamped so the partition still starts at
//! `effective_min`; bins left with an empty range never receive events.

/// Number of bins in every table.
pub const BIN_COUNT: usize = 4;

/// Floor applied to the first bin's lower edge.
pub const MIN_BIN_EDGE: f64 = 0.1;

/// Label used for gaps that fall outside every bin.
pub const OTHER_LABEL: &str = "other";

const NOMINAL_EDGES: [f64; BIN_COUNT] = [0.0, 0.5, 1.0, 1.5];

#[derive(Debug, Clone, PartialEq)]
pub struct GapBin {
    pub min: f64,
    /// Exclusive upper edge; `f64::INFINITY` for the last bin.
    pub max: f64,
    pub label: String,
}

impl GapBin {
    pub fn contains(&self, abs_gap: f64) -> bool {
        abs_gap >= self.min && abs_gap < self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinTable {
    bins: [GapBin; BIN_COUNT],
}

impl BinTable {
    pub fn new(min_gap: f64) -> Self {
        let effective_min = min_gap.max(MIN_BIN_EDGE);
        let bins = std::array::from_fn(|i| {
            let nominal_lo = if i == 0 { effective_min } else { NOMINAL_EDGES[i] };
            let hi = NOMINAL_EDGES
                .get(i + 1)
                .copied()
                .unwrap_or(f64::INFINITY);
            let lo = nominal_lo.max(effective_min);
            if lo >= hi {
                // Entire range sits below the effective minimum. The first
                // bin still names the threshold it starts from.
                GapBin {
                    min: hi,
                    max: hi,
                    label: range_label(nominal_lo, hi),
                }
            } else {
                GapBin {
                    min: lo,
                    max: hi,
                    label: range_label(lo, hi),
                }
            }
        });
        Self { bins }
    }

    pub fn bins(&self) -> &[GapBin; BIN_COUNT] {
        &self.bins
    }

    pub fn effective_min(&self) -> f64 {
        self.bins
            .iter()
            .find(|b| b.min < b.max)
            .map(|b| b.min)
            .unwrap_or(MIN_BIN_EDGE)
    }

    /// Index of the bin containing `abs_gap`, or `None` for "other".
    pub fn classify(&self, abs_gap: f64) -> Option<usize> {
        self.bins.iter().position(|b| b.contains(abs_gap))
    }

    pub fn label(&self, bin: Option<usize>) -> &str {
        match bin.and_then(|i| self.bins.get(i)) {
            Some(b) => &b.label,
            None => OTHER_LABEL,
        }
    }
}

fn range_label(lo: f64, hi: f64) -> String {
    if hi.is_infinite() {
        format!(">{}%", format_edge(lo))
    } else {
        format!("{}–{}%", format_edge(lo), format_edge(hi))
    }
}

/// Formats a bin edge with at least one and at most three decimals.
fn format_edge(x: f64) -> String {
    let s = format!("{x:.3}");
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}
