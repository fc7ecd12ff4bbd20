//! Aggregation engine.
//!
//! Folds [`GapSample`]s into fixed-size accumulator tables keyed by bin,
//! gap side and weekday, plus running Fade/Follow totals. All values stay
//! unrounded here; rounding happens in [`crate::domain::report`].

use chrono::{NaiveDate, Weekday};
use serde::Serialize;

use super::binning::BIN_COUNT;
use super::gap_event::{Direction, GapSample};
use super::numeric::{mean, rate_pct};

/// Continuation rate above which following the gap is recommended.
pub const FOLLOW_THRESHOLD: f64 = 60.0;
/// Continuation rate below which fading the gap is recommended.
pub const FADE_THRESHOLD: f64 = 40.0;

/// Weekdays tracked by the weekday table, in table order.
pub const TRADING_WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Follow,
    Fade,
    Neutral,
}

impl Recommendation {
    /// Strict thresholds: exactly 60% or 40% is neutral.
    pub fn from_continuation_rate(rate: f64) -> Self {
        if rate > FOLLOW_THRESHOLD {
            Recommendation::Follow
        } else if rate < FADE_THRESHOLD {
            Recommendation::Fade
        } else {
            Recommendation::Neutral
        }
    }

    /// Picks the strategy with the strictly higher average return.
    pub fn best_of(fade_avg: f64, follow_avg: f64) -> Self {
        if follow_avg > fade_avg {
            Recommendation::Follow
        } else if fade_avg > follow_avg {
            Recommendation::Fade
        } else {
            Recommendation::Neutral
        }
    }
}

/// Running totals for one group of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    pub count: usize,
    pub continuations: usize,
    pub fills: usize,
    pub fade_sum: f64,
    pub follow_sum: f64,
}

impl Accumulator {
    pub fn add(&mut self, sample: &GapSample) {
        self.count += 1;
        if sample.continuation {
            self.continuations += 1;
        }
        if sample.gap_filled {
            self.fills += 1;
        }
        self.fade_sum += sample.fade_return();
        self.follow_sum += sample.follow_return();
    }

    pub fn continuation_rate(&self) -> f64 {
        rate_pct(self.continuations, self.count)
    }

    pub fn fill_rate(&self) -> f64 {
        rate_pct(self.fills, self.count)
    }

    pub fn fade_avg(&self) -> f64 {
        mean(self.fade_sum, self.count)
    }

    pub fn follow_avg(&self) -> f64 {
        mean(self.follow_sum, self.count)
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_continuation_rate(self.continuation_rate())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Up,
    Down,
}

impl Side {
    pub fn of(direction: Direction) -> Option<Self> {
        match direction {
            Direction::Up => Some(Side::Up),
            Direction::Down => Some(Side::Down),
            Direction::Flat => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Up => 0,
            Side::Down => 1,
        }
    }
}

fn weekday_index(day: Weekday) -> Option<usize> {
    let i = day.num_days_from_monday() as usize;
    (i < TRADING_WEEKDAYS.len()).then_some(i)
}

/// Parallel running sums, one entry per sample in fold order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CumulativeSeries {
    pub dates: Vec<NaiveDate>,
    pub fade: Vec<f64>,
    pub follow: Vec<f64>,
}

impl CumulativeSeries {
    fn push(&mut self, date: NaiveDate, fade_total: f64, follow_total: f64) {
        self.dates.push(date);
        self.fade.push(fade_total);
        self.follow.push(follow_total);
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Headline statistics derived from a [`GapStats`] fold.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sessions: usize,
    pub continuation_rate: f64,
    pub gap_ups: usize,
    pub gap_downs: usize,
    pub mean_gap: f64,
    pub max_gap_up: f64,
    pub max_gap_down: f64,
    pub fade_avg: f64,
    pub follow_avg: f64,
    pub best_strategy: Recommendation,
    pub expected_return: f64,
}

/// Result of folding a sample stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapStats {
    pub total: Accumulator,
    pub abs_gap_sum: f64,
    pub max_gap_up: f64,
    pub max_gap_down: f64,
    pub bins: [Accumulator; BIN_COUNT],
    pub sides: [Accumulator; 2],
    pub weekdays: [Accumulator; 5],
    /// Samples that fell outside every bin.
    pub unbinned: usize,
    pub cumulative: CumulativeSeries,
}

impl GapStats {
    pub fn fold<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = GapSample>,
    {
        let mut stats = GapStats::default();
        for sample in samples {
            stats.push(&sample);
        }
        stats
    }

    pub fn push(&mut self, sample: &GapSample) {
        self.total.add(sample);
        self.abs_gap_sum += sample.gap_pct.abs();
        if sample.gap_pct > self.max_gap_up {
            self.max_gap_up = sample.gap_pct;
        }
        if sample.gap_pct < self.max_gap_down {
            self.max_gap_down = sample.gap_pct;
        }

        match sample.bin.and_then(|i| self.bins.get_mut(i)) {
            Some(acc) => acc.add(sample),
            None => self.unbinned += 1,
        }
        if let Some(side) = Side::of(sample.direction) {
            self.sides[side.index()].add(sample);
        }
        if let Some(i) = weekday_index(sample.weekday) {
            self.weekdays[i].add(sample);
        }

        self.cumulative
            .push(sample.date, self.total.fade_sum, self.total.follow_sum);
    }

    pub fn side(&self, side: Side) -> &Accumulator {
        &self.sides[side.index()]
    }

    /// Weekday accumulators paired with their day, Monday first.
    pub fn by_weekday(&self) -> impl Iterator<Item = (Weekday, &Accumulator)> {
        TRADING_WEEKDAYS.iter().copied().zip(self.weekdays.iter())
    }

    pub fn summary(&self) -> Summary {
        let fade_avg = self.total.fade_avg();
        let follow_avg = self.total.follow_avg();
        let best_strategy = Recommendation::best_of(fade_avg, follow_avg);
        let expected_return = match best_strategy {
            Recommendation::Follow => follow_avg,
            Recommendation::Fade => fade_avg,
            Recommendation::Neutral => 0.0,
        };

        Summary {
            sessions: self.total.count,
            continuation_rate: self.total.continuation_rate(),
            gap_ups: self.side(Side::Up).count,
            gap_downs: self.side(Side::Down).count,
            mean_gap: mean(self.abs_gap_sum, self.total.count),
            max_gap_up: self.max_gap_up,
            max_gap_down: self.max_gap_down,
            fade_avg,
            follow_avg,
            best_strategy,
            expected_return,
        }
    }
}
