//! Two time representations, per the split drawn in `spec.md` §3 between a
//! task's (always integer) input parameters and the (generally fractional,
//! once EDF-VD deadline shortening is applied) quantities the runtime
//! computes from them.

use ordered_float::OrderedFloat;

/// A task's phase, period, (actual) deadline or per-level WCET, exactly as
/// given in the input file — always a non-negative integer.
#[derive(Clone, Copy, Default)]
#[derive(Debug)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub fn zero() -> Self {
        Self(0)
    }

    /// Ceiling division, used for next-release-instance computation
    /// (`spec.md` §4.5/§4.6 — the redesign note's "integer arithmetic
    /// wherever phases and periods are integers").
    pub fn div_ceil(self, rhs: Self) -> u64 {
        self.0.div_ceil(rhs.0)
    }
}

impl std::ops::Add for Tick {
    type Output = Tick;
    fn add(self, rhs: Self) -> Self::Output { Self(self.0 + rhs.0) }
}

impl std::ops::Sub for Tick {
    type Output = Tick;
    fn sub(self, rhs: Self) -> Self::Output { Self(self.0 - rhs.0) }
}

impl std::ops::Mul<u64> for Tick {
    type Output = Tick;
    fn mul(self, rhs: u64) -> Self::Output { Self(self.0 * rhs) }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Tick> for VTime {
    fn from(value: Tick) -> Self {
        VTime::new(value.0 as f64)
    }
}

/// A virtual deadline, scheduling deadline, remaining budget, slack value or
/// simulation `timecount` — fractional once a deadline-shortening factor `x`
/// has been applied, so it needs a total order the way `OrderedFloat` gives
/// `RTUtils::largest_utilization` one in the teacher crate.
#[derive(Clone, Copy, Default)]
#[derive(Debug)]
#[derive(PartialEq, Eq, PartialOrd, Ord)]
pub struct VTime(OrderedFloat<f64>);

impl VTime {
    pub fn new(value: f64) -> Self {
        Self(OrderedFloat(value))
    }

    pub fn zero() -> Self {
        Self::new(0.0)
    }

    pub fn as_f64(&self) -> f64 {
        self.0.into_inner()
    }

    pub fn min(a: Self, b: Self) -> Self {
        if a <= b { a } else { b }
    }

    pub fn max(a: Self, b: Self) -> Self {
        if a >= b { a } else { b }
    }
}

impl std::ops::Add for VTime {
    type Output = VTime;
    fn add(self, rhs: Self) -> Self::Output { VTime::new(self.as_f64() + rhs.as_f64()) }
}

impl std::ops::Sub for VTime {
    type Output = VTime;
    fn sub(self, rhs: Self) -> Self::Output { VTime::new(self.as_f64() - rhs.as_f64()) }
}

impl std::ops::Mul<f64> for VTime {
    type Output = VTime;
    fn mul(self, rhs: f64) -> Self::Output { VTime::new(self.as_f64() * rhs) }
}

impl std::ops::Mul<VTime> for f64 {
    type Output = VTime;
    fn mul(self, rhs: VTime) -> Self::Output { rhs * self }
}

impl std::ops::Div<f64> for VTime {
    type Output = VTime;
    fn div(self, rhs: f64) -> Self::Output { VTime::new(self.as_f64() / rhs) }
}

impl std::ops::Div for VTime {
    type Output = f64;
    fn div(self, rhs: Self) -> Self::Output { self.as_f64() / rhs.as_f64() }
}

impl std::iter::Sum for VTime {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VTime::zero(), |acc, val| acc + val)
    }
}

impl std::fmt::Display for VTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.as_f64())
    }
}

#[test]
fn tick_ceil_div_matches_next_instance_formula() {
    // phase 0, period 10, now=9 (+granularity folded in by caller) -> instance 1
    assert_eq!(Tick(10).div_ceil(Tick(10)), 1);
    assert_eq!(Tick(11).div_ceil(Tick(10)), 2);
    assert_eq!(Tick(0).div_ceil(Tick(10)), 0);
}

#[test]
fn vtime_total_order_for_sorting() {
    let mut values = vec![VTime::new(3.5), VTime::new(1.0), VTime::new(2.25)];
    values.sort();
    assert_eq!(values, vec![VTime::new(1.0), VTime::new(2.25), VTime::new(3.5)]);
}
