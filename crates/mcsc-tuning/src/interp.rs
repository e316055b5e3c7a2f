//! Piecewise-linear noise-index interpolation
//!
//! Tuning tables hold factor vectors at a handful of reference noise
//! indexes. A frame's noise index selects the bracketing pair of entries and
//! every numeric field is interpolated in 12-bit fixed point. Mode and
//! on/off fields are taken from the closer endpoint instead.

/// Fractional bits of the interpolation domain
pub const INTERPOLATE_SHIFT: u32 = 12;

/// Scale between table noise indexes and frame noise indexes
pub const NI_MULTIPLIER: u32 = 10;

/// Table noise index in the frame's scale
#[inline]
pub fn multiplied_ni(ni: u32) -> u32 {
    ni.saturating_mul(NI_MULTIPLIER)
}

/// Convert a fixed-point value back to integer scale
#[inline]
pub fn restore(value: i64) -> i64 {
    value >> INTERPOLATE_SHIFT
}

/// Pair of table entries around a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    pub bottom: usize,
    pub top: usize,
}

impl Bracket {
    pub fn single(index: usize) -> Self {
        Self {
            bottom: index,
            top: index,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.bottom == self.top
    }
}

/// Find the entries bracketing `query`.
///
/// `indexes` are table noise indexes (unscaled, non-decreasing) and `query`
/// is in frame scale. Queries outside the table clamp to the first or last
/// entry. Returns `None` for an empty table.
pub fn find_bracket(indexes: &[u32], query: u32) -> Option<Bracket> {
    let last = indexes.len().checked_sub(1)?;

    if query <= multiplied_ni(indexes[0]) {
        return Some(Bracket::single(0));
    }
    if query >= multiplied_ni(indexes[last]) {
        return Some(Bracket::single(last));
    }

    for i in 0..last {
        let bottom = multiplied_ni(indexes[i]);
        let top = multiplied_ni(indexes[i + 1]);

        if query == bottom {
            return Some(Bracket::single(i));
        } else if query == top {
            return Some(Bracket::single(i + 1));
        } else if query > bottom && query < top {
            return Some(Bracket { bottom: i, top: i + 1 });
        }
    }

    // Unsorted table; stay on the last entry
    Some(Bracket::single(last))
}

/// Interpolation position between two reference noise indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lerp {
    x1: i64,
    x2: i64,
    x: i64,
}

impl Lerp {
    /// `x1`/`x2` are unscaled table indexes, `x` the frame noise index
    pub fn new(x1: u32, x2: u32, x: u32) -> Self {
        Self {
            x1: multiplied_ni(x1) as i64,
            x2: multiplied_ni(x2) as i64,
            x: x as i64,
        }
    }

    /// Interpolated value in fixed point
    pub fn shifted(&self, y1: i32, y2: i32) -> i64 {
        let dx = (self.x2 - self.x1).abs();
        let y1 = y1 as i64;
        if dx == 0 {
            return y1 << INTERPOLATE_SHIFT;
        }
        let num = (y2 as i64 - y1) * (self.x - self.x1).abs();
        (num << INTERPOLATE_SHIFT) / dx + (y1 << INTERPOLATE_SHIFT)
    }

    /// Interpolated value in integer scale
    pub fn value(&self, y1: i32, y2: i32) -> i32 {
        restore(self.shifted(y1, y2)) as i32
    }

    pub fn value_u32(&self, y1: u32, y2: u32) -> u32 {
        self.value(y1 as i32, y2 as i32).max(0) as u32
    }

    pub fn values<const N: usize>(&self, y1: &[i32; N], y2: &[i32; N]) -> [i32; N] {
        std::array::from_fn(|i| self.value(y1[i], y2[i]))
    }

    pub fn values_u32<const N: usize>(&self, y1: &[u32; N], y2: &[u32; N]) -> [u32; N] {
        std::array::from_fn(|i| self.value_u32(y1[i], y2[i]))
    }

    /// Value of a non-interpolated field: the closer endpoint wins, ties go to the bottom
    pub fn pick<T: Copy>(&self, bottom: T, top: T) -> T {
        let to_bottom = (self.x - self.x1).abs();
        let to_top = (self.x2 - self.x).abs();
        if to_top < to_bottom {
            top
        } else {
            bottom
        }
    }
}

/// A factor vector stored at one reference noise index
pub trait NoiseFactors {
    /// Result of interpolating two vectors
    type Output;

    /// Unscaled reference noise index of this entry
    fn noise_index(&self) -> u32;

    fn interpolate(bottom: &Self, top: &Self, lerp: &Lerp) -> Self::Output;
}

/// Resolve a table at a frame noise index
pub fn resolve<F: NoiseFactors>(table: &[F], query: u32) -> Option<F::Output> {
    let indexes: Vec<u32> = table.iter().map(NoiseFactors::noise_index).collect();
    let bracket = find_bracket(&indexes, query)?;
    let bottom = &table[bracket.bottom];
    let top = &table[bracket.top];
    let lerp = Lerp::new(bottom.noise_index(), top.noise_index(), query);
    Some(F::interpolate(bottom, top, &lerp))
}

/// Last noise index applied to a sub-block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NiCache {
    applied: Option<u32>,
}

impl NiCache {
    /// True when `ni` differs from the last applied value
    pub fn is_stale(&self, ni: u32) -> bool {
        self.applied != Some(ni)
    }

    pub fn commit(&mut self, ni: u32) {
        self.applied = Some(ni);
    }

    pub fn invalidate(&mut self) {
        self.applied = None;
    }

    pub fn applied(&self) -> Option<u32> {
        self.applied
    }
}
