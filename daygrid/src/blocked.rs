//! Chunk-aligned groupby and resample.
//!
//! Grouping a chunked time series by day-of-year scatters every group
//! across every chunk, so a gather-per-group groupby builds a task graph
//! proportional to chunk count times group count. Realigning the chunks
//! first (one chunk per calendar year for grouping, whole blocks per chunk
//! for resampling) lets every group be served from within a chunk, keeping
//! the graph a small constant factor of the year count.

use std::{
    ops::{Add, Sub},
    sync::Arc,
};

use chrono::{Datelike, NaiveDate};
use log::debug;
use ndarray::{ArrayD, Axis, Slice};

use crate::{
    chunked::ChunkedArray,
    chunks::Chunks,
    dataarray::{Coord, CoordValues, DataArray},
    errors::{Error, Result},
    groupby::key_rows,
    rank::rank_values,
    stats::Reduction,
    time::TimeAxis,
};

/// Slots in the full (leap year) calendar.
pub(crate) const CALENDAR_SLOTS: usize = 366;

/// How timestamps are assigned to calendar groups.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    /// Ordinal day within the year, 1..=366. Buckets follow the ordinal
    /// count, so after Feb 28 a leap year's dates sit one bucket later
    /// than a non-leap year's, and Dec 31 of a leap year lands in 366.
    DayOfYear,

    /// Calendar date encoded `month * 100 + day`. Feb 29 keeps its own
    /// bucket (229) in every year that has one.
    MonthDay,
}

impl Grouping {
    /// Dimension name carried by grouped outputs.
    ///
    pub fn dim_name(&self) -> &'static str {
        match self {
            Self::DayOfYear => "dayofyear",
            Self::MonthDay => "monthday",
        }
    }

    /// Group key for every timestamp on the axis.
    ///
    pub(crate) fn keys_for(&self, axis: &TimeAxis) -> Vec<i64> {
        match self {
            Self::DayOfYear => axis.dayofyear(),
            Self::MonthDay => axis.monthday(),
        }
    }

    /// The 366 group keys of the full calendar, in increasing order.
    ///
    pub(crate) fn calendar_keys(&self) -> Vec<i64> {
        match self {
            Self::DayOfYear => (1..=CALENDAR_SLOTS as i64).collect(),
            Self::MonthDay => (1..=CALENDAR_SLOTS as u32)
                .map(|ordinal| {
                    // Any leap year covers the full calendar
                    let date = NaiveDate::from_yo_opt(2000, ordinal).unwrap();
                    (date.month() * 100 + date.day()) as i64
                })
                .collect(),
        }
    }

    /// Calendar slot of a row within a year of `year_len` days.
    ///
    /// A 365 day year leaves one slot empty: the last one for day-of-year
    /// grouping, the Feb 29 slot for month-day grouping.
    ///
    fn slot_of_row(&self, row: usize, year_len: usize) -> usize {
        match self {
            Self::DayOfYear => row,
            Self::MonthDay => {
                if year_len == CALENDAR_SLOTS || row < 59 {
                    row
                } else {
                    row + 1
                }
            }
        }
    }
}

/// Spread one year of daily data over the 366-slot calendar, leaving NaN
/// in the slot a non-leap year lacks.
///
fn expand_year(grouping: Grouping, chunk: &ArrayD<f64>) -> ArrayD<f64> {
    let length = chunk.shape()[0];
    let mut shape = chunk.shape().to_vec();
    shape[0] = CALENDAR_SLOTS;
    let mut slots = ArrayD::from_elem(shape, f64::NAN);

    if length == CALENDAR_SLOTS {
        slots.assign(chunk);
    } else {
        match grouping {
            Grouping::DayOfYear => {
                slots
                    .slice_axis_mut(Axis(0), Slice::from(0..length))
                    .assign(chunk);
            }
            Grouping::MonthDay => {
                slots
                    .slice_axis_mut(Axis(0), Slice::from(0..59))
                    .assign(&chunk.slice_axis(Axis(0), Slice::from(0..59)));
                slots
                    .slice_axis_mut(Axis(0), Slice::from(60..CALENDAR_SLOTS))
                    .assign(&chunk.slice_axis(Axis(0), Slice::from(59..length)));
            }
        }
    }

    slots
}

/// Group a chunked time series by calendar period, realigning chunks to
/// year boundaries first.
///
/// The named dimension must carry a time coordinate and be the leading
/// axis; the axis must be daily with no gaps and span whole calendar
/// years.
///
pub fn blocked_groupby(
    array: &DataArray,
    dim: &str,
    grouping: Grouping,
) -> Result<BlockedGroupby> {
    let axis = array.time_axis(dim)?;
    if array.axis_of(dim) != Some(0) {
        return Err(Error::NotLeadingAxis(dim.to_owned()));
    }

    let years = axis.year_chunks()?;
    debug!(
        "regrouping {} instants from {} chunks into {} year chunks",
        axis.len(),
        array.chunk_count(),
        years.len()
    );

    let data = array.data().rechunk(Chunks::from_lengths(years.clone()));

    Ok(BlockedGroupby {
        array: array.with_data(data),
        dim: dim.to_owned(),
        grouping,
        years,
    })
}

/// A deferred calendar groupby bound to a year-aligned array.
///
/// Reductions return one entry per calendar slot, in increasing key
/// order; nothing is computed until a reduction is invoked.
///
pub struct BlockedGroupby {
    array: DataArray,
    dim: String,
    grouping: Grouping,
    /// Days in each calendar year of the span.
    years: Vec<usize>,
}

impl BlockedGroupby {
    pub fn min(&self) -> DataArray {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> DataArray {
        self.reduce(Reduction::Max)
    }

    pub fn mean(&self) -> DataArray {
        self.reduce(Reduction::Mean)
    }

    pub fn sum(&self) -> DataArray {
        self.reduce(Reduction::Sum)
    }

    /// Per-group, per-grid-point percentile, `q` in 0..=100.
    ///
    /// # Panics
    ///
    /// When `q` is outside 0..=100.
    ///
    pub fn percentile(&self, q: f64) -> DataArray {
        assert!((0.0..=100.0).contains(&q), "percentile {q} outside 0..=100");
        self.reduce(Reduction::Percentile(q))
    }

    /// Rank each value against the other years sharing its calendar slot.
    /// Not a reduction: the result has the input's shape and time axis.
    ///
    pub fn rank(&self) -> DataArray {
        let stacked = self.stacked();
        let ranked = stacked.map(
            stacked.shape().to_vec(),
            stacked.chunks().clone(),
            Arc::new(|_, block: &ArrayD<f64>| rank_values(block, Axis(0))),
        );

        self.array.with_data(self.unstack(&ranked))
    }

    /// Apply an arbitrary function to the stacked years-by-calendar block.
    ///
    /// A result with the block's shape is scattered back to the input's
    /// time ordering; a result with the years axis reduced away is
    /// returned indexed by group key. Anything else is a shape error.
    ///
    pub fn apply<F>(&self, f: F) -> Result<DataArray>
    where
        F: Fn(&ArrayD<f64>) -> ArrayD<f64>,
    {
        let stacked = self.stacked();
        let block = stacked.compute();
        let result = f(&block);

        if result.shape() == block.shape() {
            let wrapped = ChunkedArray::from_array(result);
            return Ok(self.array.with_data(self.unstack(&wrapped)));
        }
        if result.shape() == &block.shape()[1..] {
            return Ok(self.keyed(ChunkedArray::from_array(result)));
        }

        Err(Error::ShapeMismatch {
            expected: block.shape().to_vec(),
            found: result.shape().to_vec(),
        })
    }

    /// The years-by-calendar block: each year chunk spread over 366 slots,
    /// stacked along a new leading axis.
    ///
    fn stacked(&self) -> ChunkedArray {
        let data = self.array.data();
        let years = data.chunk_count();
        let mut shape = data.shape().to_vec();
        shape[0] = years * CALENDAR_SLOTS;

        let grouping = self.grouping;
        let expanded = data.map(
            shape,
            Chunks::from_lengths(vec![CALENDAR_SLOTS; years]),
            Arc::new(move |_, chunk: &ArrayD<f64>| expand_year(grouping, chunk)),
        );

        expanded.stack_chunks()
    }

    /// Undo [`Self::stacked`]: pick each timestamp's slot back out of the
    /// block and restore the original time ordering and chunking.
    ///
    fn unstack(&self, stacked: &ChunkedArray) -> ChunkedArray {
        let years = self.years.clone();
        let grouping = self.grouping;
        let total: usize = years.iter().sum();

        let mut shape = stacked.shape()[2..].to_vec();
        shape.insert(0, total);

        let flat = stacked.map(
            shape.clone(),
            Chunks::single(total),
            Arc::new(move |_, block: &ArrayD<f64>| {
                let mut out_shape = block.shape()[2..].to_vec();
                out_shape.insert(0, total);
                let mut out = ArrayD::zeros(out_shape);

                let mut at = 0;
                for (year, &length) in years.iter().enumerate() {
                    let slots = block.index_axis(Axis(0), year);
                    for row in 0..length {
                        let slot = grouping.slot_of_row(row, length);
                        out.index_axis_mut(Axis(0), at)
                            .assign(&slots.index_axis(Axis(0), slot));
                        at += 1;
                    }
                }

                out
            }),
        );

        flat.rechunk(Chunks::from_lengths(self.years.clone()))
    }

    fn reduce(&self, reduction: Reduction) -> DataArray {
        let stacked = self.stacked();
        let shape = stacked.shape()[1..].to_vec();

        let reduced = stacked.map(
            shape,
            Chunks::single(CALENDAR_SLOTS),
            Arc::new(move |_, block: &ArrayD<f64>| {
                block.map_axis(Axis(0), |lane| reduction.reduce(lane.iter().copied()))
            }),
        );

        self.keyed(reduced)
    }

    /// Wrap a per-slot result as a labeled array indexed by group key.
    ///
    fn keyed(&self, data: ChunkedArray) -> DataArray {
        let mut dims = vec![self.grouping.dim_name().to_owned()];
        dims.extend_from_slice(&self.array.dims()[1..]);

        let mut coords = vec![Coord {
            name: self.grouping.dim_name().to_owned(),
            values: CoordValues::Keys(self.grouping.calendar_keys()),
        }];
        coords.extend(self.array.coords_except(&self.dim));

        DataArray::rebuild(
            self.array.name().to_owned(),
            dims,
            coords,
            self.array.attrs().clone(),
            data,
        )
    }

    /// Broadcast a per-group operand back over every timestamp of its
    /// group and combine.
    ///
    fn combine(&self, grouped: &DataArray, f: fn(f64, f64) -> f64) -> DataArray {
        let lookup = key_rows(grouped);
        let calendar = self.grouping.calendar_keys();

        let mut rows = Vec::with_capacity(self.years.iter().sum());
        for &length in &self.years {
            for row in 0..length {
                let key = calendar[self.grouping.slot_of_row(row, length)];
                rows.push(*lookup.get(&key).unwrap_or_else(|| {
                    panic!("Operand has no entry for key {key}")
                }));
            }
        }

        self.array.combine_rows(grouped.values(), rows, f)
    }
}

impl Sub<&DataArray> for &BlockedGroupby {
    type Output = DataArray;

    /// Subtract a per-group array, e.g. a climatology, from every
    /// timestamp of its group.
    ///
    fn sub(self, grouped: &DataArray) -> DataArray {
        self.combine(grouped, |a, b| a - b)
    }
}

impl Add<&DataArray> for &BlockedGroupby {
    type Output = DataArray;

    fn add(self, grouped: &DataArray) -> DataArray {
        self.combine(grouped, |a, b| a + b)
    }
}

/// Aggregate a regularly spaced axis in consecutive blocks of `samples`,
/// realigning chunk boundaries to block boundaries first.
///
/// The named dimension must carry a time coordinate and be the leading
/// axis; the axis must be evenly spaced and `samples` must divide its
/// length.
///
pub fn blocked_resample(
    array: &DataArray,
    dim: &str,
    samples: usize,
) -> Result<BlockedResample> {
    let axis = array.time_axis(dim)?;
    if array.axis_of(dim) != Some(0) {
        return Err(Error::NotLeadingAxis(dim.to_owned()));
    }
    if axis.step().is_none() {
        return Err(Error::IrregularAxis(
            "timestamps are not evenly spaced".into(),
        ));
    }

    let length = array.shape()[0];
    if samples == 0 || length % samples != 0 {
        return Err(Error::UnevenSamples { samples, length });
    }

    let plan = align_to_blocks(array.data().chunks(), samples);
    debug!(
        "aligning {} chunks to {} chunks of whole {samples}-sample blocks",
        array.chunk_count(),
        plan.count()
    );

    Ok(BlockedResample {
        array: array.with_data(array.data().rechunk(plan)),
        dim: dim.to_owned(),
        samples,
    })
}

/// The chunk plan nearest to `chunks` whose boundaries all fall on
/// multiples of `samples`.
///
fn align_to_blocks(chunks: &Chunks, samples: usize) -> Chunks {
    let total = chunks.total();
    let mut lengths = vec![];
    let mut start = 0;
    for chunk in 0..chunks.count() - 1 {
        let end = chunks.range(chunk).end;
        let aligned = (end + samples / 2) / samples * samples;
        if aligned > start && aligned < total {
            lengths.push(aligned - start);
            start = aligned;
        }
    }
    lengths.push(total - start);

    Chunks::from_lengths(lengths)
}

/// A deferred block resample bound to a block-aligned array.
///
pub struct BlockedResample {
    array: DataArray,
    dim: String,
    samples: usize,
}

impl BlockedResample {
    pub fn min(&self) -> DataArray {
        self.reduce(Reduction::Min)
    }

    pub fn max(&self) -> DataArray {
        self.reduce(Reduction::Max)
    }

    pub fn mean(&self) -> DataArray {
        self.reduce(Reduction::Mean)
    }

    pub fn sum(&self) -> DataArray {
        self.reduce(Reduction::Sum)
    }

    fn reduce(&self, reduction: Reduction) -> DataArray {
        let samples = self.samples;
        let data = self.array.data();

        let mut shape = data.shape().to_vec();
        shape[0] /= samples;
        let plan = Chunks::from_lengths(
            data.chunks()
                .lengths()
                .iter()
                .map(|length| length / samples)
                .collect(),
        );

        let reduced = data.map(
            shape,
            plan,
            Arc::new(move |_, chunk: &ArrayD<f64>| {
                let blocks = chunk.shape()[0] / samples;
                let mut out_shape = chunk.shape().to_vec();
                out_shape[0] = blocks;
                let mut out = ArrayD::zeros(out_shape);
                for block in 0..blocks {
                    let window = chunk.slice_axis(
                        Axis(0),
                        Slice::from(block * samples..(block + 1) * samples),
                    );
                    out.index_axis_mut(Axis(0), block).assign(
                        &window
                            .map_axis(Axis(0), |lane| reduction.reduce(lane.iter().copied())),
                    );
                }

                out
            }),
        );

        // Each block is labeled with its first timestamp
        let time = self.array.time_axis(&self.dim).unwrap().stride(samples);
        let mut coords = vec![Coord {
            name: self.dim.clone(),
            values: CoordValues::Time(time),
        }];
        coords.extend(self.array.coords_except(&self.dim));

        DataArray::rebuild(
            self.array.name().to_owned(),
            self.array.dims().to_vec(),
            coords,
            self.array.attrs().clone(),
            reduced,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{assert_values_eq, random_daily, random_daily_grid, zeros_daily};

    #[test]
    fn test_groupby_dayofyear() {
        let daily = random_daily(2002, 2005);
        let blocked = blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap();
        let naive = daily.groupby("time", Grouping::DayOfYear).unwrap();

        // 2004 is a leap year, so all 366 groups are present
        for (ours, theirs) in [
            (blocked.min(), naive.min()),
            (blocked.max(), naive.max()),
            (blocked.mean(), naive.mean()),
            (blocked.sum(), naive.sum()),
        ] {
            assert_eq!(ours.shape(), &[366]);
            assert_eq!(ours.keys("dayofyear").unwrap()[365], 366);
            assert_values_eq(&ours.values(), &theirs.values());
        }
    }

    #[test]
    fn test_groupby_dayofyear_no_leap_year() {
        let daily = random_daily(2002, 2003);
        let blocked = blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap();
        let naive = daily.groupby("time", Grouping::DayOfYear).unwrap();

        for (ours, theirs) in [
            (blocked.min(), naive.min()),
            (blocked.max(), naive.max()),
            (blocked.mean(), naive.mean()),
            (blocked.sum(), naive.sum()),
        ] {
            assert_eq!(ours.shape(), &[366]);
            assert_eq!(theirs.shape(), &[365]);
            let head = ours
                .values()
                .slice_axis(Axis(0), Slice::from(0..365))
                .to_owned();
            assert_values_eq(&head, &theirs.values());
        }

        // Day 366 never occurs, so its slot stays missing
        assert!(blocked.min().values()[[365]].is_nan());
    }

    #[test]
    fn test_groupby_dayofyear_grid() {
        let daily = random_daily_grid(2002, 2005, 4, 3);
        let blocked = blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap();
        let naive = daily.groupby("time", Grouping::DayOfYear).unwrap();

        let ours = blocked.mean();
        assert_eq!(ours.shape(), &[366, 4, 3]);
        assert_eq!(ours.dims(), &["dayofyear", "y", "x"]);
        assert_values_eq(&ours.values(), &naive.mean().values());
    }

    #[test]
    fn test_groupby_dayofyear_chunked() {
        let _ = env_logger::builder().is_test(true).try_init();
        let daily = zeros_daily(2002, 2005).chunk(50);

        let blocked_max = blocked_groupby(&daily, "time", Grouping::DayOfYear)
            .unwrap()
            .max();
        let naive_max = daily.groupby("time", Grouping::DayOfYear).unwrap().max();

        // Far fewer chunks than one per group
        assert!(blocked_max.chunk_count() as f64 <= 0.1 * naive_max.chunk_count() as f64);

        // And a much smaller task graph
        assert!(blocked_max.graph_size() as f64 <= 0.2 * naive_max.graph_size() as f64);
    }

    #[test]
    fn test_groupby_monthday() {
        let daily = random_daily(2002, 2005);
        let blocked = blocked_groupby(&daily, "time", Grouping::MonthDay).unwrap();

        let keys = daily.time_axis("time").unwrap().monthday();
        let naive = daily.groupby_keys("time", keys).unwrap();

        for (ours, theirs) in [
            (blocked.min(), naive.min()),
            (blocked.max(), naive.max()),
            (blocked.mean(), naive.mean()),
            (blocked.sum(), naive.sum()),
        ] {
            assert_eq!(ours.keys("monthday").unwrap()[59], 229);
            assert_values_eq(&ours.values(), &theirs.values());
        }
    }

    #[test]
    fn test_groupby_monthday_chunked() {
        let daily = zeros_daily(2002, 2005).chunk(50);

        let blocked_max = blocked_groupby(&daily, "time", Grouping::MonthDay)
            .unwrap()
            .max();
        let keys = daily.time_axis("time").unwrap().monthday();
        let naive_max = daily.groupby_keys("time", keys).unwrap().max();

        assert!(blocked_max.chunk_count() as f64 <= 0.1 * naive_max.chunk_count() as f64);
        assert!(blocked_max.graph_size() as f64 <= 0.2 * naive_max.graph_size() as f64);
    }

    #[test]
    fn test_groupby_climatology() {
        let daily = random_daily(2002, 2005).chunk(50);

        let climatology = blocked_groupby(&daily, "time", Grouping::DayOfYear)
            .unwrap()
            .mean();
        let delta =
            &blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap() - &climatology;

        let naive_climatology = daily.groupby("time", Grouping::DayOfYear).unwrap().mean();
        let naive_delta =
            &daily.groupby("time", Grouping::DayOfYear).unwrap() - &naive_climatology;

        assert_values_eq(&delta.values(), &naive_delta.values());
        assert_eq!(
            delta.time_axis("time").unwrap(),
            daily.time_axis("time").unwrap()
        );
    }

    #[test]
    fn test_groupby_percentile() {
        let daily = random_daily(2002, 2005).chunk(50);

        let climatology = blocked_groupby(&daily, "time", Grouping::DayOfYear)
            .unwrap()
            .percentile(90.0);

        // Straight per-group computation over materialized data
        let values = daily.values();
        let keys = daily.time_axis("time").unwrap().dayofyear();
        let expected: Vec<f64> = (1..=366)
            .map(|key| {
                let group: Vec<f64> = keys
                    .iter()
                    .zip(values.iter())
                    .filter(|(k, _)| **k == key)
                    .map(|(_, v)| *v)
                    .collect();
                crate::stats::percentile(group, 90.0)
            })
            .collect();

        let computed = climatology.values();
        for slot in 0..365 {
            assert_eq!(computed[[slot]], expected[slot]);
        }
    }

    #[test]
    fn test_groupby_apply() {
        let daily = random_daily(2002, 2005).chunk(50);
        let blocked = blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap();

        let doubled = blocked.apply(|block| block * 2.0).unwrap();
        assert_values_eq(&doubled.values(), &(&daily * 2.0).values());
        assert_eq!(
            doubled.time_axis("time").unwrap(),
            daily.time_axis("time").unwrap()
        );
    }

    #[test]
    fn test_groupby_apply_reducing() {
        let daily = random_daily(2002, 2005);
        let blocked = blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap();

        let collapsed = blocked
            .apply(|block| block.map_axis(Axis(0), |lane| crate::stats::nanmean(lane.iter().copied())))
            .unwrap();
        assert_eq!(collapsed.shape(), &[366]);
        assert_values_eq(&collapsed.values(), &blocked.mean().values());
    }

    #[test]
    fn test_groupby_rank() {
        let daily = random_daily(2002, 2005).chunk(50);
        let blocked = blocked_groupby(&daily, "time", Grouping::DayOfYear).unwrap();

        let ranked = blocked.rank();
        assert_eq!(ranked.shape(), daily.shape());

        // Three years of samples per group, except the lone day 366
        let values = ranked.values();
        let keys = daily.time_axis("time").unwrap().dayofyear();
        for (key, rank) in keys.iter().zip(values.iter()) {
            if *key == 366 {
                assert_eq!(*rank, 1.0);
            } else {
                assert!((1.0..=3.0).contains(rank));
            }
        }
    }

    #[test]
    fn test_groupby_safety() {
        let daily = random_daily(2002, 2005).chunk(50);

        // Not a coordinate
        assert!(matches!(
            blocked_groupby(&daily, "x", Grouping::DayOfYear),
            Err(Error::MissingCoordinate(_))
        ));

        // Samples don't cover a full year
        let sliced = daily.slice("time", 1, 365).unwrap();
        assert!(matches!(
            blocked_groupby(&sliced, "time", Grouping::DayOfYear),
            Err(Error::PartialYear { .. })
        ));

        let sliced = daily.slice("time", 0, 364).unwrap();
        assert!(matches!(
            blocked_groupby(&sliced, "time", Grouping::DayOfYear),
            Err(Error::PartialYear { .. })
        ));

        // A gap in the middle of the year
        let gapped = DataArray::concat(
            &daily.slice("time", 0, 15).unwrap(),
            &daily.slice("time", 17, 365).unwrap(),
            "time",
        )
        .unwrap();
        assert!(matches!(
            blocked_groupby(&gapped, "time", Grouping::DayOfYear),
            Err(Error::IrregularAxis(_))
        ));
    }

    #[test]
    fn test_resample() {
        let daily = random_daily(2002, 2005).chunk(50);
        let resampled = blocked_resample(&daily, "time", 8).unwrap();

        let mean = resampled.mean();
        assert_eq!(mean.shape(), &[137]);

        let values = daily.values();
        let computed = mean.values();
        for block in 0..137 {
            let window = values.slice_axis(Axis(0), Slice::from(block * 8..block * 8 + 8));
            let expected = window.iter().sum::<f64>() / 8.0;
            assert_eq!(computed[[block]], expected);
        }

        // Each block is labeled with its first timestamp
        assert!(mean
            .time_axis("time")
            .unwrap()
            .instants()
            .windows(2)
            .all(|pair| pair[1] - pair[0] == chrono::Duration::days(8)));
    }

    #[test]
    fn test_resample_min_max_sum() {
        let daily = random_daily(2002, 2003);
        let resampled = blocked_resample(&daily, "time", 5).unwrap();

        let values = daily.values();
        let min = resampled.min().values();
        let max = resampled.max().values();
        let sum = resampled.sum().values();
        for block in 0..73 {
            let window: Vec<f64> = values
                .slice_axis(Axis(0), Slice::from(block * 5..block * 5 + 5))
                .iter()
                .copied()
                .collect();
            assert_eq!(min[[block]], window.iter().cloned().fold(f64::NAN, f64::min));
            assert_eq!(max[[block]], window.iter().cloned().fold(f64::NAN, f64::max));
            assert_eq!(sum[[block]], window.iter().sum::<f64>());
        }
    }

    #[test]
    fn test_resample_safety() {
        let daily = random_daily(2002, 2005).chunk(50);

        // Not a coordinate
        assert!(matches!(
            blocked_resample(&daily, "x", 24),
            Err(Error::MissingCoordinate(_))
        ));

        // Samples doesn't evenly divide length
        let sliced = daily.slice("time", 0, 15).unwrap();
        assert!(matches!(
            blocked_resample(&sliced, "time", 24),
            Err(Error::UnevenSamples {
                samples: 24,
                length: 15
            })
        ));

        // Irregular
        let gapped = DataArray::concat(
            &daily.slice("time", 0, 15).unwrap(),
            &daily.slice("time", 17, 26).unwrap(),
            "time",
        )
        .unwrap();
        assert_eq!(gapped.shape(), &[24]);
        assert!(matches!(
            blocked_resample(&gapped, "time", 24),
            Err(Error::IrregularAxis(_))
        ));
    }

    #[test]
    fn test_align_to_blocks() {
        let aligned = align_to_blocks(&Chunks::even(1096, 50), 8);
        assert_eq!(aligned.total(), 1096);
        let mut start = 0;
        for length in aligned.lengths() {
            assert_eq!(length % 8, 0);
            start += length;
        }
        assert_eq!(start, 1096);
    }
}
