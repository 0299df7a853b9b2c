//! Rankings like "this was the 5th hottest March 2nd on record".

use ndarray::{ArrayD, Axis, Zip};

use crate::{
    blocked::Grouping,
    chunked::ChunkedArray,
    dataarray::DataArray,
    errors::{Error, Result},
    stats::rankdata,
};

/// Rank every lane of `values` along `axis`, ties averaged, NaN kept.
///
pub(crate) fn rank_values(values: &ArrayD<f64>, axis: Axis) -> ArrayD<f64> {
    let mut ranked = values.clone();
    Zip::from(ranked.lanes_mut(axis))
        .and(values.lanes(axis))
        .for_each(|mut out, lane| {
            let ranks = rankdata(&lane.iter().copied().collect::<Vec<_>>());
            for (at, rank) in ranks.into_iter().enumerate() {
                out[at] = rank;
            }
        });

    ranked
}

/// Rank values independently along one named dimension, leaving all other
/// dimensions untouched.
///
pub fn rank_along_dim(array: &DataArray, dim: &str) -> Result<DataArray> {
    let axis = array
        .axis_of(dim)
        .ok_or_else(|| Error::MissingDimension(dim.to_owned()))?;

    let ranked = rank_values(&array.values(), Axis(axis));

    Ok(array.with_data(ChunkedArray::from_array(ranked)))
}

/// Rank each grid point against the other years at the same day of the
/// year.
///
/// Leap years contribute their Dec 31 values to day 366.
///
pub fn rank_by_dayofyear(array: &DataArray) -> Result<DataArray> {
    let ranked = rank_by_keys(array, Grouping::DayOfYear)?;

    Ok(annotate(ranked, "time: rank_by_dayofyear"))
}

/// Rank each grid point against the other years at the same month and day
/// in the calendar.
///
/// Leap years contribute their Feb 29 values to Feb 29.
///
pub fn rank_by_monthday(array: &DataArray) -> Result<DataArray> {
    let ranked = rank_by_keys(array, Grouping::MonthDay)?;

    Ok(annotate(ranked, "time: rank_by_monthday"))
}

/// Partition the time axis by group key, rank each bucket along its
/// occurrences, and scatter the ranks back into time order.
///
fn rank_by_keys(array: &DataArray, grouping: Grouping) -> Result<DataArray> {
    let axis = Axis(
        array
            .axis_of("time")
            .ok_or_else(|| Error::MissingDimension("time".to_owned()))?,
    );
    let time = array.time_axis("time")?;
    let keys = grouping.keys_for(time);

    let values = array.values();
    let mut ranked = ArrayD::zeros(values.raw_dim());

    let mut distinct: Vec<i64> = keys.clone();
    distinct.sort_unstable();
    distinct.dedup();

    for key in distinct {
        let indices: Vec<usize> = keys
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == key)
            .map(|(at, _)| at)
            .collect();

        let bucket = values.select(axis, &indices);
        let bucket_ranks = rank_values(&bucket, axis);
        for (at, &index) in indices.iter().enumerate() {
            ranked
                .index_axis_mut(axis, index)
                .assign(&bucket_ranks.index_axis(axis, at));
        }
    }

    Ok(array.with_data(ChunkedArray::from_array(ranked)))
}

/// The metadata contract for ranking outputs: a `_rank` suffixed name,
/// dimensionless units, and a record of the method used.
///
fn annotate(ranked: DataArray, cell_methods: &str) -> DataArray {
    let name = format!("{}_rank", ranked.name());

    ranked
        .rename(&name)
        .set_attr("units", "1")
        .set_attr("cell_methods", cell_methods)
}
