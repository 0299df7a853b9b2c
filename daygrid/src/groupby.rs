//! Plain gather-per-group groupby.
//!
//! Every distinct key gathers its scattered timestamps out of whatever
//! chunks they landed in, then reduces them. Correct for any time span,
//! but on chunked data it builds one gather and one output chunk per
//! group, so the task graph grows with chunk count times group count.
//! [`crate::blocked_groupby`] exists to avoid exactly that shape.

use std::{collections::HashMap, ops::Sub, sync::Arc};

use ndarray::{ArrayD, Axis};

use crate::{
    blocked::Grouping,
    chunked::ChunkedArray,
    chunks::Chunks,
    dataarray::{Coord, CoordValues, DataArray},
    errors::{Error, Result},
    stats::Reduction,
};

/// A deferred groupby over a labeled array. Reductions return one entry
/// per distinct key present, in increasing key order.
///
pub struct GroupBy {
    array: DataArray,
    key_dim: String,
    /// Group key per timestamp.
    keys: Vec<i64>,
    /// Distinct keys in increasing order, with the timestamps holding each.
    groups: Vec<(i64, Vec<usize>)>,
}

impl DataArray {
    /// Group the named time dimension by calendar keys.
    ///
    pub fn groupby(&self, dim: &str, grouping: Grouping) -> Result<GroupBy> {
        let axis = self.time_axis(dim)?;
        let keys = grouping.keys_for(axis);
        self.grouped(dim, keys, grouping.dim_name())
    }

    /// Group the named dimension by explicit per-timestamp keys.
    ///
    pub fn groupby_keys(&self, dim: &str, keys: Vec<i64>) -> Result<GroupBy> {
        self.grouped(dim, keys, "group")
    }

    fn grouped(&self, dim: &str, keys: Vec<i64>, key_dim: &str) -> Result<GroupBy> {
        match self.axis_of(dim) {
            None => return Err(Error::MissingDimension(dim.to_owned())),
            Some(0) => {}
            Some(_) => return Err(Error::NotLeadingAxis(dim.to_owned())),
        }
        if keys.len() != self.shape()[0] {
            return Err(Error::CoordinateLength {
                dim: dim.to_owned(),
                coordinate: keys.len(),
                dimension: self.shape()[0],
            });
        }

        let mut by_key: HashMap<i64, Vec<usize>> = HashMap::new();
        for (at, &key) in keys.iter().enumerate() {
            by_key.entry(key).or_default().push(at);
        }
        let mut groups: Vec<(i64, Vec<usize>)> = by_key.into_iter().collect();
        groups.sort_by_key(|(key, _)| *key);

        Ok(GroupBy {
            array: self.clone(),
            key_dim: key_dim.to_owned(),
            keys,
            groups,
        })
    }
}

impl GroupBy {
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

    /// Per-group percentile, `q` in 0..=100.
    ///
    /// # Panics
    ///
    /// When `q` is outside 0..=100.
    ///
    pub fn percentile(&self, q: f64) -> DataArray {
        assert!((0.0..=100.0).contains(&q), "percentile {q} outside 0..=100");
        self.reduce(Reduction::Percentile(q))
    }

    fn reduce(&self, reduction: Reduction) -> DataArray {
        let parts: Vec<ChunkedArray> = self
            .groups
            .iter()
            .map(|(_, indices)| {
                let gathered = self.array.data().take(indices.clone());
                let mut shape = gathered.shape().to_vec();
                shape[0] = 1;

                gathered.map(
                    shape,
                    Chunks::single(1),
                    Arc::new(move |_, chunk: &ArrayD<f64>| {
                        chunk
                            .map_axis(Axis(0), |lane| {
                                reduction.reduce(lane.iter().copied())
                            })
                            .insert_axis(Axis(0))
                    }),
                )
            })
            .collect();

        let keys: Vec<i64> = self.groups.iter().map(|(key, _)| *key).collect();
        let time_dim = self.array.dims()[0].clone();
        let mut dims = vec![self.key_dim.clone()];
        dims.extend_from_slice(&self.array.dims()[1..]);

        let mut coords = vec![Coord {
            name: self.key_dim.clone(),
            values: CoordValues::Keys(keys),
        }];
        coords.extend(self.array.coords_except(&time_dim));

        DataArray::rebuild(
            self.array.name().to_owned(),
            dims,
            coords,
            self.array.attrs().clone(),
            ChunkedArray::concat(&parts),
        )
    }
}

/// Row lookup for a per-group operand: its leading-axis key coordinate,
/// mapped key to row.
///
/// # Panics
///
/// When the operand's leading dimension carries no key coordinate.
///
pub(crate) fn key_rows(grouped: &DataArray) -> HashMap<i64, usize> {
    let dim = grouped.dims()[0].clone();
    let keys = grouped
        .keys(&dim)
        .unwrap_or_else(|_| panic!("Operand has no key coordinate on {dim:?}"));

    keys.iter().enumerate().map(|(row, &key)| (key, row)).collect()
}

impl Sub<&DataArray> for &GroupBy {
    type Output = DataArray;

    /// Broadcast a per-group array back across every timestamp of its
    /// group and subtract, e.g. to turn a series and its climatology into
    /// anomalies.
    ///
    fn sub(self, grouped: &DataArray) -> DataArray {
        let lookup = key_rows(grouped);
        let rows = self
            .keys
            .iter()
            .map(|key| {
                *lookup
                    .get(key)
                    .unwrap_or_else(|| panic!("Operand has no entry for key {key}"))
            })
            .collect();

        self.array.combine_rows(grouped.values(), rows, |a, b| a - b)
    }
}
