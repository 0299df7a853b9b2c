use std::{
    collections::BTreeMap,
    ops::{Add, Mul, Sub},
    sync::Arc,
};

use ndarray::{Array1, ArrayD, Axis};

use crate::{
    chunked::ChunkedArray,
    errors::{Error, Result},
    time::TimeAxis,
};

/// Coordinate values along one named dimension.
///
#[derive(Clone, Debug)]
pub enum CoordValues {
    Time(TimeAxis),
    Keys(Vec<i64>),
}

#[derive(Clone, Debug)]
pub struct Coord {
    pub name: String,
    pub values: CoordValues,
}

impl Coord {
    pub fn len(&self) -> usize {
        match &self.values {
            CoordValues::Time(axis) => axis.len(),
            CoordValues::Keys(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A labeled array: named dimensions, optional coordinates along each, a
/// chunked deferred backing, and free-form string attributes.
///
/// Instances are immutable; every operation produces a new array. The
/// leading dimension is the chunkable one.
///
#[derive(Clone)]
pub struct DataArray {
    name: String,
    dims: Vec<String>,
    coords: Vec<Coord>,
    attrs: BTreeMap<String, String>,
    data: ChunkedArray,
}

impl DataArray {
    pub fn new(name: &str, dims: &[&str], data: ArrayD<f64>) -> Result<Self> {
        if dims.len() != data.ndim() {
            return Err(Error::DimensionMismatch {
                dims: dims.len(),
                ndim: data.ndim(),
            });
        }

        Ok(Self {
            name: name.to_owned(),
            dims: dims.iter().map(|dim| (*dim).to_owned()).collect(),
            coords: vec![],
            attrs: BTreeMap::new(),
            data: ChunkedArray::from_array(data),
        })
    }

    /// A one dimensional series over a `"time"` dimension.
    ///
    /// # Panics
    ///
    /// When the axis and values lengths disagree.
    ///
    pub fn time_series(name: &str, time: TimeAxis, values: Array1<f64>) -> Self {
        if time.len() != values.len() {
            panic!(
                "Time axis has {} timestamps for {} values",
                time.len(),
                values.len()
            );
        }

        Self::new(name, &["time"], values.into_dyn())
            .unwrap()
            .with_time_coord("time", time)
            .unwrap()
    }

    /// Attach a time coordinate to a named dimension.
    ///
    pub fn with_time_coord(mut self, dim: &str, axis: TimeAxis) -> Result<Self> {
        let length = self.len_of(dim)?;
        if axis.len() != length {
            return Err(Error::CoordinateLength {
                dim: dim.to_owned(),
                coordinate: axis.len(),
                dimension: length,
            });
        }

        self.coords.retain(|coord| coord.name != dim);
        self.coords.push(Coord {
            name: dim.to_owned(),
            values: CoordValues::Time(axis),
        });

        Ok(self)
    }

    /// Attach integer key coordinates to a named dimension.
    ///
    pub fn with_key_coord(mut self, dim: &str, keys: Vec<i64>) -> Result<Self> {
        let length = self.len_of(dim)?;
        if keys.len() != length {
            return Err(Error::CoordinateLength {
                dim: dim.to_owned(),
                coordinate: keys.len(),
                dimension: length,
            });
        }

        self.coords.retain(|coord| coord.name != dim);
        self.coords.push(Coord {
            name: dim.to_owned(),
            values: CoordValues::Keys(keys),
        });

        Ok(self)
    }

    pub(crate) fn rebuild(
        name: String,
        dims: Vec<String>,
        coords: Vec<Coord>,
        attrs: BTreeMap<String, String>,
        data: ChunkedArray,
    ) -> Self {
        Self {
            name,
            dims,
            coords,
            attrs,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn set_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|name| name == dim)
    }

    pub fn len_of(&self, dim: &str) -> Result<usize> {
        let axis = self
            .axis_of(dim)
            .ok_or_else(|| Error::MissingDimension(dim.to_owned()))?;

        Ok(self.shape()[axis])
    }

    pub fn coord(&self, dim: &str) -> Option<&Coord> {
        self.coords.iter().find(|coord| coord.name == dim)
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// The time coordinate attached to a named dimension. Grouping and
    /// resampling on a name with no such coordinate is a caller error.
    ///
    pub fn time_axis(&self, dim: &str) -> Result<&TimeAxis> {
        match self.coord(dim) {
            Some(Coord {
                values: CoordValues::Time(axis),
                ..
            }) => Ok(axis),
            _ => Err(Error::MissingCoordinate(dim.to_owned())),
        }
    }

    /// The integer key coordinate attached to a named dimension.
    ///
    pub fn keys(&self, dim: &str) -> Result<&[i64]> {
        match self.coord(dim) {
            Some(Coord {
                values: CoordValues::Keys(keys),
                ..
            }) => Ok(keys),
            _ => Err(Error::MissingCoordinate(dim.to_owned())),
        }
    }

    pub(crate) fn data(&self) -> &ChunkedArray {
        &self.data
    }

    pub(crate) fn with_data(&self, data: ChunkedArray) -> Self {
        Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
            data,
        }
    }

    /// Coordinates other than the one on `dim`, for rebuilding outputs
    /// whose leading dimension has been replaced.
    ///
    pub(crate) fn coords_except(&self, dim: &str) -> Vec<Coord> {
        self.coords
            .iter()
            .filter(|coord| coord.name != dim)
            .cloned()
            .collect()
    }

    /// Split the backing into chunks of `size` along the leading axis.
    ///
    pub fn chunk(self, size: usize) -> Self {
        let data = self.data.rechunk_even(size);
        self.with_data(data)
    }

    pub fn chunk_count(&self) -> usize {
        self.data.chunk_count()
    }

    pub fn graph_size(&self) -> usize {
        self.data.graph_size()
    }

    /// Materialize the values, running any deferred work.
    ///
    pub fn values(&self) -> ArrayD<f64> {
        self.data.compute()
    }

    /// Copy out the sub-array covering `[start, stop)` along a named
    /// dimension, which must be the leading axis.
    ///
    pub fn slice(&self, dim: &str, start: usize, stop: usize) -> Result<Self> {
        match self.axis_of(dim) {
            None => return Err(Error::MissingDimension(dim.to_owned())),
            Some(0) => {}
            Some(_) => return Err(Error::NotLeadingAxis(dim.to_owned())),
        }

        let data = self.data.take((start..stop).collect());
        let coords = self
            .coords
            .iter()
            .map(|coord| {
                if coord.name != dim {
                    return coord.clone();
                }
                let values = match &coord.values {
                    CoordValues::Time(axis) => CoordValues::Time(axis.slice(start, stop)),
                    CoordValues::Keys(keys) => {
                        CoordValues::Keys(keys[start..stop].to_vec())
                    }
                };
                Coord {
                    name: coord.name.clone(),
                    values,
                }
            })
            .collect();

        Ok(Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            coords,
            attrs: self.attrs.clone(),
            data,
        })
    }

    /// Join two arrays end to end along a named leading dimension. The
    /// result's coordinate is the concatenation of the inputs', which may
    /// well be irregular.
    ///
    pub fn concat(first: &Self, second: &Self, dim: &str) -> Result<Self> {
        match first.axis_of(dim) {
            None => return Err(Error::MissingDimension(dim.to_owned())),
            Some(0) => {}
            Some(_) => return Err(Error::NotLeadingAxis(dim.to_owned())),
        }
        if first.shape()[1..] != second.shape()[1..] {
            return Err(Error::ShapeMismatch {
                expected: first.shape().to_vec(),
                found: second.shape().to_vec(),
            });
        }

        let data = ChunkedArray::concat(&[first.data.clone(), second.data.clone()]);
        let coords = first
            .coords
            .iter()
            .filter_map(|coord| {
                if coord.name != dim {
                    return Some(coord.clone());
                }
                let values = match (&coord.values, second.coord(dim)) {
                    (
                        CoordValues::Time(axis),
                        Some(Coord {
                            values: CoordValues::Time(other),
                            ..
                        }),
                    ) => CoordValues::Time(axis.concat(other)),
                    (
                        CoordValues::Keys(keys),
                        Some(Coord {
                            values: CoordValues::Keys(other),
                            ..
                        }),
                    ) => {
                        let mut joined = keys.clone();
                        joined.extend_from_slice(other);
                        CoordValues::Keys(joined)
                    }
                    _ => return None,
                };
                Some(Coord {
                    name: coord.name.clone(),
                    values,
                })
            })
            .collect();

        Ok(Self {
            name: first.name.clone(),
            dims: first.dims.clone(),
            coords,
            attrs: first.attrs.clone(),
            data,
        })
    }

    /// Combine each leading-axis entry with a row of `table`, where
    /// `rows[i]` names the table row for entry `i`. Used to broadcast a
    /// per-group result back against the per-timestamp array.
    ///
    /// # Panics
    ///
    /// When a table row's shape doesn't match the array's trailing shape.
    ///
    pub(crate) fn combine_rows(
        &self,
        table: ArrayD<f64>,
        rows: Vec<usize>,
        f: fn(f64, f64) -> f64,
    ) -> DataArray {
        let plan = self.data.chunks().clone();
        let data = self
            .data
            .map_elementwise(Arc::new(move |chunk, array: &ArrayD<f64>| {
                let offset = plan.offset(chunk);
                let mut out = array.clone();
                for at in 0..out.shape()[0] {
                    let row = table.index_axis(Axis(0), rows[offset + at]);
                    out.index_axis_mut(Axis(0), at)
                        .zip_mut_with(&row, |x, &y| *x = f(*x, y));
                }
                out
            }));

        self.with_data(data)
    }

    fn zip_with(&self, other: &DataArray, f: fn(f64, f64) -> f64) -> DataArray {
        if self.shape() != other.shape() {
            panic!(
                "Shape of operand {:?} doesn't match shape of array {:?}",
                other.shape(),
                self.shape()
            );
        }

        let data = self.data.zip(
            other.data(),
            Arc::new(move |a: &ArrayD<f64>, b: &ArrayD<f64>| {
                let mut out = a.clone();
                out.zip_mut_with(b, |x, &y| *x = f(*x, y));
                out
            }),
        );

        self.with_data(data)
    }
}

impl Sub<&DataArray> for &DataArray {
    type Output = DataArray;

    fn sub(self, other: &DataArray) -> DataArray {
        self.zip_with(other, |a, b| a - b)
    }
}

impl Add<&DataArray> for &DataArray {
    type Output = DataArray;

    fn add(self, other: &DataArray) -> DataArray {
        self.zip_with(other, |a, b| a + b)
    }
}

impl Mul<f64> for &DataArray {
    type Output = DataArray;

    fn mul(self, factor: f64) -> DataArray {
        let data = self
            .data
            .map_elementwise(Arc::new(move |_, chunk: &ArrayD<f64>| chunk * factor));

        self.with_data(data)
    }
}
