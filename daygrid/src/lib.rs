mod blocked;
mod chunked;
mod chunks;
mod dataarray;
mod errors;
mod graph;
mod groupby;
mod rank;
mod stats;
mod time;

#[cfg(test)]
mod testing;

pub use blocked::blocked_groupby;
pub use blocked::blocked_resample;
pub use blocked::BlockedGroupby;
pub use blocked::BlockedResample;
pub use blocked::Grouping;
pub use chunked::ChunkedArray;
pub use chunks::Chunks;
pub use dataarray::Coord;
pub use dataarray::CoordValues;
pub use dataarray::DataArray;
pub use errors::Error;
pub use errors::Result;
pub use groupby::GroupBy;
pub use rank::rank_along_dim;
pub use rank::rank_by_dayofyear;
pub use rank::rank_by_monthday;
pub use stats::nanmax;
pub use stats::nanmean;
pub use stats::nanmin;
pub use stats::nansum;
pub use stats::percentile;
pub use stats::rankdata;
pub use time::TimeAxis;
