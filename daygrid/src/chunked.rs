use std::sync::Arc;

use ndarray::{ArrayD, Axis, Slice};

use crate::{
    chunks::Chunks,
    graph::{ChunkFn, Node, ZipFn},
};

/// A chunked array whose operations are deferred.
///
/// Cheap to clone; clones share the underlying graph node, so a shared
/// intermediate is only computed once. The leading axis is the chunked
/// axis.
///
#[derive(Clone)]
pub struct ChunkedArray {
    node: Arc<Node>,
}

impl ChunkedArray {
    /// Wrap a materialized array as a single chunk.
    ///
    pub fn from_array(array: ArrayD<f64>) -> Self {
        let plan = Chunks::single(array.shape()[0]);

        Self {
            node: Node::source(vec![array], plan),
        }
    }

    /// Wrap a materialized array, split into the given chunk plan.
    ///
    pub fn from_array_chunked(array: ArrayD<f64>, plan: Chunks) -> Self {
        assert_eq!(plan.total(), array.shape()[0]);
        let chunks = plan
            .iter()
            .map(|range| array.slice_axis(Axis(0), Slice::from(range)).to_owned())
            .collect();

        Self {
            node: Node::source(chunks, plan),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.node.shape()
    }

    pub fn len(&self) -> usize {
        self.node.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunks(&self) -> &Chunks {
        self.node.plan()
    }

    /// Number of chunks the result is split into.
    ///
    pub fn chunk_count(&self) -> usize {
        self.node.plan().count()
    }

    /// Number of tasks an executor would run to materialize this array,
    /// counted over the distinct nodes of the deferred graph.
    ///
    pub fn graph_size(&self) -> usize {
        self.node.graph_size()
    }

    /// Repartition the leading axis. A plan identical to the current one
    /// adds nothing to the graph.
    ///
    pub fn rechunk(&self, plan: Chunks) -> Self {
        if *self.node.plan() == plan {
            return self.clone();
        }

        Self {
            node: Node::rechunk(&self.node, plan),
        }
    }

    pub fn rechunk_even(&self, size: usize) -> Self {
        self.rechunk(Chunks::even(self.len(), size))
    }

    /// Gather leading-axis indices into a single chunk.
    ///
    pub fn take(&self, indices: Vec<usize>) -> Self {
        Self {
            node: Node::take(&self.node, indices),
        }
    }

    /// One output chunk per input chunk via `f`, which receives the chunk
    /// position and data. `shape` and `plan` describe the output.
    ///
    pub(crate) fn map(&self, shape: Vec<usize>, plan: Chunks, f: ChunkFn) -> Self {
        Self {
            node: Node::map(&self.node, shape, plan, f),
        }
    }

    /// Keep shape and chunking, transform each chunk elementwise.
    ///
    pub(crate) fn map_elementwise(&self, f: ChunkFn) -> Self {
        self.map(self.shape().to_vec(), self.chunks().clone(), f)
    }

    /// Stack equal-length chunks into one chunk with a new leading axis.
    ///
    pub(crate) fn stack_chunks(&self) -> Self {
        Self {
            node: Node::stack(&self.node),
        }
    }

    /// Elementwise combination with another array of the same shape. The
    /// other array is realigned to this array's chunk plan if needed.
    ///
    pub(crate) fn zip(&self, other: &ChunkedArray, f: ZipFn) -> Self {
        let other = other.rechunk(self.chunks().clone());

        Self {
            node: Node::zip(&self.node, &other.node, f),
        }
    }

    pub(crate) fn concat(parts: &[ChunkedArray]) -> Self {
        Self {
            node: Node::concat(parts.iter().map(|part| Arc::clone(&part.node)).collect()),
        }
    }

    /// Materialize the whole array, running any deferred work.
    ///
    pub fn compute(&self) -> ArrayD<f64> {
        self.node.whole()
    }
}
