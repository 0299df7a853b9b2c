//! Deferred task graph over chunked arrays.
//!
//! Operations build an immutable tree of nodes; nothing is computed until a
//! node's data is requested. Each node knows how many tasks it contributes
//! to the graph, so callers can measure how much work a given chunking
//! strategy hands to an executor before running it. Computed chunks are
//! memoized per node, so a node shared between two result arrays is only
//! evaluated once.

use std::{collections::HashSet, sync::Arc};

use ndarray::{concatenate, stack, ArrayD, ArrayViewD, Axis, Slice};
use parking_lot::Mutex;

use crate::chunks::Chunks;

pub(crate) type ChunkFn = Arc<dyn Fn(usize, &ArrayD<f64>) -> ArrayD<f64> + Send + Sync>;
pub(crate) type ZipFn = Arc<dyn Fn(&ArrayD<f64>, &ArrayD<f64>) -> ArrayD<f64> + Send + Sync>;

pub(crate) enum Op {
    /// Materialized chunks. The data lives in the node's cache from
    /// construction.
    Source,

    /// One output chunk per input chunk, produced by a closure. The closure
    /// also receives the chunk's position, for callers whose transform
    /// depends on where a chunk sits along the axis.
    Map { input: Arc<Node>, f: ChunkFn },

    /// Repartition the leading axis to this node's chunk plan.
    Rechunk { input: Arc<Node> },

    /// Gather arbitrary leading-axis indices into a single chunk.
    Take {
        input: Arc<Node>,
        indices: Vec<usize>,
    },

    /// Stack equally shaped chunks into one chunk with a new leading axis.
    Stack { input: Arc<Node> },

    /// Elementwise combination of two arrays with identical chunk plans.
    Zip {
        left: Arc<Node>,
        right: Arc<Node>,
        f: ZipFn,
    },

    /// Append the chunks of several arrays along the leading axis.
    Concat { inputs: Vec<Arc<Node>> },
}

pub(crate) struct Node {
    /// Shape of the whole array, leading axis first.
    shape: Vec<usize>,

    /// Partition of the leading axis.
    plan: Chunks,

    /// Tasks this node alone contributes to the graph.
    tasks: usize,

    op: Op,

    /// Computed chunks, filled on first evaluation.
    cache: Mutex<Option<Arc<Vec<ArrayD<f64>>>>>,
}

impl Node {
    pub(crate) fn source(chunks: Vec<ArrayD<f64>>, plan: Chunks) -> Arc<Node> {
        assert_eq!(chunks.len(), plan.count());
        let mut shape = chunks[0].shape().to_vec();
        shape[0] = plan.total();

        Arc::new(Node {
            shape,
            tasks: plan.count(),
            plan,
            op: Op::Source,
            cache: Mutex::new(Some(Arc::new(chunks))),
        })
    }

    pub(crate) fn map(
        input: &Arc<Node>,
        shape: Vec<usize>,
        plan: Chunks,
        f: ChunkFn,
    ) -> Arc<Node> {
        assert_eq!(input.plan.count(), plan.count());
        assert_eq!(plan.total(), shape[0]);

        Arc::new(Node {
            shape,
            tasks: plan.count(),
            plan,
            op: Op::Map {
                input: Arc::clone(input),
                f,
            },
            cache: Mutex::new(None),
        })
    }

    pub(crate) fn rechunk(input: &Arc<Node>, plan: Chunks) -> Arc<Node> {
        assert_eq!(plan.total(), input.shape[0]);

        Arc::new(Node {
            shape: input.shape.clone(),
            tasks: input.plan.count() + plan.count(),
            plan,
            op: Op::Rechunk {
                input: Arc::clone(input),
            },
            cache: Mutex::new(None),
        })
    }

    pub(crate) fn take(input: &Arc<Node>, indices: Vec<usize>) -> Arc<Node> {
        let mut shape = input.shape.clone();
        shape[0] = indices.len();

        let touched: HashSet<usize> = indices
            .iter()
            .map(|&index| input.plan.find_chunk(index))
            .collect();

        Arc::new(Node {
            shape,
            plan: Chunks::single(indices.len()),
            tasks: touched.len() + 1,
            op: Op::Take {
                input: Arc::clone(input),
                indices,
            },
            cache: Mutex::new(None),
        })
    }

    pub(crate) fn stack(input: &Arc<Node>) -> Arc<Node> {
        let length = input.plan.length(0);
        for chunk in 0..input.plan.count() {
            assert_eq!(input.plan.length(chunk), length);
        }

        let mut shape = vec![input.plan.count(), length];
        shape.extend_from_slice(&input.shape[1..]);

        Arc::new(Node {
            plan: Chunks::single(shape[0]),
            shape,
            tasks: 1,
            op: Op::Stack {
                input: Arc::clone(input),
            },
            cache: Mutex::new(None),
        })
    }

    pub(crate) fn zip(left: &Arc<Node>, right: &Arc<Node>, f: ZipFn) -> Arc<Node> {
        assert_eq!(left.shape, right.shape);
        assert_eq!(left.plan, right.plan);

        Arc::new(Node {
            shape: left.shape.clone(),
            plan: left.plan.clone(),
            tasks: left.plan.count(),
            op: Op::Zip {
                left: Arc::clone(left),
                right: Arc::clone(right),
                f,
            },
            cache: Mutex::new(None),
        })
    }

    pub(crate) fn concat(inputs: Vec<Arc<Node>>) -> Arc<Node> {
        let trailing = inputs[0].shape[1..].to_vec();
        let mut lengths = vec![];
        for input in &inputs {
            assert_eq!(input.shape[1..], trailing[..]);
            lengths.extend_from_slice(input.plan.lengths());
        }

        let plan = Chunks::from_lengths(lengths);
        let mut shape = vec![plan.total()];
        shape.extend_from_slice(&trailing);

        Arc::new(Node {
            shape,
            tasks: plan.count(),
            plan,
            op: Op::Concat { inputs },
            cache: Mutex::new(None),
        })
    }

    pub(crate) fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub(crate) fn plan(&self) -> &Chunks {
        &self.plan
    }

    /// Compute this node's chunks, or return the memoized result.
    ///
    /// The cache lock is held across evaluation. The graph is acyclic and
    /// evaluation only ever descends to child nodes, so no lock is
    /// reacquired while held.
    ///
    pub(crate) fn data(&self) -> Arc<Vec<ArrayD<f64>>> {
        let mut cache = self.cache.lock();
        if let Some(data) = &*cache {
            return Arc::clone(data);
        }

        let data = Arc::new(self.evaluate());
        *cache = Some(Arc::clone(&data));

        data
    }

    fn evaluate(&self) -> Vec<ArrayD<f64>> {
        match &self.op {
            Op::Source => unreachable!("source data is cached at construction"),

            Op::Map { input, f } => {
                let data = input.data();
                data.iter()
                    .enumerate()
                    .map(|(chunk, array)| f(chunk, array))
                    .collect()
            }

            Op::Rechunk { input } => {
                let whole = input.whole();
                self.plan
                    .iter()
                    .map(|range| {
                        whole
                            .slice_axis(Axis(0), Slice::from(range))
                            .to_owned()
                    })
                    .collect()
            }

            Op::Take { input, indices } => {
                let data = input.data();
                let mut gathered = ArrayD::zeros(self.shape.clone());
                for (at, &index) in indices.iter().enumerate() {
                    let chunk = input.plan.find_chunk(index);
                    let row = index - input.plan.offset(chunk);
                    gathered
                        .index_axis_mut(Axis(0), at)
                        .assign(&data[chunk].index_axis(Axis(0), row));
                }

                vec![gathered]
            }

            Op::Stack { input } => {
                let data = input.data();
                let views: Vec<ArrayViewD<f64>> =
                    data.iter().map(|chunk| chunk.view()).collect();

                vec![stack(Axis(0), &views).unwrap()]
            }

            Op::Zip { left, right, f } => {
                let left = left.data();
                let right = right.data();
                left.iter()
                    .zip(right.iter())
                    .map(|(a, b)| f(a, b))
                    .collect()
            }

            Op::Concat { inputs } => {
                let mut chunks = vec![];
                for input in inputs {
                    chunks.extend(input.data().iter().cloned());
                }

                chunks
            }
        }
    }

    /// Materialize the whole array.
    ///
    pub(crate) fn whole(&self) -> ArrayD<f64> {
        let data = self.data();
        if data.len() == 1 {
            return data[0].clone();
        }

        let views: Vec<ArrayViewD<f64>> = data.iter().map(|chunk| chunk.view()).collect();

        concatenate(Axis(0), &views).unwrap()
    }

    fn children(&self) -> Vec<&Arc<Node>> {
        match &self.op {
            Op::Source => vec![],
            Op::Map { input, .. } => vec![input],
            Op::Rechunk { input } => vec![input],
            Op::Take { input, .. } => vec![input],
            Op::Stack { input } => vec![input],
            Op::Zip { left, right, .. } => vec![left, right],
            Op::Concat { inputs } => inputs.iter().collect(),
        }
    }

    /// Total task count over the distinct nodes reachable from this one.
    ///
    pub(crate) fn graph_size(self: &Arc<Node>) -> usize {
        fn visit(node: &Arc<Node>, seen: &mut HashSet<*const Node>) -> usize {
            if !seen.insert(Arc::as_ptr(node)) {
                return 0;
            }
            node.children()
                .iter()
                .map(|child| visit(child, seen))
                .sum::<usize>()
                + node.tasks
        }

        visit(self, &mut HashSet::new())
    }
}
