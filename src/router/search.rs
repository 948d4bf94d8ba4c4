use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{Graph, NodeKey};

pub(super) struct SearchOutcome {
    pub path: Vec<NodeKey>,
    pub distance: f64,
    pub settled: usize,
}

struct SearchState {
    cost: f64,
    estimate: f64,
    node: NodeKey,
}

impl Eq for SearchState {}
impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.estimate == other.estimate
    }
}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted for min-heap
        other.estimate.total_cmp(&self.estimate)
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(super) fn dijkstra(graph: &Graph, source: NodeKey, target: NodeKey) -> Option<SearchOutcome> {
    best_first(graph, source, target, |_| 0.0)
}

/// `heuristic` must never overestimate the remaining distance to `target`.
pub(super) fn astar(
    graph: &Graph,
    source: NodeKey,
    target: NodeKey,
    heuristic: impl Fn(&NodeKey) -> f64,
) -> Option<SearchOutcome> {
    best_first(graph, source, target, heuristic)
}

fn best_first(
    graph: &Graph,
    source: NodeKey,
    target: NodeKey,
    heuristic: impl Fn(&NodeKey) -> f64,
) -> Option<SearchOutcome> {
    let mut distances = FxHashMap::default();
    let mut predecessors = FxHashMap::default();
    let mut settled = FxHashSet::default();
    let mut heap = BinaryHeap::new();

    distances.insert(source, 0.0);
    heap.push(SearchState {
        cost: 0.0,
        estimate: heuristic(&source),
        node: source,
    });

    while let Some(SearchState { cost, node, .. }) = heap.pop() {
        if !settled.insert(node) {
            continue;
        }

        if node == target {
            let mut path = vec![target];
            let mut current = target;
            while let Some(&pred) = predecessors.get(&current) {
                path.push(pred);
                current = pred;
            }
            path.reverse();

            return Some(SearchOutcome {
                path,
                distance: cost,
                settled: settled.len(),
            });
        }

        for (&next, weight) in graph.neighbors(&node) {
            if settled.contains(&next) {
                continue;
            }

            let cost = cost + weight;
            let best = distances.entry(next).or_insert(f64::INFINITY);

            if cost < *best {
                *best = cost;
                predecessors.insert(next, node);
                heap.push(SearchState {
                    cost,
                    estimate: cost + heuristic(&next),
                    node: next,
                });
            }
        }
    }

    None
}
