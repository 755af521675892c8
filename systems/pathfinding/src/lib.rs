#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* route planner over the 4-connected map grid.
//!
//! Steps cost one unit and the heuristic is the Manhattan distance, which is
//! consistent on this grid, so a finalized node is never reopened. Candidate
//! nodes are ordered by lowest `f`, then lowest `h`, then insertion order;
//! identical inputs therefore always yield identical paths.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

use log::trace;
use pointwalk_core::{CellCoord, Direction, MapQuery, Path};

/// Reusable A* workspace.
///
/// The node arena, cell index and open set are kept between searches so
/// repeated planning does not reallocate; every search starts by clearing
/// them.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<SearchNode>,
    index: HashMap<CellCoord, usize>,
    open_set: BinaryHeap<Reverse<OpenEntry>>,
    sequence: u64,
    expanded: usize,
}

impl Pathfinder {
    /// Creates an empty pathfinder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes finalized by the most recent search.
    #[must_use]
    pub fn expanded_nodes(&self) -> usize {
        self.expanded
    }

    /// Plans the shortest walkable route from `start` to `goal`.
    ///
    /// Returns an empty path when the goal is unreachable, when either cell
    /// lies outside the map, or when `start == goal`.
    pub fn find_path<M>(&mut self, map: &M, start: CellCoord, goal: CellCoord) -> Path
    where
        M: MapQuery + ?Sized,
    {
        self.reset();

        if start == goal || !map.is_valid(start) || !map.is_valid(goal) {
            return Path::new();
        }

        self.open(start, 0, start.manhattan_distance(goal), None);

        while let Some(Reverse(entry)) = self.open_set.pop() {
            let current = self.nodes[entry.node];
            if current.closed || entry.g != current.g {
                continue;
            }

            if current.cell == goal {
                let path = self.reconstruct(entry.node);
                trace!(
                    "path {start} -> {goal}: {} steps, {} nodes expanded",
                    path.len(),
                    self.expanded
                );
                return path;
            }

            self.nodes[entry.node].closed = true;
            self.expanded += 1;

            for direction in Direction::SEARCH_ORDER {
                let Some(next) = current.cell.step(direction) else {
                    continue;
                };
                if !map.is_valid(next) || !map.can_pass(current.cell, direction) {
                    continue;
                }

                let g = current.g + 1;
                match self.index.get(&next).copied() {
                    None => self.open(next, g, next.manhattan_distance(goal), Some(entry.node)),
                    Some(existing) => {
                        let node = &mut self.nodes[existing];
                        if node.closed || g >= node.g {
                            continue;
                        }
                        node.g = g;
                        node.parent = Some(entry.node);
                        let (f, h) = (node.f(), node.h);
                        self.push(existing, f, h, g);
                    }
                }
            }
        }

        trace!(
            "no path {start} -> {goal}, {} nodes expanded",
            self.expanded
        );
        Path::new()
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.open_set.clear();
        self.sequence = 0;
        self.expanded = 0;
    }

    fn open(&mut self, cell: CellCoord, g: u32, h: u32, parent: Option<usize>) {
        let node = self.nodes.len();
        self.nodes.push(SearchNode {
            cell,
            g,
            h,
            parent,
            closed: false,
        });
        let _ = self.index.insert(cell, node);
        self.push(node, g + h, h, g);
    }

    fn push(&mut self, node: usize, f: u32, h: u32, g: u32) {
        self.open_set.push(Reverse(OpenEntry {
            f,
            h,
            sequence: self.sequence,
            node,
            g,
        }));
        self.sequence += 1;
    }

    fn reconstruct(&self, goal: usize) -> Path {
        let mut path = Path::new();
        let mut cursor = goal;
        while let Some(parent) = self.nodes[cursor].parent {
            let from = self.nodes[parent].cell;
            if let Some(direction) = Direction::between(from, self.nodes[cursor].cell) {
                path.push_front(direction);
            }
            cursor = parent;
        }
        path
    }
}

/// Plans a route with a throwaway [`Pathfinder`].
#[must_use]
pub fn find_path<M>(map: &M, start: CellCoord, goal: CellCoord) -> Path
where
    M: MapQuery + ?Sized,
{
    Pathfinder::new().find_path(map, start, goal)
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    cell: CellCoord,
    g: u32,
    h: u32,
    parent: Option<usize>,
    closed: bool,
}

impl SearchNode {
    fn f(&self) -> u32 {
        self.g + self.h
    }
}

/// Open-set entry; field order defines the heap priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f: u32,
    h: u32,
    sequence: u64,
    node: usize,
    g: u32,
}
