//! Directed acyclic graph over candidate ladder peaks.
//!
//! Nodes are detected peak times in increasing order; an edge joins two
//! peaks whose time difference is within the maximum ladder trace distance.
//! Candidate ladder combinations are the paths of exactly `ref_count` nodes.

use crate::error::{CefragError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakGraph {
    /// Peak times, strictly increasing.
    nodes: Vec<usize>,
    /// Successor node indices, ascending.
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl PeakGraph {
    /// Build the graph from sorted peak times.
    pub fn build(peaks: &[usize], max_distance: usize) -> Self {
        let n = peaks.len();
        let mut successors = vec![Vec::new(); n];
        let mut in_degree = vec![0; n];

        for i in 0..n {
            for j in i + 1..n {
                if peaks[j]
                    .checked_sub(peaks[i])
                    .is_some_and(|diff| diff <= max_distance)
                {
                    successors[i].push(j);
                    in_degree[j] += 1;
                }
            }
        }

        Self {
            nodes: peaks.to_vec(),
            successors,
            in_degree,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    /// Peak times of the nodes.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Node indices with no incoming edge.
    pub fn start_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len()).filter(|&i| self.in_degree[i] == 0).collect()
    }

    /// Node indices with no outgoing edge.
    pub fn end_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.successors[i].is_empty())
            .collect()
    }

    /// Every path of exactly `length` nodes, as peak times.
    ///
    /// Each such path is a contiguous window of some start-to-end path, since
    /// in a DAG every node is reachable from a start node and reaches an end
    /// node. Windows are produced in depth-first order from the earliest
    /// first node, successors ascending, without duplicates.
    pub fn windows(&self, length: usize) -> Result<Vec<Vec<usize>>> {
        if self.start_nodes().is_empty() || self.end_nodes().is_empty() {
            return Err(CefragError::NoCombination(
                "graph does not have start or end nodes".to_string(),
            ));
        }
        if length == 0 {
            return Err(CefragError::NoCombination(
                "no reference sizes to match".to_string(),
            ));
        }

        let mut windows = Vec::new();
        let mut path = Vec::with_capacity(length);
        for first in 0..self.nodes.len() {
            path.push(first);
            self.extend(&mut path, length, &mut windows);
            path.pop();
        }

        if windows.is_empty() {
            return Err(CefragError::NoCombination(format!(
                "no path through the {} detected ladder peaks spans {} reference sizes",
                self.nodes.len(),
                length
            )));
        }
        Ok(windows)
    }

    fn extend(&self, path: &mut Vec<usize>, length: usize, out: &mut Vec<Vec<usize>>) {
        let Some(&last) = path.last() else {
            return;
        };
        if path.len() == length {
            out.push(path.iter().map(|&i| self.nodes[i]).collect());
            return;
        }
        // Not enough nodes left to complete the window
        if self.nodes.len() - last - 1 < length - path.len() {
            return;
        }
        for &next in &self.successors[last] {
            path.push(next);
            self.extend(path, length, out);
            path.pop();
        }
    }
}
