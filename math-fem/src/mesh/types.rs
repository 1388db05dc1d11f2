//! Mesh types for 2D triangular finite element analysis

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A point in 2D or 3D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a 2D point (z = 0)
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<(f64, f64)> for Point {
    fn from(p: (f64, f64)) -> Self {
        Point::new_2d(p.0, p.1)
    }
}

/// A linear (P1) triangle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Vertex indices, counter-clockwise
    pub nodes: [usize; 3],
    /// Element ID
    pub id: usize,
}

impl Element {
    /// Edges as pairs of node indices
    pub fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.nodes;
        [(a, b), (b, c), (c, a)]
    }
}

/// A boundary edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryEdge {
    /// Edge end points, sorted
    pub nodes: [usize; 2],
    /// Owning element index
    pub element_idx: usize,
}

/// A triangular finite element mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    /// Node coordinates
    pub nodes: Vec<Point>,
    /// Elements
    pub elements: Vec<Element>,
    /// Boundary edges
    pub boundaries: Vec<BoundaryEdge>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its index
    pub fn add_node(&mut self, point: Point) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(point);
        idx
    }

    /// Add a triangle and return its index
    pub fn add_element(&mut self, nodes: [usize; 3]) -> usize {
        let idx = self.elements.len();
        self.elements.push(Element { nodes, id: idx });
        idx
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Get node coordinates
    pub fn node(&self, idx: usize) -> &Point {
        &self.nodes[idx]
    }

    /// Get element
    pub fn element(&self, idx: usize) -> &Element {
        &self.elements[idx]
    }

    /// Find boundary edges automatically: edges that belong to a single element
    pub fn detect_boundaries(&mut self) {
        let mut edge_count: HashMap<[usize; 2], (usize, usize)> = HashMap::new();

        for (elem_idx, elem) in self.elements.iter().enumerate() {
            for (a, b) in elem.edges() {
                let key = if a < b { [a, b] } else { [b, a] };
                edge_count
                    .entry(key)
                    .and_modify(|e| e.1 += 1)
                    .or_insert((elem_idx, 1));
            }
        }

        let mut boundaries: Vec<BoundaryEdge> = edge_count
            .into_iter()
            .filter(|(_, (_, count))| *count == 1)
            .map(|(nodes, (element_idx, _))| BoundaryEdge { nodes, element_idx })
            .collect();
        boundaries.sort_by_key(|edge| edge.nodes);
        self.boundaries = boundaries;
    }

    /// Nodes on any boundary edge, ascending
    pub fn boundary_nodes(&self) -> Vec<usize> {
        self.boundaries
            .iter()
            .flat_map(|edge| edge.nodes)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Compute element centroid
    pub fn element_centroid(&self, elem_idx: usize) -> Point {
        let [a, b, c] = self.elements[elem_idx].nodes;
        let (pa, pb, pc) = (self.nodes[a], self.nodes[b], self.nodes[c]);
        Point::new_2d((pa.x + pb.x + pc.x) / 3.0, (pa.y + pb.y + pc.y) / 3.0)
    }

    /// Compute element area
    pub fn element_measure(&self, elem_idx: usize) -> f64 {
        let [a, b, c] = self.elements[elem_idx].nodes;
        let (pa, pb, pc) = (self.nodes[a], self.nodes[b], self.nodes[c]);
        // Area = 0.5 * |det([x2-x1, y2-y1; x3-x1, y3-y1])|
        let v1 = (pb.x - pa.x, pb.y - pa.y);
        let v2 = (pc.x - pa.x, pc.y - pa.y);
        0.5 * (v1.0 * v2.1 - v1.1 * v2.0).abs()
    }

    /// Per-node coordinates as `[x, y, z]`
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.nodes.iter().map(|p| p.to_array()).collect()
    }
}
