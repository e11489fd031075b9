use crate::graph::Trust;

/// A vertex on a walk path and the edge used to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathElement {
    /// Vertex reached.
    pub vertex: u64,
    /// Edge from the previous element; `None` for the start vertex.
    pub edge: Option<Trust>,
}

/// Sequence of vertices visited by one walk, start first.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkPath {
    elements: Vec<PathElement>,
}

impl WalkPath {
    /// Starts a path at `start`.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            elements: vec![PathElement {
                vertex: start,
                edge: None,
            }],
        }
    }

    /// Appends the vertex reached over `edge`.
    pub fn push(&mut self, edge: Trust) {
        self.elements.push(PathElement {
            vertex: edge.target(),
            edge: Some(edge),
        });
    }

    /// Returns the start vertex.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.elements[0].vertex
    }

    /// Returns the vertex the path ends at.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.elements.last().map_or_else(|| self.start(), |e| e.vertex)
    }

    /// Number of edges traversed.
    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.elements.len() - 1
    }

    /// All elements, start first.
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Elements before the end, walking back towards the start.
    pub fn backtrack(&self) -> impl Iterator<Item = &PathElement> {
        self.elements.iter().rev().skip(1)
    }
}
