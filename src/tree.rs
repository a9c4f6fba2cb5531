//!
//! Binary phylogenetic tree of one hidden state
//!
//! * Parse
//!     `TreeModel::parse` reads the bracketed topology `(0:0.1,(1:0.2,2:0.2)0.05)`
//! * Likelihood
//!     Felsenstein pruning over the post-order (see `crate::likelihood`)
//! * Ancestral
//!     argmax ancestral sequences and branch-length refinement
//!
//! # Layout
//!
//! Nodes are stored in an arena (`Vec<Node>`) and refer to their children by
//! `NodeId`. The post-order is built once at construction; children always
//! precede their parent and the last element is the root.
//!
pub mod ancestral;
pub mod parser;

use crate::alignment::N_BASES;
use crate::error::{PhyloHmmError, Result};

///
/// 4x4 base substitution probability matrix `P[x][y] = P(x -> y)`
///
pub type SubstMatrix = [[f64; N_BASES]; N_BASES];

///
/// Upper bound of a re-estimated branch length.
/// `jukes_cantor(MAX_BRANCH_LENGTH)` is practically the uniform matrix.
///
pub const MAX_BRANCH_LENGTH: f64 = 10.0;

///
/// Substitution matrix of the Jukes-Cantor model for a branch of length `length`
///
/// ```text
/// off-diagonal = 0.75 (1 - exp(-4 length / 3)) / 3
/// diagonal     = 1 - 3 off-diagonal
/// ```
///
pub fn jukes_cantor(length: f64) -> SubstMatrix {
    let p_change = 0.75 * (1.0 - (-4.0 * length / 3.0).exp());
    let off = p_change / 3.0;
    let mut m = [[off; N_BASES]; N_BASES];
    for (x, row) in m.iter_mut().enumerate() {
        row[x] = 1.0 - 3.0 * off;
    }
    m
}

///
/// Inverse of the Jukes-Cantor model: evolutionary distance from the
/// fraction `d` of differing sites.
///
/// ```text
/// length = -3/4 log(1 - 4d/3)
/// ```
///
/// Saturates at `MAX_BRANCH_LENGTH` when `d >= 3/4`.
///
pub fn jukes_cantor_distance(d: f64) -> f64 {
    if d <= 0.0 {
        0.0
    } else if d >= 0.75 {
        MAX_BRANCH_LENGTH
    } else {
        (-0.75 * (1.0 - 4.0 * d / 3.0).ln()).min(MAX_BRANCH_LENGTH)
    }
}

///
/// Index of a node in `TreeModel`
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> NodeId {
        NodeId(index)
    }
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    /// bound to one sequence of the alignment
    Leaf { seq_index: usize },
    Internal { left: NodeId, right: NodeId },
}

///
/// Node in the tree
///
/// `branch_length` is the length of the branch leading to this node from
/// its parent, and `matrix` is its Jukes-Cantor matrix.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    kind: NodeKind,
    branch_length: f64,
    matrix: SubstMatrix,
}

impl Node {
    pub fn leaf(seq_index: usize, branch_length: f64) -> Node {
        Node {
            kind: NodeKind::Leaf { seq_index },
            branch_length,
            matrix: jukes_cantor(branch_length),
        }
    }
    pub fn internal(left: NodeId, right: NodeId, branch_length: f64) -> Node {
        Node {
            kind: NodeKind::Internal { left, right },
            branch_length,
            matrix: jukes_cantor(branch_length),
        }
    }
    pub fn kind(&self) -> NodeKind {
        self.kind
    }
    pub fn branch_length(&self) -> f64 {
        self.branch_length
    }
    pub fn matrix(&self) -> &SubstMatrix {
        &self.matrix
    }
    fn set_branch_length(&mut self, branch_length: f64) {
        self.branch_length = branch_length;
        self.matrix = jukes_cantor(branch_length);
    }
}

///
/// Tree model of a hidden state
///
#[derive(Clone, Debug, PartialEq)]
pub struct TreeModel {
    nodes: Vec<Node>,
    post_order: Vec<NodeId>,
}

impl TreeModel {
    ///
    /// Build from an arena whose last node is the root.
    ///
    /// The post-order is computed by a traversal from the root, so that
    /// the arena can be in any order.
    ///
    pub fn from_nodes(nodes: Vec<Node>) -> Result<TreeModel> {
        if nodes.is_empty() {
            return Err(PhyloHmmError::MalformedTopology("empty tree".to_string()));
        }
        let root = NodeId(nodes.len() - 1);
        let mut post_order = Vec::with_capacity(nodes.len());
        let mut visited = vec![false; nodes.len()];
        // (node, children_done)
        let mut stack = vec![(root, false)];
        while let Some((v, children_done)) = stack.pop() {
            if children_done {
                post_order.push(v);
                continue;
            }
            if visited[v.0] {
                return Err(PhyloHmmError::MalformedTopology(format!(
                    "node {} is shared by two parents",
                    v.0
                )));
            }
            visited[v.0] = true;
            stack.push((v, true));
            if let NodeKind::Internal { left, right } = nodes[v.0].kind {
                for child in [right, left] {
                    if child.0 >= nodes.len() {
                        return Err(PhyloHmmError::MalformedTopology(format!(
                            "child {} of node {} does not exist",
                            child.0, v.0
                        )));
                    }
                    stack.push((child, false));
                }
            }
        }
        if post_order.len() != nodes.len() {
            return Err(PhyloHmmError::MalformedTopology(
                "tree has nodes unreachable from the root".to_string(),
            ));
        }
        Ok(TreeModel { nodes, post_order })
    }
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn node(&self, v: NodeId) -> &Node {
        &self.nodes[v.0]
    }
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
    ///
    /// Nodes in post-order. The last one is the root.
    ///
    pub fn post_order(&self) -> &[NodeId] {
        &self.post_order
    }
    pub fn root(&self) -> NodeId {
        // post_order is non-empty by construction
        self.post_order[self.post_order.len() - 1]
    }
    ///
    /// Iterator of `(node, seq_index)` of all leaves
    ///
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node.kind {
                NodeKind::Leaf { seq_index } => Some((NodeId(i), seq_index)),
                NodeKind::Internal { .. } => None,
            })
    }
    pub fn n_leaves(&self) -> usize {
        self.leaves().count()
    }
    ///
    /// parent of each node (`None` for the root)
    ///
    pub fn parents(&self) -> Vec<Option<NodeId>> {
        let mut parents = vec![None; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Internal { left, right } = node.kind {
                parents[left.0] = Some(NodeId(i));
                parents[right.0] = Some(NodeId(i));
            }
        }
        parents
    }
    ///
    /// Check that all leaves refer to an existing sequence.
    ///
    pub fn check_n_seqs(&self, n_seqs: usize) -> Result<()> {
        match self.leaves().find(|&(_, seq_index)| seq_index >= n_seqs) {
            Some((_, seq_index)) => Err(PhyloHmmError::DimensionMismatch(format!(
                "leaf refers to sequence {} but the alignment has {} sequences",
                seq_index, n_seqs
            ))),
            None => Ok(()),
        }
    }
    ///
    /// Multiply every branch length by `weight` and recompute the matrices.
    ///
    pub fn scale_branch_lengths(&mut self, weight: f64) -> Result<()> {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(PhyloHmmError::InvalidParameter(format!(
                "branch length weight must be a non-negative number, got {}",
                weight
            )));
        }
        for node in self.nodes.iter_mut() {
            let length = node.branch_length * weight;
            node.set_branch_length(length);
        }
        Ok(())
    }
    pub fn set_branch_length(&mut self, v: NodeId, branch_length: f64) -> Result<()> {
        if !(branch_length.is_finite() && branch_length >= 0.0) {
            return Err(PhyloHmmError::InvalidParameter(format!(
                "branch length must be a non-negative number, got {}",
                branch_length
            )));
        }
        self.nodes[v.0].set_branch_length(branch_length);
        Ok(())
    }
    ///
    /// Sum of all branch lengths (except the root's)
    ///
    pub fn total_branch_length(&self) -> f64 {
        let root = self.root();
        self.post_order
            .iter()
            .filter(|&&v| v != root)
            .map(|&v| self.nodes[v.0].branch_length)
            .sum()
    }
    ///
    /// Write back the topology in the same grammar as `TreeModel::parse`.
    ///
    pub fn to_topology_string(&self) -> String {
        let mut buf = String::new();
        self.write_subtree(self.root(), &mut buf);
        buf
    }
    fn write_subtree(&self, v: NodeId, buf: &mut String) {
        let node = &self.nodes[v.0];
        match node.kind {
            NodeKind::Leaf { seq_index } => {
                buf.push_str(&format!("{}:{}", seq_index, node.branch_length));
            }
            NodeKind::Internal { left, right } => {
                buf.push('(');
                self.write_subtree(left, buf);
                buf.push(',');
                self.write_subtree(right, buf);
                buf.push(')');
                if v != self.root() || node.branch_length != 0.0 {
                    buf.push_str(&format!("{}", node.branch_length));
                }
            }
        }
    }
}

impl std::fmt::Display for TreeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_topology_string())
    }
}
