//!
//! Parser of bracketed binary tree topologies
//!
//! ```text
//! tree     = subtree ';'?
//! subtree  = '(' child ',' child ')' length?
//! child    = subtree | leaf
//! leaf     = integer (':' length)?
//! length   = ':'? float
//! ```
//!
//! Leaf names are 0-based indices of the sequences in the alignment.
//! A missing length is 0, which is also the convention for the root.
//!
use super::{Node, NodeId, TreeModel};
use crate::error::{PhyloHmmError, Result};

impl TreeModel {
    ///
    /// Parse a topology string whose leaves refer to `n_seqs` sequences.
    ///
    /// Leaf indices must be unique and `< n_seqs`.
    ///
    pub fn parse(topology: &str, n_seqs: usize) -> Result<TreeModel> {
        let mut parser = Parser::new(topology.as_bytes(), n_seqs);
        parser.parse_tree()?;
        TreeModel::from_nodes(parser.nodes)
    }
}

fn malformed<T>(message: String) -> Result<T> {
    Err(PhyloHmmError::MalformedTopology(message))
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    nodes: Vec<Node>,
    used: Vec<bool>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8], n_seqs: usize) -> Self {
        Parser {
            input,
            pos: 0,
            nodes: Vec::new(),
            used: vec![false; n_seqs],
        }
    }
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }
    fn expect(&mut self, c: u8) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(x) if x == c => {
                self.pos += 1;
                Ok(())
            }
            Some(x) => malformed(format!(
                "expected '{}' but found '{}' at position {}",
                c as char, x as char, self.pos
            )),
            None => malformed(format!(
                "expected '{}' but reached the end of the topology (unmatched parentheses?)",
                c as char
            )),
        }
    }
    fn parse_tree(&mut self) -> Result<NodeId> {
        self.skip_whitespace();
        if self.peek() != Some(b'(') {
            return malformed("topology must start with '('".to_string());
        }
        let root = self.parse_subtree()?;
        self.skip_whitespace();
        if self.peek() == Some(b';') {
            self.pos += 1;
            self.skip_whitespace();
        }
        if self.pos != self.input.len() {
            return malformed(format!(
                "unexpected trailing characters at position {}",
                self.pos
            ));
        }
        Ok(root)
    }
    fn parse_child(&mut self) -> Result<NodeId> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'(') => self.parse_subtree(),
            Some(c) if c.is_ascii_digit() => self.parse_leaf(),
            Some(c) => malformed(format!(
                "expected a subtree or a leaf but found '{}' at position {}",
                c as char, self.pos
            )),
            None => malformed("unexpected end of the topology".to_string()),
        }
    }
    fn parse_subtree(&mut self) -> Result<NodeId> {
        self.expect(b'(')?;
        let left = self.parse_child()?;
        self.skip_whitespace();
        if self.peek() == Some(b')') {
            return malformed(format!(
                "internal node closing at position {} has a single child",
                self.pos
            ));
        }
        self.expect(b',')?;
        let right = self.parse_child()?;
        self.skip_whitespace();
        if self.peek() == Some(b',') {
            return malformed(format!(
                "internal node at position {} has more than two children",
                self.pos
            ));
        }
        self.expect(b')')?;
        self.skip_whitespace();
        let branch_length = match self.peek() {
            Some(b':') => {
                self.pos += 1;
                self.parse_length()?
            }
            Some(c) if is_float_char(c) => self.parse_length()?,
            _ => 0.0,
        };
        Ok(self.push(Node::internal(left, right, branch_length)))
    }
    fn parse_leaf(&mut self) -> Result<NodeId> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse::<usize>().ok());
        let seq_index = match name {
            Some(seq_index) => seq_index,
            None => return malformed(format!("invalid leaf name at position {}", start)),
        };
        if seq_index >= self.used.len() {
            return malformed(format!(
                "leaf {} is out of range (alignment has {} sequences)",
                seq_index,
                self.used.len()
            ));
        }
        if self.used[seq_index] {
            return malformed(format!("leaf {} appears twice", seq_index));
        }
        self.used[seq_index] = true;

        self.skip_whitespace();
        let branch_length = if self.peek() == Some(b':') {
            self.pos += 1;
            self.parse_length()?
        } else {
            0.0
        };
        Ok(self.push(Node::leaf(seq_index, branch_length)))
    }
    fn parse_length(&mut self) -> Result<f64> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_float_char(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        match text.parse::<f64>() {
            Ok(length) if length.is_finite() && length >= 0.0 => Ok(length),
            Ok(length) => malformed(format!(
                "branch length {} at position {} must be a non-negative number",
                length, start
            )),
            Err(_) => malformed(format!(
                "invalid branch length {:?} at position {}",
                text, start
            )),
        }
    }
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId::new(self.nodes.len() - 1)
    }
}

fn is_float_char(c: u8) -> bool {
    c.is_ascii_digit() || matches!(c, b'.' | b'-' | b'+' | b'e' | b'E')
}
