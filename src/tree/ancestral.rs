//!
//! Ancestral sequences and branch-length refinement
//!
//! * Ancestral sequence of an internal node: the base maximizing its
//!   conditional vector at each column. If both children are gaps at a
//!   column, the ancestor is a gap too.
//! * Refinement: the branch length above a node is re-estimated from the
//!   fraction of differing sites between the node's sequence and its
//!   parent's ancestral sequence, by inverting the Jukes-Cantor model.
//!
use super::{jukes_cantor_distance, NodeId, NodeKind, TreeModel};
use crate::alignment::{Alignment, Symbol};
use crate::error::Result;
use log::debug;

impl TreeModel {
    ///
    /// Sequence of every node (indexed by `NodeId::index`): the observed
    /// sequence for leaves, the argmax ancestral sequence for internal nodes.
    ///
    /// Ties are broken toward the lowest base index (A < C < G < T).
    ///
    pub fn infer_ancestral(&self, alignment: &Alignment) -> Result<Vec<Vec<Symbol>>> {
        self.check_n_seqs(alignment.n_seqs())?;
        let m = alignment.n_columns();
        let mut seqs = vec![Vec::with_capacity(m); self.n_nodes()];
        let mut buf = self.new_buffer();

        for column in alignment.columns() {
            self.fill_conditional_vectors(column, &mut buf);
            for &v in self.post_order() {
                let symbol = match self.node(v).kind() {
                    NodeKind::Leaf { seq_index } => column[seq_index],
                    NodeKind::Internal { left, right } => {
                        let left_gap = seqs[left.index()].last() == Some(&Symbol::Gap);
                        let right_gap = seqs[right.index()].last() == Some(&Symbol::Gap);
                        if left_gap && right_gap {
                            Symbol::Gap
                        } else {
                            argmax_base(&buf[v.index()])
                        }
                    }
                };
                seqs[v.index()].push(symbol);
            }
        }
        Ok(seqs)
    }
    ///
    /// Re-estimate every non-root branch length from the ancestral sequences.
    ///
    /// Branches with no comparable (non-gap in both) site keep their length.
    ///
    pub fn refine_branch_lengths(&mut self, alignment: &Alignment) -> Result<()> {
        let seqs = self.infer_ancestral(alignment)?;
        let parents = self.parents();
        for (i, parent) in parents.iter().enumerate() {
            let parent = match parent {
                Some(parent) => parent,
                None => continue,
            };
            let (n_diff, n_comparable) = count_differences(&seqs[i], &seqs[parent.index()]);
            if n_comparable == 0 {
                continue;
            }
            let d = n_diff as f64 / n_comparable as f64;
            let length = jukes_cantor_distance(d);
            debug!(
                "node {} branch {:.5} -> {:.5} (d={:.4}, n={})",
                i,
                self.node(NodeId::new(i)).branch_length(),
                length,
                d,
                n_comparable
            );
            self.set_branch_length(NodeId::new(i), length)?;
        }
        Ok(())
    }
}

fn argmax_base(v: &[f64]) -> Symbol {
    let mut best = 0;
    for x in 1..v.len() {
        if v[x] > v[best] {
            best = x;
        }
    }
    Symbol::from_index(best)
}

///
/// (#differing sites, #sites where neither is a gap)
///
fn count_differences(a: &[Symbol], b: &[Symbol]) -> (usize, usize) {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| !x.is_gap() && !y.is_gap())
        .fold((0, 0), |(n_diff, n), (x, y)| {
            (n_diff + usize::from(x != y), n + 1)
        })
}

#[cfg(test)]
mod tests {
    use super::super::MAX_BRANCH_LENGTH;
    use super::*;

    #[test]
    fn ancestral_of_identical_leaves() {
        let t = TreeModel::parse("(0:0.1,1:0.1)", 2).unwrap();
        let a = Alignment::from_seqs(&[b"ACGT-", b"ACGT-"]).unwrap();
        let seqs = t.infer_ancestral(&a).unwrap();
        let root = t.root().index();
        assert_eq!(
            seqs[root],
            vec![Symbol::A, Symbol::C, Symbol::G, Symbol::T, Symbol::Gap]
        );
        assert_eq!(seqs[0], a.sequence(0).to_vec());
    }

    #[test]
    fn ancestral_follows_majority() {
        let t = TreeModel::parse("((0:0.1,1:0.1)0.05,2:0.5)", 3).unwrap();
        let a = Alignment::from_seqs(&[b"AC", b"AC", b"GC"]).unwrap();
        let seqs = t.infer_ancestral(&a).unwrap();
        let root = t.root().index();
        assert_eq!(seqs[root], vec![Symbol::A, Symbol::C]);
        // one gap child: use the other child's evidence
        let a = Alignment::from_seqs(&[b"-", b"T", b"T"]).unwrap();
        let seqs = t.infer_ancestral(&a).unwrap();
        assert_eq!(seqs[2], vec![Symbol::T]);
        assert_eq!(seqs[root], vec![Symbol::T]);
    }

    #[test]
    fn count_differences_skips_gaps() {
        let a = [Symbol::A, Symbol::C, Symbol::Gap, Symbol::T];
        let b = [Symbol::A, Symbol::G, Symbol::A, Symbol::Gap];
        assert_eq!(count_differences(&a, &b), (1, 2));
    }

    #[test]
    fn refine_identical_sequences_shrinks_branches() {
        let mut t = TreeModel::parse("(0:0.5,1:0.5)", 2).unwrap();
        let a = Alignment::from_seqs(&[b"ACGTACGT", b"ACGTACGT"]).unwrap();
        t.refine_branch_lengths(&a).unwrap();
        for (v, _) in t.leaves() {
            assert_eq!(t.node(v).branch_length(), 0.0);
        }
    }

    #[test]
    fn refine_keeps_branches_without_comparable_sites() {
        let mut t = TreeModel::parse("(0:0.5,1:0.3)", 2).unwrap();
        let a = Alignment::from_seqs(&[b"----", b"ACGT"]).unwrap();
        t.refine_branch_lengths(&a).unwrap();
        assert_eq!(t.node(NodeId::new(0)).branch_length(), 0.5);
        assert!(t.node(NodeId::new(1)).branch_length() <= MAX_BRANCH_LENGTH);
    }
}
