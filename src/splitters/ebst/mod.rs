mod candidates;
mod ebst_splitter;
mod ebst_tree;
mod node;
mod params;
mod pruning;

pub use candidates::{Candidates, SplitCandidate};
pub use ebst_splitter::EbstSplitter;
pub use ebst_tree::{EbstTree, Keys};
pub use params::EbstSplitterParams;
