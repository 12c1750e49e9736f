pub mod acceptor;
pub mod h_transducer;
pub mod ilabel;
pub mod probs;
pub mod self_loops;

pub use self::acceptor::{phone_acceptor, HmmCache};
pub use self::h_transducer::{h_transducer, HTransducerConfig};
pub use self::ilabel::{ilabel_mapping, IlabelEntry};
pub use self::probs::{
    add_transition_probs, add_transition_probs_lattice, convert_tids_to_pdfs,
    pdf_to_tid_transducer,
};
pub use self::self_loops::add_self_loops;

use crate::fst::Label;

/// Labels at or above this value are reserved for the grammar-decoding
/// extension.  They are passed through graph transformations like
/// disambiguation symbols, whether or not they appear in a declared list.
pub const NONTERM_BIG_NUMBER: Label = 10_000_000;
