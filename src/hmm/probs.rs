use log_domain::LogDomain;
use num_traits::One;

use crate::fst::{Fst, FstArc, Label, Lattice, EPSILON};
use crate::hmm::NONTERM_BIG_NUMBER;
use crate::model::TransitionModel;

/// Writes the transition model's probabilities onto a structural graph:
/// every arc whose input label is a transition-id gets that id's probability
/// as its weight, ε and disambiguation arcs keep theirs.  An empty graph is
/// left alone.
///
/// `disambig_syms` (sorted, unique) is consulted only to verify that every
/// non-transition-id label below the reserved range was declared.
pub fn add_transition_probs<M>(
    model: &M,
    disambig_syms: &[Label],
    fst: &mut Fst<LogDomain<f64>>,
) where
    M: TransitionModel + ?Sized,
{
    if fst.is_empty() {
        return;
    }
    for q in 0..fst.num_states() {
        for arc in &mut fst.arcs[q] {
            let label = arc.ilabel;
            if label == EPSILON || label >= NONTERM_BIG_NUMBER {
                continue;
            }
            if model.is_transition_id(label) {
                arc.weight = model.probability(label);
            } else {
                assert!(
                    disambig_syms.binary_search(&label).is_ok(),
                    "label {} is neither a transition-id nor a declared disambiguation symbol",
                    label
                );
            }
        }
    }
}

/// As [`add_transition_probs`], but for a lattice: only the graph component
/// of each arc weight is written, acoustic scores stay untouched.
pub fn add_transition_probs_lattice<M>(model: &M, lattice: &mut Lattice)
where
    M: TransitionModel + ?Sized,
{
    if lattice.is_empty() {
        return;
    }
    for q in 0..lattice.num_states() {
        for arc in &mut lattice.arcs[q] {
            let label = arc.ilabel;
            if label == EPSILON || label >= NONTERM_BIG_NUMBER {
                continue;
            }
            if model.is_transition_id(label) {
                arc.weight.graph = model.probability(label);
            }
        }
    }
}

/// Transducer from pdf-ids plus one (input side) to transition-ids (output
/// side): a single looping state accepting any id sequence.  Mostly of use
/// in tests of graph-compilation pipelines.
pub fn pdf_to_tid_transducer<M>(model: &M) -> Fst<LogDomain<f64>>
where
    M: TransitionModel + ?Sized,
{
    let mut fst = Fst::new();
    let q = fst.add_state();
    fst.set_initial(q);
    fst.set_final(q, LogDomain::one());
    for tid in 1..=model.num_tids() as u32 {
        fst.add_arc(
            q,
            FstArc {
                ilabel: model.pdf_of(tid) as Label + 1,
                olabel: tid,
                weight: LogDomain::one(),
                to: q,
            },
        );
    }
    fst
}

/// Relabelling of a graph's transition-ids to pdf-ids plus one.  The
/// operation has no defined behaviour yet and always panics.
pub fn convert_tids_to_pdfs<M>(
    _model: &M,
    _disambig_syms: &[Label],
    _fst: &mut Fst<LogDomain<f64>>,
) where
    M: TransitionModel + ?Sized,
{
    unimplemented!("relabelling transition-ids to pdf-ids is not supported yet");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::hmm::acceptor::phone_acceptor;
    use crate::model::{MonophoneTree, PhoneTopology, VecTransitionModel};

    fn fixture() -> (MonophoneTree, VecTransitionModel) {
        let mut topos = BTreeMap::new();
        topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5), (0.4, 0.6)]));
        let tree = MonophoneTree::new(&topos);
        let model = VecTransitionModel::monophone(topos, &tree, false);
        (tree, model)
    }

    #[test]
    fn stripped_probabilities_are_reattached() {
        let (tree, model) = fixture();
        let mut fst = (*phone_acceptor(&[1], &tree, &model, true, None)).clone();
        for q in 0..fst.num_states() {
            for arc in &mut fst.arcs[q] {
                arc.weight = LogDomain::one();
            }
        }

        add_transition_probs(&model, &[], &mut fst);

        let rebuilt = phone_acceptor(&[1], &tree, &model, true, None);
        assert_eq!(fst, *rebuilt);
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let (_, model) = fixture();
        let mut fst = Fst::new();
        add_transition_probs(&model, &[], &mut fst);
        assert!(fst.is_empty());
    }

    #[test]
    fn lattice_weights_keep_their_acoustic_component() {
        use crate::fst::LatticeWeight;

        let (_, model) = fixture();
        let mut lattice = Lattice::new();
        let q0 = lattice.add_state();
        let q1 = lattice.add_state();
        lattice.set_initial(q0);
        lattice.set_final(q1, LatticeWeight::one());
        let acoustic = LogDomain::new(0.125).unwrap();
        lattice.add_arc(
            q0,
            FstArc {
                ilabel: 2,
                olabel: 17,
                weight: LatticeWeight {
                    graph: LogDomain::one(),
                    acoustic,
                },
                to: q1,
            },
        );

        add_transition_probs_lattice(&model, &mut lattice);

        let arc = &lattice.arcs[0][0];
        assert_eq!(arc.weight.graph, model.probability(2));
        assert_eq!(arc.weight.acoustic, acoustic);
    }

    #[test]
    fn pdf_transducer_covers_every_transition_id() {
        let (_, model) = fixture();
        let fst = pdf_to_tid_transducer(&model);
        assert_eq!(fst.num_states(), 1);
        assert_eq!(fst.num_arcs(), model.num_tids());
        for arc in &fst.arcs[0] {
            assert_eq!(arc.ilabel, model.pdf_of(arc.olabel) as Label + 1);
        }
    }
}
