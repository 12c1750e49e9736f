use log_domain::LogDomain;
use num_traits::One;

use crate::fst::{Fst, FstArc, Label, EPSILON};
use crate::hmm::acceptor::{phone_acceptor, HmmCache};
use crate::hmm::ilabel::IlabelEntry;
use crate::hmm::NONTERM_BIG_NUMBER;
use crate::model::{ContextDependency, TransitionModel};

#[derive(Clone, Debug)]
pub struct HTransducerConfig {
    /// First phone id of the reserved nonterminal range used by grammar
    /// decoding; negative when grammar decoding is not in use.
    pub nonterm_phones_offset: i32,
    pub include_self_loops: bool,
}

impl Default for HTransducerConfig {
    fn default() -> Self {
        HTransducerConfig {
            nonterm_phones_offset: -1,
            include_self_loops: false,
        }
    }
}

/// Assembles the H transducer over `catalog`: transition-ids (and
/// disambiguation symbols) on the input side, catalog indices on the output
/// side, one phone acceptor per context-window entry.  Also returns the
/// sorted, unique disambiguation symbols that appear on the input side.
///
/// Every path runs from the shared start state to the shared final state and
/// emits its catalog index on the entry arc.  Self-loops are left out unless
/// the configuration asks for them.
pub fn h_transducer<C, M>(
    catalog: &[IlabelEntry],
    tree: &C,
    model: &M,
    config: &HTransducerConfig,
) -> (Fst<LogDomain<f64>>, Vec<Label>)
where
    C: ContextDependency + ?Sized,
    M: TransitionModel + ?Sized,
{
    let mut fst = Fst::new();
    let start = fst.add_state();
    let end = fst.add_state();
    fst.set_initial(start);
    fst.set_final(end, LogDomain::one());

    let mut cache = HmmCache::default();
    let mut disambig = Vec::new();

    for (index, entry) in catalog.iter().enumerate() {
        match entry {
            IlabelEntry::Epsilon => {
                assert_eq!(index, 0, "ε catalog entry outside the reserved index 0");
            }
            IlabelEntry::Disambig(sym) => {
                assert!(index > 0, "disambiguation symbol at the reserved index 0");
                assert!(
                    !model.is_transition_id(*sym),
                    "disambiguation symbol {} collides with a transition-id",
                    sym
                );
                fst.add_arc(
                    start,
                    FstArc {
                        ilabel: *sym,
                        olabel: index as Label,
                        weight: LogDomain::one(),
                        to: end,
                    },
                );
                disambig.push(*sym);
            }
            IlabelEntry::Window(window) => {
                assert!(index > 0, "context window at the reserved index 0");
                if config.nonterm_phones_offset >= 0
                    && window.len() == 1
                    && window[0] >= config.nonterm_phones_offset as u32
                {
                    // grammar nonterminal: passed through, never phone-expanded
                    fst.add_arc(
                        start,
                        FstArc {
                            ilabel: NONTERM_BIG_NUMBER + window[0],
                            olabel: index as Label,
                            weight: LogDomain::one(),
                            to: end,
                        },
                    );
                    continue;
                }

                let member =
                    phone_acceptor(window, tree, model, config.include_self_loops, Some(&mut cache));
                if member.is_empty() {
                    continue;
                }
                let offset = fst.embed(&member);
                let member_start = offset + member.initial.expect("member acceptor without start");
                fst.add_arc(
                    start,
                    FstArc {
                        ilabel: EPSILON,
                        olabel: index as Label,
                        weight: LogDomain::one(),
                        to: member_start,
                    },
                );
                for q in offset..offset + member.num_states() {
                    for arc in &mut fst.arcs[q] {
                        arc.olabel = EPSILON;
                    }
                    if let Some(weight) = fst.finals[q].take() {
                        fst.add_arc(
                            q,
                            FstArc {
                                ilabel: EPSILON,
                                olabel: EPSILON,
                                weight,
                                to: end,
                            },
                        );
                    }
                }
            }
        }
    }

    disambig.sort();
    disambig.dedup();
    (fst, disambig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::model::{MonophoneTree, PhoneTopology, TransitionModel, VecTransitionModel};

    fn monophone_setup() -> (MonophoneTree, VecTransitionModel) {
        let mut topos = BTreeMap::new();
        topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5), (0.4, 0.6)]));
        topos.insert(2, PhoneTopology::linear(&[(0.75, 0.25)]));
        let tree = MonophoneTree::new(&topos);
        let model = VecTransitionModel::monophone(topos, &tree, false);
        (tree, model)
    }

    #[test]
    fn alphabets_follow_the_catalog() {
        let (tree, model) = monophone_setup();
        let catalog = vec![
            IlabelEntry::Epsilon,
            IlabelEntry::Window(vec![1]),
            IlabelEntry::Window(vec![2]),
            IlabelEntry::Disambig(1000),
        ];
        let (fst, disambig) = h_transducer(&catalog, &tree, &model, &HTransducerConfig::default());

        assert_eq!(disambig, vec![1000]);
        let mut outputs = Vec::new();
        for q in 0..fst.num_states() {
            for arc in &fst.arcs[q] {
                assert!(
                    arc.ilabel == EPSILON
                        || arc.ilabel == 1000
                        || model.is_transition_id(arc.ilabel),
                    "unexpected input label {}",
                    arc.ilabel
                );
                // no self-loops in the default configuration
                assert_ne!(arc.to, q);
                if arc.olabel != EPSILON {
                    outputs.push(arc.olabel);
                }
            }
        }
        outputs.sort();
        assert_eq!(outputs, vec![1, 2, 3]);
    }

    #[test]
    fn nonterm_entries_are_passed_through() {
        let (tree, model) = monophone_setup();
        let catalog = vec![IlabelEntry::Epsilon, IlabelEntry::Window(vec![50])];
        let config = HTransducerConfig {
            nonterm_phones_offset: 40,
            include_self_loops: false,
        };
        let (fst, disambig) = h_transducer(&catalog, &tree, &model, &config);

        assert!(disambig.is_empty());
        assert_eq!(fst.num_states(), 2);
        let arc = &fst.arcs[0][0];
        assert_eq!(arc.ilabel, NONTERM_BIG_NUMBER + 50);
        assert_eq!(arc.olabel, 1);
    }
}
