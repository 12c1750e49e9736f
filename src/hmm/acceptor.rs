use std::rc::Rc;

use fnv::FnvHashMap;
use log_domain::LogDomain;
use num_traits::One;

use crate::fst::{Fst, FstArc};
use crate::model::{
    pdf_sequence, resolve_pdfs, ContextDependency, PdfId, Phone, TransitionModel,
};

/// Lookaside buffer for [`phone_acceptor`]: distinct context windows that
/// resolve to the same (phone, pdf-sequence) share one acceptor.  The cache
/// is owned by the caller; passing it by `&mut` serialises lookup-or-insert.
pub type HmmCache = FnvHashMap<(Phone, Vec<PdfId>), Rc<Fst<LogDomain<f64>>>>;

/// Builds the weighted acceptor of one phone in one phonetic context: every
/// transition-id sequence consistent with the phone's topology, transition-ids
/// on both label sides.
///
/// Without `include_self_loops` the loop arcs are omitted and the remaining
/// arc weights are left as they are; each state's missing mass is restored
/// later by self-loop expansion.
///
/// Panics if the tree cannot resolve the window; that means the caller
/// assembled tree, model and window inconsistently.
pub fn phone_acceptor<C, M>(
    window: &[Phone],
    tree: &C,
    model: &M,
    include_self_loops: bool,
    cache: Option<&mut HmmCache>,
) -> Rc<Fst<LogDomain<f64>>>
where
    C: ContextDependency + ?Sized,
    M: TransitionModel + ?Sized,
{
    assert_eq!(
        window.len(),
        tree.context_width(),
        "context window {:?} does not match the tree's context width {}",
        window,
        tree.context_width()
    );
    let phone = window[tree.central_position()];
    let topo = model.topology_for(phone);
    let pdfs = match resolve_pdfs(tree, window, topo) {
        Some(pdfs) => pdfs,
        None => panic!("tree cannot resolve context window {:?}", window),
    };
    let key = (phone, pdf_sequence(&pdfs));

    if let Some(ref cache) = cache {
        if let Some(fst) = cache.get(&key) {
            return Rc::clone(fst);
        }
    }

    let mut fst = Fst::new();
    for _ in 0..topo.num_states() {
        fst.add_state();
    }
    fst.set_initial(0);
    for (state, entry) in topo.states.iter().enumerate() {
        if entry.pdf_class.is_none() {
            fst.set_final(state, LogDomain::one());
            continue;
        }
        for (arc_index, arc) in entry.arcs.iter().enumerate() {
            if arc.to == state && !include_self_loops {
                continue;
            }
            let tid = match model.tid(phone, &key.1, state, arc_index) {
                Some(tid) => tid,
                None => panic!(
                    "phone {} in context {:?} is not registered with the transition model",
                    phone, window
                ),
            };
            fst.add_arc(
                state,
                FstArc {
                    ilabel: tid,
                    olabel: tid,
                    weight: arc.prob,
                    to: arc.to,
                },
            );
        }
    }
    fst.trim();

    let fst = Rc::new(fst);
    if let Some(cache) = cache {
        cache.insert(key, Rc::clone(&fst));
    }
    fst
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::model::{MonophoneTree, PhoneTopology, TableTree, VecTransitionModel};

    #[test]
    fn loop_free_acceptor_keeps_raw_forward_probabilities() {
        let mut topos = BTreeMap::new();
        topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5), (0.4, 0.6)]));
        let tree = MonophoneTree::new(&topos);
        let model = VecTransitionModel::monophone(topos, &tree, false);

        let fsa = phone_acceptor(&[1], &tree, &model, false, None);

        assert_eq!(fsa.num_states(), 3);
        assert_eq!(fsa.num_arcs(), 2);
        let a0 = &fsa.arcs[0][0];
        assert_eq!(a0.ilabel, a0.olabel);
        assert!((a0.weight.value() - 0.5).abs() < 1e-10);
        let a1 = &fsa.arcs[1][0];
        assert!((a1.weight.value() - 0.6).abs() < 1e-10);
        assert!(fsa.is_final(2));
    }

    #[test]
    fn looped_acceptor_is_stochastic() {
        let mut topos = BTreeMap::new();
        topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5), (0.4, 0.6)]));
        let tree = MonophoneTree::new(&topos);
        let model = VecTransitionModel::monophone(topos, &tree, false);

        let fsa = phone_acceptor(&[1], &tree, &model, true, None);

        assert_eq!(fsa.num_arcs(), 4);
        for q in 0..fsa.num_states() {
            if fsa.is_final(q) {
                continue;
            }
            let mass: f64 = fsa.arcs[q].iter().map(|a| a.weight.value()).sum();
            assert!((mass - 1.0).abs() < 1e-10, "state {} has mass {}", q, mass);
        }
    }

    #[test]
    fn windows_with_equal_pdf_sequences_share_one_cache_entry() {
        let mut topos = BTreeMap::new();
        topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5)]));
        let mut tree = TableTree::new(3, 1);
        // two contexts clustered to the same pdf, one kept apart
        tree.insert(vec![0, 1, 2], 0, 5);
        tree.insert(vec![3, 1, 2], 0, 5);
        tree.insert(vec![0, 1, 4], 0, 6);
        let windows = vec![vec![0, 1, 2], vec![3, 1, 2], vec![0, 1, 4]];
        let model = VecTransitionModel::new(topos, &tree, &windows, false);

        let mut cache = HmmCache::default();
        let a = phone_acceptor(&[0, 1, 2], &tree, &model, false, Some(&mut cache));
        let b = phone_acceptor(&[3, 1, 2], &tree, &model, false, Some(&mut cache));
        let c = phone_acceptor(&[0, 1, 4], &tree, &model, false, Some(&mut cache));

        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert_eq!(*a, *b);
    }

    #[test]
    #[should_panic(expected = "cannot resolve")]
    fn unresolvable_window_is_fatal() {
        let mut topos = BTreeMap::new();
        topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5)]));
        topos.insert(9, PhoneTopology::linear(&[(0.5, 0.5)]));
        let mut known = BTreeMap::new();
        known.insert(1, PhoneTopology::linear(&[(0.5, 0.5)]));
        // the tree only covers phone 1, the model carries both topologies
        let tree = MonophoneTree::new(&known);
        let model = VecTransitionModel::new(topos, &tree, &[vec![1]], false);
        phone_acceptor(&[9], &tree, &model, false, None);
    }
}
