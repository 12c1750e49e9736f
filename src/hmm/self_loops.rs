use log_domain::LogDomain;
use num_traits::One;

use crate::fst::{Fst, FstArc, Label, EPSILON};
use crate::hmm::NONTERM_BIG_NUMBER;
use crate::model::{Tid, TransitionModel};

fn merge_wanted(slot: &mut Option<Tid>, tid: Option<Tid>) {
    match (slot.as_ref(), tid) {
        (Some(&a), Some(b)) => assert!(
            a == b,
            "state requires two different self-loops ({} and {})",
            a,
            b
        ),
        (None, Some(b)) => *slot = Some(b),
        _ => {}
    }
}

/// Inserts the self-loop arcs a graph was built without, in place.
///
/// Which loop belongs to which state is read off the transition-ids already
/// on the graph: an arc's id names both the HMM state it leaves and the HMM
/// state it enters, and the loop of the entered state is attached at the
/// arc's destination.  Labels at or above [`NONTERM_BIG_NUMBER`] never
/// receive loops; any other non-ε label must be a transition-id or appear in
/// `disambig_syms` (sorted, unique), otherwise the graph and the declared
/// symbols are out of sync and this panics.
///
/// With `use_weights`, a state gaining a loop of probability `p` has its
/// other outgoing weights (final weight included) rescaled so the state's
/// outgoing mass ends up exactly one; a state whose loop-free mass already
/// left out exactly `p` is unchanged apart from the new loop.  Without
/// `use_weights` loops carry weight one and nothing is rescaled.
///
/// `currently_self_loop_free` asserts that no self-loop exists yet; finding
/// one then is a caller error and panics.  When `false`, states that already
/// have their loop are left alone.
pub fn add_self_loops<M>(
    model: &M,
    disambig_syms: &[Label],
    currently_self_loop_free: bool,
    use_weights: bool,
    fst: &mut Fst<LogDomain<f64>>,
) where
    M: TransitionModel + ?Sized,
{
    assert!(
        disambig_syms.windows(2).all(|w| w[0] < w[1]),
        "disambiguation symbols must be sorted and unique"
    );

    let n = fst.num_states();
    let mut wanted: Vec<Option<Tid>> = vec![None; n];
    let mut has_loop = vec![false; n];

    for q in 0..n {
        for arc in &fst.arcs[q] {
            let label = arc.ilabel;
            if label == EPSILON || label >= NONTERM_BIG_NUMBER {
                continue;
            }
            if model.is_transition_id(label) {
                let tid = label as Tid;
                if arc.to == q && model.is_self_loop(tid) {
                    assert!(
                        !currently_self_loop_free,
                        "self-loop {} found on a graph declared self-loop-free",
                        tid
                    );
                    has_loop[q] = true;
                }
                merge_wanted(&mut wanted[q], model.self_loop_of(tid));
                merge_wanted(&mut wanted[arc.to], model.self_loop_following(tid));
            } else {
                assert!(
                    disambig_syms.binary_search(&label).is_ok(),
                    "label {} is neither a transition-id nor a declared disambiguation symbol",
                    label
                );
            }
        }
    }

    for q in 0..n {
        let loop_tid = match wanted[q] {
            Some(tid) if !has_loop[q] => tid,
            _ => continue,
        };
        let prob = model.probability(loop_tid);
        let weight = if use_weights {
            let mut mass: f64 = fst.arcs[q].iter().map(|a| a.weight.value()).sum();
            if let Some(w) = &fst.finals[q] {
                mass += w.value();
            }
            if mass > 0.0 {
                let scale = (1.0 - prob.value()) / mass;
                for arc in &mut fst.arcs[q] {
                    arc.weight = LogDomain::new((arc.weight.value() * scale).min(1.0)).unwrap();
                }
                if let Some(w) = fst.finals[q].take() {
                    fst.finals[q] = Some(LogDomain::new((w.value() * scale).min(1.0)).unwrap());
                }
            }
            prob
        } else {
            LogDomain::one()
        };
        fst.add_arc(
            q,
            FstArc {
                ilabel: loop_tid,
                olabel: EPSILON,
                weight,
                to: q,
            },
        );
    }
}
