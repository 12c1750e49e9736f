pub mod table;
pub mod topology;

pub use self::table::{MonophoneTree, TableTree, VecTransitionModel};
pub use self::topology::{PhoneTopology, TopoArc, TopoState};

use log_domain::LogDomain;

use crate::fst::Label;

pub type Phone = u32;
pub type PdfId = usize;
pub type Word = u32;

/// Transition-id: the atomic label of an HMM transition instance.  `0` is
/// never a valid transition-id (it is ε on the transducer side).
pub type Tid = u32;

/// The phonetic decision tree, seen from the graph-compilation side: a map
/// from a context window and a pdf-class to a pdf-id.
pub trait ContextDependency {
    fn context_width(&self) -> usize;
    fn central_position(&self) -> usize;

    /// Pdf-id for pdf-class `pdf_class` of the central phone of `window`, or
    /// `None` if the tree does not cover this window.
    fn compute(&self, window: &[Phone], pdf_class: usize) -> Option<PdfId>;
}

/// The transition model, seen from the graph-compilation side.  Every query
/// taking a [`Tid`] panics on an id outside `1..=num_tids()`; such ids are a
/// caller error, not a runtime condition.
pub trait TransitionModel {
    fn num_tids(&self) -> usize;

    fn is_transition_id(&self, label: Label) -> bool {
        label >= 1 && label as usize <= self.num_tids()
    }

    fn phone_of(&self, tid: Tid) -> Phone;
    fn hmm_state_of(&self, tid: Tid) -> usize;
    fn arc_index_of(&self, tid: Tid) -> usize;

    /// Pdf-id whose distribution scores the frame consumed by `tid`.
    fn pdf_of(&self, tid: Tid) -> PdfId;

    fn probability(&self, tid: Tid) -> LogDomain<f64>;
    fn is_self_loop(&self, tid: Tid) -> bool;

    /// Self-loop transition-id at the HMM state `tid` leaves from, if that
    /// state admits one.
    fn self_loop_of(&self, tid: Tid) -> Option<Tid>;

    /// Self-loop transition-id at the HMM state `tid` enters, if that state
    /// admits one.
    fn self_loop_following(&self, tid: Tid) -> Option<Tid>;

    /// Transition-id of arc `arc_index` out of `state` of `phone`'s topology
    /// under the pdf assignment `pdfs` (one pdf-id per emitting state, in
    /// state order).  `None` if that phone-in-context is not registered.
    fn tid(&self, phone: Phone, pdfs: &[PdfId], state: usize, arc_index: usize) -> Option<Tid>;

    fn topology_of(&self, phone: Phone) -> Option<&PhoneTopology>;

    fn topology_for(&self, phone: Phone) -> &PhoneTopology {
        match self.topology_of(phone) {
            Some(topo) => topo,
            None => panic!("no topology for phone {}", phone),
        }
    }

    /// Whether alignments produced against this model place self-loops after
    /// the forward transition into a state instead of before the transition
    /// out of it.
    fn uses_reordered_alignments(&self) -> bool;
}

/// HMM state entered by `tid` within its phone's topology.
pub fn entered_state<M: TransitionModel + ?Sized>(model: &M, tid: Tid) -> usize {
    let topo = model.topology_for(model.phone_of(tid));
    topo.states[model.hmm_state_of(tid)].arcs[model.arc_index_of(tid)].to
}

/// Whether `tid` enters a final state of its phone's topology.
pub fn enters_final<M: TransitionModel + ?Sized>(model: &M, tid: Tid) -> bool {
    let topo = model.topology_for(model.phone_of(tid));
    topo.is_final(entered_state(model, tid))
}

/// Pdf-ids of every state of `topo` in context `window`, aligned with the
/// state list (`None` for non-emitting states).  `None` overall if the tree
/// cannot resolve the window.
pub fn resolve_pdfs<C: ContextDependency + ?Sized>(
    tree: &C,
    window: &[Phone],
    topo: &PhoneTopology,
) -> Option<Vec<Option<PdfId>>> {
    if window.len() != tree.context_width() {
        return None;
    }
    let mut pdfs = Vec::with_capacity(topo.states.len());
    for state in &topo.states {
        match state.pdf_class {
            Some(pdf_class) => pdfs.push(Some(tree.compute(window, pdf_class)?)),
            None => pdfs.push(None),
        }
    }
    Some(pdfs)
}

/// Compacts an aligned pdf assignment into the (phone, pdf-sequence) key used
/// for caching and catalog canonicalisation.
pub fn pdf_sequence(pdfs: &[Option<PdfId>]) -> Vec<PdfId> {
    pdfs.iter().filter_map(|p| *p).collect()
}
