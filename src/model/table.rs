use std::collections::BTreeMap;

use fnv::FnvHashMap;
use log_domain::LogDomain;

use crate::model::{
    resolve_pdfs, ContextDependency, PdfId, Phone, PhoneTopology, Tid, TransitionModel,
};

/// Context-independent tree: one pdf-id per (phone, pdf-class), numbered
/// densely in phone order.
#[derive(Clone, Debug)]
pub struct MonophoneTree {
    map: FnvHashMap<(Phone, usize), PdfId>,
    num_pdfs: usize,
}

impl MonophoneTree {
    pub fn new(topos: &BTreeMap<Phone, PhoneTopology>) -> Self {
        let mut map = FnvHashMap::default();
        let mut next = 0;
        for (&phone, topo) in topos {
            for state in &topo.states {
                if let Some(pdf_class) = state.pdf_class {
                    map.entry((phone, pdf_class)).or_insert_with(|| {
                        let pdf = next;
                        next += 1;
                        pdf
                    });
                }
            }
        }
        MonophoneTree { map, num_pdfs: next }
    }

    pub fn num_pdfs(&self) -> usize {
        self.num_pdfs
    }
}

impl ContextDependency for MonophoneTree {
    fn context_width(&self) -> usize {
        1
    }

    fn central_position(&self) -> usize {
        0
    }

    fn compute(&self, window: &[Phone], pdf_class: usize) -> Option<PdfId> {
        if window.len() != 1 {
            return None;
        }
        self.map.get(&(window[0], pdf_class)).cloned()
    }
}

/// Context-dependent tree backed by an explicit table from (window,
/// pdf-class) to pdf-id.
#[derive(Clone, Debug)]
pub struct TableTree {
    width: usize,
    central: usize,
    map: FnvHashMap<(Vec<Phone>, usize), PdfId>,
}

impl TableTree {
    pub fn new(width: usize, central: usize) -> Self {
        assert!(central < width);
        TableTree {
            width,
            central,
            map: FnvHashMap::default(),
        }
    }

    pub fn insert(&mut self, window: Vec<Phone>, pdf_class: usize, pdf: PdfId) {
        assert_eq!(window.len(), self.width);
        self.map.insert((window, pdf_class), pdf);
    }
}

impl ContextDependency for TableTree {
    fn context_width(&self) -> usize {
        self.width
    }

    fn central_position(&self) -> usize {
        self.central
    }

    fn compute(&self, window: &[Phone], pdf_class: usize) -> Option<PdfId> {
        if window.len() != self.width {
            return None;
        }
        self.map.get(&(window.to_vec(), pdf_class)).cloned()
    }
}

#[derive(Clone, Debug)]
struct TidGroup {
    phone: Phone,
    /// Pdf assignment aligned with the topology's states.
    pdfs: Vec<Option<PdfId>>,
    first_tid: Tid,
    /// Offset of each state's first transition-id within the group
    /// (`usize::MAX` for non-emitting states).
    state_offsets: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
struct TidInfo {
    group: usize,
    state: usize,
    arc: usize,
}

/// A transition model backed by plain tables: one group of transition-ids per
/// registered (phone, pdf-sequence) class, ids numbered consecutively from 1.
#[derive(Clone, Debug)]
pub struct VecTransitionModel {
    topos: BTreeMap<Phone, PhoneTopology>,
    groups: Vec<TidGroup>,
    group_index: FnvHashMap<(Phone, Vec<PdfId>), usize>,
    tids: Vec<TidInfo>,
    reorder: bool,
}

impl VecTransitionModel {
    /// Builds the model by registering one transition group per distinct
    /// (phone, pdf-sequence) among `windows`.  Panics if the tree cannot
    /// resolve one of the windows.
    pub fn new<C: ContextDependency>(
        topos: BTreeMap<Phone, PhoneTopology>,
        tree: &C,
        windows: &[Vec<Phone>],
        reorder: bool,
    ) -> Self {
        let mut model = VecTransitionModel {
            topos,
            groups: Vec::new(),
            group_index: FnvHashMap::default(),
            // index 0 stays unused so that transition-ids start at 1
            tids: vec![TidInfo { group: 0, state: 0, arc: 0 }],
            reorder,
        };
        for window in windows {
            model.register(tree, window);
        }
        model
    }

    /// Context-independent model: one transition group per phone.
    pub fn monophone(
        topos: BTreeMap<Phone, PhoneTopology>,
        tree: &MonophoneTree,
        reorder: bool,
    ) -> Self {
        let windows: Vec<Vec<Phone>> = topos.keys().map(|&p| vec![p]).collect();
        VecTransitionModel::new(topos, tree, &windows, reorder)
    }

    pub fn phones(&self) -> Vec<Phone> {
        self.topos.keys().cloned().collect()
    }

    fn register<C: ContextDependency>(&mut self, tree: &C, window: &[Phone]) {
        let phone = window[tree.central_position()];
        let topo = match self.topos.get(&phone) {
            Some(topo) => topo.clone(),
            None => panic!("window for phone {} without topology", phone),
        };
        let pdfs = match resolve_pdfs(tree, window, &topo) {
            Some(pdfs) => pdfs,
            None => panic!("tree cannot resolve context window {:?}", window),
        };
        let key: Vec<PdfId> = pdfs.iter().filter_map(|p| *p).collect();
        if self.group_index.contains_key(&(phone, key.clone())) {
            return;
        }

        let group = self.groups.len();
        let first_tid = self.tids.len() as Tid;
        let mut state_offsets = vec![usize::max_value(); topo.num_states()];
        let mut offset = 0;
        for (state, entry) in topo.states.iter().enumerate() {
            if entry.pdf_class.is_none() {
                continue;
            }
            state_offsets[state] = offset;
            for arc in 0..entry.arcs.len() {
                self.tids.push(TidInfo { group, state, arc });
            }
            offset += entry.arcs.len();
        }
        self.groups.push(TidGroup {
            phone,
            pdfs,
            first_tid,
            state_offsets,
        });
        self.group_index.insert((phone, key), group);
    }

    fn info(&self, tid: Tid) -> TidInfo {
        assert!(
            tid >= 1 && (tid as usize) < self.tids.len(),
            "invalid transition-id {}",
            tid
        );
        self.tids[tid as usize]
    }

    fn group_tid(&self, group: &TidGroup, state: usize, arc: usize) -> Tid {
        group.first_tid + group.state_offsets[state] as Tid + arc as Tid
    }

    fn topo_of_group(&self, group: &TidGroup) -> &PhoneTopology {
        &self.topos[&group.phone]
    }
}

impl TransitionModel for VecTransitionModel {
    fn num_tids(&self) -> usize {
        self.tids.len() - 1
    }

    fn phone_of(&self, tid: Tid) -> Phone {
        self.groups[self.info(tid).group].phone
    }

    fn hmm_state_of(&self, tid: Tid) -> usize {
        self.info(tid).state
    }

    fn arc_index_of(&self, tid: Tid) -> usize {
        self.info(tid).arc
    }

    fn pdf_of(&self, tid: Tid) -> PdfId {
        let info = self.info(tid);
        self.groups[info.group].pdfs[info.state].expect("emitting state without pdf")
    }

    fn probability(&self, tid: Tid) -> LogDomain<f64> {
        let info = self.info(tid);
        let topo = self.topo_of_group(&self.groups[info.group]);
        topo.states[info.state].arcs[info.arc].prob
    }

    fn is_self_loop(&self, tid: Tid) -> bool {
        let info = self.info(tid);
        let topo = self.topo_of_group(&self.groups[info.group]);
        topo.states[info.state].arcs[info.arc].to == info.state
    }

    fn self_loop_of(&self, tid: Tid) -> Option<Tid> {
        let info = self.info(tid);
        let group = &self.groups[info.group];
        let topo = self.topo_of_group(group);
        topo.self_loop_arc(info.state)
            .map(|arc| self.group_tid(group, info.state, arc))
    }

    fn self_loop_following(&self, tid: Tid) -> Option<Tid> {
        let info = self.info(tid);
        let group = &self.groups[info.group];
        let topo = self.topo_of_group(group);
        let entered = topo.states[info.state].arcs[info.arc].to;
        if topo.is_final(entered) {
            return None;
        }
        topo.self_loop_arc(entered)
            .map(|arc| self.group_tid(group, entered, arc))
    }

    fn tid(&self, phone: Phone, pdfs: &[PdfId], state: usize, arc_index: usize) -> Option<Tid> {
        let group = *self.group_index.get(&(phone, pdfs.to_vec()))?;
        let group = &self.groups[group];
        let topo = self.topo_of_group(group);
        if state >= topo.num_states() || !topo.is_emitting(state) {
            return None;
        }
        if arc_index >= topo.states[state].arcs.len() {
            return None;
        }
        Some(self.group_tid(group, state, arc_index))
    }

    fn topology_of(&self, phone: Phone) -> Option<&PhoneTopology> {
        self.topos.get(&phone)
    }

    fn uses_reordered_alignments(&self) -> bool {
        self.reorder
    }
}
