use fnv::FnvHashMap;

use crate::fst::Label;
use crate::model::{
    pdf_sequence, resolve_pdfs, ContextDependency, PdfId, Phone, TransitionModel,
};

/// One entry of the ilabel catalog: the output alphabet of the H transducer.
/// Index 0 is reserved and holds the ε entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IlabelEntry {
    Epsilon,
    Window(Vec<Phone>),
    Disambig(Label),
}

/// Canonicalises a catalog by merging context windows that resolve to the
/// same (central phone, pdf-sequence), i.e. windows whose phone acceptors are
/// structurally identical.  Returns, for every new index, a representative
/// old index; the ε entry and disambiguation entries each keep a class of
/// their own.
///
/// Panics if the tree cannot resolve one of the windows.
pub fn ilabel_mapping<C, M>(catalog: &[IlabelEntry], tree: &C, model: &M) -> Vec<usize>
where
    C: ContextDependency + ?Sized,
    M: TransitionModel + ?Sized,
{
    let mut new2old = Vec::new();
    let mut classes: FnvHashMap<(Phone, Vec<PdfId>), usize> = FnvHashMap::default();
    for (old, entry) in catalog.iter().enumerate() {
        match entry {
            IlabelEntry::Epsilon | IlabelEntry::Disambig(_) => new2old.push(old),
            IlabelEntry::Window(window) => {
                let phone = window[tree.central_position()];
                let topo = model.topology_for(phone);
                let pdfs = match resolve_pdfs(tree, window, topo) {
                    Some(pdfs) => pdf_sequence(&pdfs),
                    None => panic!("tree cannot resolve context window {:?}", window),
                };
                if !classes.contains_key(&(phone, pdfs.clone())) {
                    classes.insert((phone, pdfs), new2old.len());
                    new2old.push(old);
                }
            }
        }
    }
    new2old
}
