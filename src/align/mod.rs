pub mod convert;
pub mod random;

pub use self::convert::convert_alignment;
pub use self::random::random_alignment_for_phone;

use std::mem;

use crate::error::AlignError;
use crate::model::{enters_final, Tid, TransitionModel};

/// Splits a frame-level alignment into one piece per phone instance, in
/// order; the concatenation of the pieces is the input.
///
/// A piece normally ends with a transition into a final state of its phone's
/// topology, followed by that state's self-loops when the model lays
/// alignments out reordered; the model itself says which convention
/// applies.  If a piece instead ends at a phone change or at the end of the
/// input, the segmentation is still returned, inside
/// [`AlignError::IncompleteAlignment`], so callers can keep what is usable.
///
/// An id the model cannot resolve panics: the alignment belongs to a
/// different model, which is a caller error.
pub fn split_to_phones<M>(model: &M, alignment: &[Tid]) -> Result<Vec<Vec<Tid>>, AlignError>
where
    M: TransitionModel + ?Sized,
{
    if alignment.is_empty() {
        return Ok(Vec::new());
    }
    let reordered = model.uses_reordered_alignments();
    let mut segments = Vec::new();
    let mut current = Vec::new();
    let mut complete = true;

    let mut i = 0;
    while i < alignment.len() {
        let tid = alignment[i];
        assert!(
            model.is_transition_id(tid),
            "invalid transition-id {} in alignment",
            tid
        );
        current.push(tid);
        if enters_final(model, tid) {
            if reordered {
                while i + 1 < alignment.len() && model.is_self_loop(alignment[i + 1]) {
                    i += 1;
                    current.push(alignment[i]);
                }
            }
            segments.push(mem::replace(&mut current, Vec::new()));
        } else if i + 1 == alignment.len() {
            complete = false;
            segments.push(mem::replace(&mut current, Vec::new()));
        } else if model.phone_of(alignment[i + 1]) != model.phone_of(tid) {
            complete = false;
            segments.push(mem::replace(&mut current, Vec::new()));
        }
        i += 1;
    }

    if complete {
        Ok(segments)
    } else {
        Err(AlignError::IncompleteAlignment { segments })
    }
}

/// Re-lays a non-reordered per-phone piece out in the reordered convention:
/// each state's self-loops move from before the transition out of the state
/// to after the transition into it.
pub(crate) fn reorder_segment<M>(model: &M, segment: &[Tid]) -> Vec<Tid>
where
    M: TransitionModel + ?Sized,
{
    let mut out = Vec::with_capacity(segment.len());
    let mut loops = Vec::new();
    for &tid in segment {
        if model.is_self_loop(tid) {
            loops.push(tid);
        } else {
            out.push(tid);
            out.append(&mut loops);
        }
    }
    out.append(&mut loops);
    out
}
