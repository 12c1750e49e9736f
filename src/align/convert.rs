use fnv::FnvHashMap;
use rand::Rng;

use crate::align::random::{fixed_length_path, sample_path};
use crate::align::{reorder_segment, split_to_phones};
use crate::error::AlignError;
use crate::model::{
    pdf_sequence, resolve_pdfs, ContextDependency, PdfId, Phone, Tid, TransitionModel,
};

/// Rebuilds `old_alignment` against a different transition model, tree and
/// frame rate.
///
/// Frame counts are conserved segment-wise: with `subsample_factor == 1`
/// every phone keeps its length (and an alignment converted onto the very
/// model it came from is returned unchanged); with a larger factor the new
/// lengths follow the cumulative frame boundaries at the reduced rate.  With
/// `repeat_frames` the conversion runs once per sub-frame shift and the
/// candidates are interleaved, which restores the original length without
/// repeating any single candidate's frames.
///
/// `phone_map` renames phones on the way (identity where it is silent); a
/// name the new model does not know fails the conversion.  No partial output
/// is returned on failure.
pub fn convert_alignment<MO, MN, C, R>(
    old_model: &MO,
    new_model: &MN,
    new_tree: &C,
    old_alignment: &[Tid],
    subsample_factor: usize,
    repeat_frames: bool,
    phone_map: Option<&FnvHashMap<Phone, Phone>>,
    rng: &mut R,
) -> Result<Vec<Tid>, AlignError>
where
    MO: TransitionModel + ?Sized,
    MN: TransitionModel + ?Sized,
    C: ContextDependency + ?Sized,
    R: Rng,
{
    assert!(subsample_factor >= 1, "subsample factor must be at least 1");
    if !repeat_frames || subsample_factor == 1 {
        return convert_internal(
            old_model,
            new_model,
            new_tree,
            old_alignment,
            0,
            subsample_factor,
            phone_map,
            rng,
        );
    }

    // one candidate per sub-frame shift, longest first
    let mut candidates = Vec::with_capacity(subsample_factor);
    for shift in (0..subsample_factor).rev() {
        candidates.push(convert_internal(
            old_model,
            new_model,
            new_tree,
            old_alignment,
            shift,
            subsample_factor,
            phone_map,
            rng,
        )?);
    }
    let longest = candidates.iter().map(|c| c.len()).max().unwrap_or(0);
    let mut out = Vec::with_capacity(old_alignment.len());
    for i in 0..longest {
        for candidate in &candidates {
            if i < candidate.len() {
                out.push(candidate[i]);
            }
        }
    }
    Ok(out)
}

fn convert_internal<MO, MN, C, R>(
    old_model: &MO,
    new_model: &MN,
    new_tree: &C,
    old_alignment: &[Tid],
    shift: usize,
    factor: usize,
    phone_map: Option<&FnvHashMap<Phone, Phone>>,
    rng: &mut R,
) -> Result<Vec<Tid>, AlignError>
where
    MO: TransitionModel + ?Sized,
    MN: TransitionModel + ?Sized,
    C: ContextDependency + ?Sized,
    R: Rng,
{
    let segments = split_to_phones(old_model, old_alignment)?;

    let mut phones = Vec::with_capacity(segments.len());
    for segment in &segments {
        let old_phone = old_model.phone_of(segment[0]);
        let phone = match phone_map {
            Some(map) => map.get(&old_phone).cloned().unwrap_or(old_phone),
            None => old_phone,
        };
        if new_model.topology_of(phone).is_none() {
            return Err(AlignError::UnknownPhone { phone });
        }
        phones.push(phone);
    }

    let width = new_tree.context_width();
    let central = new_tree.central_position();
    let mut out = Vec::new();
    let mut frames_in = 0usize;
    for (k, segment) in segments.iter().enumerate() {
        let phone = phones[k];
        let window: Vec<Phone> = (0..width)
            .map(|j| {
                let pos = k as isize + j as isize - central as isize;
                if pos < 0 || pos as usize >= phones.len() {
                    0
                } else {
                    phones[pos as usize]
                }
            })
            .collect();

        let new_length = (frames_in + segment.len() + shift) / factor - (frames_in + shift) / factor;
        frames_in += segment.len();

        let topo = new_model.topology_for(phone);
        let min = topo.min_length();
        if new_length < min {
            return Err(AlignError::SegmentTooShort {
                phone,
                frames: new_length,
                min,
            });
        }
        let pdfs = match resolve_pdfs(new_tree, &window, topo) {
            Some(pdfs) => pdf_sequence(&pdfs),
            None => panic!("tree cannot resolve context window {:?}", window),
        };
        out.extend(convert_segment(
            old_model, new_model, phone, &pdfs, segment, new_length, factor, rng,
        )?);
    }
    Ok(out)
}

fn convert_segment<MO, MN, R>(
    old_model: &MO,
    new_model: &MN,
    phone: Phone,
    pdfs: &[PdfId],
    old_segment: &[Tid],
    new_length: usize,
    factor: usize,
    rng: &mut R,
) -> Result<Vec<Tid>, AlignError>
where
    MO: TransitionModel + ?Sized,
    MN: TransitionModel + ?Sized,
    R: Rng,
{
    let old_phone = old_model.phone_of(old_segment[0]);
    let old_topo = old_model.topology_for(old_phone);
    let new_topo = new_model.topology_for(phone);

    if new_length == old_segment.len()
        && old_topo == new_topo
        && old_model.uses_reordered_alignments() == new_model.uses_reordered_alignments()
    {
        // same length, same structure: keep the path, rewrite the ids
        let mut out = Vec::with_capacity(old_segment.len());
        for &tid in old_segment {
            let state = old_model.hmm_state_of(tid);
            let arc = old_model.arc_index_of(tid);
            match new_model.tid(phone, pdfs, state, arc) {
                Some(tid) => out.push(tid),
                None => panic!(
                    "phone {} with pdf-sequence {:?} is not registered with the transition model",
                    phone, pdfs
                ),
            }
        }
        return Ok(out);
    }

    let segment = if factor == 1 {
        fixed_length_path(new_model, phone, pdfs, new_length)?
    } else {
        match sample_path(new_model, phone, pdfs, new_length, rng) {
            Some(segment) => segment,
            None => {
                return Err(AlignError::SegmentUnrealizable {
                    phone,
                    frames: new_length,
                })
            }
        }
    };
    Ok(if new_model.uses_reordered_alignments() {
        reorder_segment(new_model, &segment)
    } else {
        segment
    })
}
