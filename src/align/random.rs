use rand::Rng;

use crate::error::AlignError;
use crate::model::{
    pdf_sequence, resolve_pdfs, ContextDependency, PdfId, Phone, PhoneTopology, Tid,
    TransitionModel,
};

/// `counts[r][s]`: number of topology paths from state `s` that land on an
/// exit state after exactly `r` more frames.  Plain `f64` counts; only their
/// ratios matter.
fn path_counts(topo: &PhoneTopology, length: usize) -> Vec<Vec<f64>> {
    let n = topo.num_states();
    let mut counts = vec![vec![0.0; n]; length + 1];
    for s in 0..n {
        if topo.is_final(s) {
            counts[0][s] = 1.0;
        }
    }
    for r in 1..=length {
        for s in 0..n {
            if topo.is_final(s) {
                continue;
            }
            counts[r][s] = topo.states[s].arcs.iter().map(|a| counts[r - 1][a.to]).sum();
        }
    }
    counts
}

/// Uniformly-random walk of exactly `length` frames through `phone`'s
/// topology, as transition-ids of the (phone, pdf-sequence) class `pdfs`.
/// `None` if no path of that length exists.  The result is laid out
/// non-reordered.
pub(crate) fn sample_path<M, R>(
    model: &M,
    phone: Phone,
    pdfs: &[PdfId],
    length: usize,
    rng: &mut R,
) -> Option<Vec<Tid>>
where
    M: TransitionModel + ?Sized,
    R: Rng,
{
    let topo = model.topology_for(phone);
    let counts = path_counts(topo, length);
    if counts[length][0] <= 0.0 {
        return None;
    }
    let mut out = Vec::with_capacity(length);
    let mut state = 0;
    for r in (1..=length).rev() {
        let arcs = &topo.states[state].arcs;
        let total = counts[r][state];
        let mut pick = rng.gen::<f64>() * total;
        let mut chosen = None;
        for (j, arc) in arcs.iter().enumerate() {
            let ways = counts[r - 1][arc.to];
            if ways <= 0.0 {
                continue;
            }
            chosen = Some(j);
            if pick < ways {
                break;
            }
            pick -= ways;
        }
        let j = chosen.expect("positive path count without continuable arc");
        let tid = match model.tid(phone, pdfs, state, j) {
            Some(tid) => tid,
            None => panic!(
                "phone {} with pdf-sequence {:?} is not registered with the transition model",
                phone, pdfs
            ),
        };
        out.push(tid);
        state = arcs[j].to;
    }
    debug_assert!(topo.is_final(state));
    Some(out)
}

/// Deterministic walk of exactly `length` frames: the shortest path to an
/// exit state, with the surplus spent on the first self-loop along it.
pub(crate) fn fixed_length_path<M>(
    model: &M,
    phone: Phone,
    pdfs: &[PdfId],
    length: usize,
) -> Result<Vec<Tid>, AlignError>
where
    M: TransitionModel + ?Sized,
{
    let topo = model.topology_for(phone);
    let min = topo.min_length();
    if length < min {
        return Err(AlignError::SegmentTooShort {
            phone,
            frames: length,
            min,
        });
    }

    // shortest arc path from the entry state into an exit state
    let n = topo.num_states();
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut seen = vec![false; n];
    let mut queue = std::collections::VecDeque::new();
    seen[0] = true;
    queue.push_back(0);
    let mut exit = None;
    'bfs: while let Some(q) = queue.pop_front() {
        for (j, arc) in topo.states[q].arcs.iter().enumerate() {
            if !seen[arc.to] {
                seen[arc.to] = true;
                parent[arc.to] = Some((q, j));
                if topo.is_final(arc.to) {
                    exit = Some(arc.to);
                    break 'bfs;
                }
                queue.push_back(arc.to);
            }
        }
    }
    let mut path = Vec::new();
    let mut q = exit.expect("topology without reachable exit state");
    while let Some((p, j)) = parent[q] {
        path.push((p, j));
        q = p;
    }
    path.reverse();

    let mut extra = length - path.len();
    let loop_state = path
        .iter()
        .map(|&(s, _)| s)
        .find(|&s| topo.self_loop_arc(s).is_some());
    if extra > 0 && loop_state.is_none() {
        return Err(AlignError::SegmentUnrealizable {
            phone,
            frames: length,
        });
    }

    let mut out = Vec::with_capacity(length);
    for &(s, j) in &path {
        if extra > 0 && Some(s) == loop_state {
            let lj = topo.self_loop_arc(s).unwrap();
            let loop_tid = model
                .tid(phone, pdfs, s, lj)
                .expect("phone-in-context not registered with the transition model");
            for _ in 0..extra {
                out.push(loop_tid);
            }
            extra = 0;
        }
        let tid = model
            .tid(phone, pdfs, s, j)
            .expect("phone-in-context not registered with the transition model");
        out.push(tid);
    }
    Ok(out)
}

/// Uniformly-random valid alignment of `length` frames for the central phone
/// of `window`, laid out non-reordered.  Requesting fewer frames than the
/// topology's minimum length is a caller error and panics.
pub fn random_alignment_for_phone<C, M, R>(
    tree: &C,
    model: &M,
    window: &[Phone],
    length: usize,
    rng: &mut R,
) -> Vec<Tid>
where
    C: ContextDependency + ?Sized,
    M: TransitionModel + ?Sized,
    R: Rng,
{
    let phone = window[tree.central_position()];
    let topo = model.topology_for(phone);
    let min = topo.min_length();
    assert!(
        length >= min,
        "requested {} frame(s) for phone {} whose topology needs at least {}",
        length,
        phone,
        min
    );
    let pdfs = match resolve_pdfs(tree, window, topo) {
        Some(pdfs) => pdf_sequence(&pdfs),
        None => panic!("tree cannot resolve context window {:?}", window),
    };
    match sample_path(model, phone, &pdfs, length, rng) {
        Some(path) => path,
        None => panic!(
            "phone {} has no alignment of exactly {} frame(s)",
            phone, length
        ),
    }
}
