use thiserror::Error;

use crate::model::{Phone, Tid};

/// Data-quality conditions reported to the caller.
///
/// These are the recoverable failures: a malformed utterance or record should
/// be logged and skipped by the caller, not abort the pipeline.  Misuse of the
/// API itself (invalid transition-ids, impossible requests) panics instead.
#[derive(Debug, Error)]
pub enum AlignError {
    /// The alignment could be segmented, but at least one segment does not
    /// end on a final state of its phone's topology.  Carries the best-effort
    /// segmentation so partial data is not discarded.
    #[error("alignment does not end at a phone boundary")]
    IncompleteAlignment { segments: Vec<Vec<Tid>> },

    /// A phone segment is shorter than the minimum length of the topology it
    /// is being re-targeted to.
    #[error("segment of phone {phone} has {frames} frame(s), topology needs at least {min}")]
    SegmentTooShort {
        phone: Phone,
        frames: usize,
        min: usize,
    },

    /// A phone segment cannot be stretched to the requested length because no
    /// state on the topology's shortest path admits a self-loop.
    #[error("segment of phone {phone} cannot be stretched to {frames} frame(s)")]
    SegmentUnrealizable { phone: Phone, frames: usize },

    /// The supplied phone map produced a phone the target model does not know.
    #[error("phone map produced unknown phone {phone}")]
    UnknownPhone { phone: Phone },

    /// Word-boundary markers in a phone sequence are not properly nested.
    #[error("phone sequence is malformed at position {position}")]
    MalformedPhoneSequence { position: usize },

    /// The number of word groups in the phone sequence disagrees with the
    /// word sequence.
    #[error("found {groups} word group(s) for {words} word(s)")]
    WordCountMismatch { groups: usize, words: usize },
}
