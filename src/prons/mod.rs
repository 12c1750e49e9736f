use crate::error::AlignError;
use crate::model::{Phone, Word};

/// One pronunciation: a word id and the phones it spans.  Word 0 marks
/// phones outside any word, e.g. optional silence the lexicon inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronunciationRecord {
    pub word: Word,
    pub phones: Vec<Phone>,
}

/// Pairs a phone sequence carrying word-boundary markers with a word
/// sequence: every `word_start … word_end` group becomes one record with the
/// next word, every phone outside a group becomes a word-0 record of its own.
///
/// Fails (recoverably) if the groups and words do not line up or if the
/// markers are not properly nested.
pub fn phones_to_prons(
    phones: &[Phone],
    words: &[Word],
    word_start: Phone,
    word_end: Phone,
) -> Result<Vec<PronunciationRecord>, AlignError> {
    let groups = phones.iter().filter(|&&p| p == word_start).count();
    if groups != words.len() {
        return Err(AlignError::WordCountMismatch {
            groups,
            words: words.len(),
        });
    }

    let mut prons = Vec::new();
    let mut next_word = 0;
    let mut i = 0;
    while i < phones.len() {
        let p = phones[i];
        if p == 0 {
            return Err(AlignError::MalformedPhoneSequence { position: i });
        }
        if p == word_start {
            let start = i;
            i += 1;
            let mut pron = Vec::new();
            while i < phones.len() && phones[i] != word_end {
                if phones[i] == word_start || phones[i] == 0 {
                    return Err(AlignError::MalformedPhoneSequence { position: i });
                }
                pron.push(phones[i]);
                i += 1;
            }
            if i == phones.len() || pron.is_empty() {
                return Err(AlignError::MalformedPhoneSequence { position: start });
            }
            i += 1;
            prons.push(PronunciationRecord {
                word: words[next_word],
                phones: pron,
            });
            next_word += 1;
        } else if p == word_end {
            return Err(AlignError::MalformedPhoneSequence { position: i });
        } else {
            prons.push(PronunciationRecord {
                word: 0,
                phones: vec![p],
            });
            i += 1;
        }
    }
    Ok(prons)
}
