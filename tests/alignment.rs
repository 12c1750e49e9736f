extern crate fnv;
extern crate hmmfst;
extern crate rand;

use std::collections::BTreeMap;

use fnv::FnvHashMap;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use hmmfst::align::{convert_alignment, random_alignment_for_phone, split_to_phones};
use hmmfst::model::{MonophoneTree, PhoneTopology, TransitionModel, VecTransitionModel};
use hmmfst::AlignError;

const SEED: [u8; 16] = [42; 16];

fn example_inventory() -> BTreeMap<u32, PhoneTopology> {
    let mut topos = BTreeMap::new();
    topos.insert(1, PhoneTopology::linear(&[(0.5, 0.5), (0.4, 0.6)]));
    topos.insert(2, PhoneTopology::linear(&[(0.75, 0.25)]));
    topos.insert(3, PhoneTopology::linear(&[(0.5, 0.5), (0.5, 0.5), (0.5, 0.5)]));
    topos
}

fn monophone(reorder: bool) -> (MonophoneTree, VecTransitionModel) {
    let topos = example_inventory();
    let tree = MonophoneTree::new(&topos);
    let model = VecTransitionModel::monophone(topos, &tree, reorder);
    (tree, model)
}

/// Utterance built from per-phone random walks, with per-phone lengths.
fn utterance(
    tree: &MonophoneTree,
    model: &VecTransitionModel,
    lengths: &[(u32, usize)],
    rng: &mut SmallRng,
) -> Vec<u32> {
    let mut alignment = Vec::new();
    for &(phone, length) in lengths {
        alignment.extend(random_alignment_for_phone(tree, model, &[phone], length, rng));
    }
    alignment
}

#[test]
fn segmentation_concatenates_back_to_the_input() {
    let (tree, model) = monophone(false);
    let mut rng: SmallRng = SeedableRng::from_seed(SEED);
    let lengths = [(1u32, 5usize), (2, 1), (3, 7), (1, 2), (2, 4)];
    let alignment = utterance(&tree, &model, &lengths, &mut rng);

    let segments = split_to_phones(&model, &alignment).unwrap();
    assert_eq!(segments.len(), lengths.len());
    for (segment, &(phone, length)) in segments.iter().zip(lengths.iter()) {
        assert_eq!(segment.len(), length);
        for &tid in segment {
            assert_eq!(model.phone_of(tid), phone);
        }
    }
    let concat: Vec<u32> = segments.into_iter().flatten().collect();
    assert_eq!(concat, alignment);
}

#[test]
fn identity_conversion_is_exact_even_reordered() {
    for &reorder in &[false, true] {
        let (tree, model) = monophone(false);
        let mut rng: SmallRng = SeedableRng::from_seed(SEED);
        let mut alignment = utterance(&tree, &model, &[(1, 4), (3, 3), (2, 2)], &mut rng);

        if reorder {
            // rebuild the utterance in the reordered convention via a
            // reordered target model
            let topos = example_inventory();
            let rtree = MonophoneTree::new(&topos);
            let rmodel = VecTransitionModel::monophone(topos, &rtree, true);
            alignment = convert_alignment(
                &model, &rmodel, &rtree, &alignment, 1, false, None, &mut rng,
            )
            .unwrap();
            let converted = convert_alignment(
                &rmodel, &rmodel, &rtree, &alignment, 1, false, None, &mut rng,
            )
            .unwrap();
            assert_eq!(converted, alignment);
        } else {
            let converted = convert_alignment(
                &model, &model, &tree, &alignment, 1, false, None, &mut rng,
            )
            .unwrap();
            assert_eq!(converted, alignment);
        }
    }
}

#[test]
fn subsampling_conserves_lengths() {
    let (tree, model) = monophone(false);
    let mut rng: SmallRng = SeedableRng::from_seed(SEED);
    let alignment = utterance(&tree, &model, &[(1, 6), (3, 12), (2, 3)], &mut rng);

    let halved = convert_alignment(
        &model, &model, &tree, &alignment, 2, false, None, &mut rng,
    )
    .unwrap();
    assert_eq!(halved.len(), alignment.len() / 2);

    let repeated = convert_alignment(
        &model, &model, &tree, &alignment, 2, true, None, &mut rng,
    )
    .unwrap();
    assert_eq!(repeated.len(), alignment.len());

    let tripled = convert_alignment(
        &model, &model, &tree, &alignment, 3, true, None, &mut rng,
    )
    .unwrap();
    assert_eq!(tripled.len(), alignment.len());
}

#[test]
fn phone_remapping_retargets_the_inventory() {
    let (tree, old_model) = monophone(false);
    let mut rng: SmallRng = SeedableRng::from_seed(SEED);
    let alignment = utterance(&tree, &old_model, &[(1, 4), (2, 2)], &mut rng);

    // the new inventory only knows phones 8 and 9
    let mut new_topos = BTreeMap::new();
    new_topos.insert(8, PhoneTopology::linear(&[(0.5, 0.5), (0.4, 0.6)]));
    new_topos.insert(9, PhoneTopology::linear(&[(0.3, 0.7)]));
    let new_tree = MonophoneTree::new(&new_topos);
    let new_model = VecTransitionModel::monophone(new_topos, &new_tree, false);

    let mut map = FnvHashMap::default();
    map.insert(1u32, 8u32);
    map.insert(2u32, 9u32);
    let converted = convert_alignment(
        &old_model, &new_model, &new_tree, &alignment, 1, false, Some(&map), &mut rng,
    )
    .unwrap();
    assert_eq!(converted.len(), alignment.len());

    let segments = split_to_phones(&new_model, &converted).unwrap();
    assert_eq!(new_model.phone_of(segments[0][0]), 8);
    assert_eq!(new_model.phone_of(segments[1][0]), 9);
    assert_eq!(segments[0].len(), 4);
    assert_eq!(segments[1].len(), 2);
}

#[test]
fn partial_utterances_are_kept_but_flagged() {
    let (tree, model) = monophone(false);
    let mut rng: SmallRng = SeedableRng::from_seed(SEED);
    let mut alignment = utterance(&tree, &model, &[(1, 4), (3, 5)], &mut rng);
    alignment.pop();

    match split_to_phones(&model, &alignment) {
        Err(AlignError::IncompleteAlignment { segments }) => {
            let total: usize = segments.iter().map(|s| s.len()).sum();
            assert_eq!(total, alignment.len());
        }
        other => panic!("expected incomplete alignment, got {:?}", other),
    }

    match convert_alignment(&model, &model, &tree, &alignment, 1, false, None, &mut rng) {
        Err(AlignError::IncompleteAlignment { .. }) => {}
        other => panic!("expected the conversion to fail, got {:?}", other),
    }
}
