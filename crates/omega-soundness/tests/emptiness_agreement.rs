//! Agreement between the lasso-based and SCC-based emptiness strategies.
//!
//! The two strategies are independent algorithms for the same question, so
//! any disagreement on a random automaton is a bug in one of them.

use omega_algorithm::emptiness::{self, buchi, parity, rabin};
use omega_automaton::{Acceptance, GeneralizedRabinPair, ParityKind, RabinPair};
use omega_soundness::{automaton_with, random_edges, random_priority_edges};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn buchi_lasso_agrees_with_scc(seed in any::<u64>(), states in 1u32..=10, edges in 0u32..=25) {
        let automaton = automaton_with(
            Acceptance::buchi(),
            random_edges(seed, states, edges, 1, 0.4),
        );
        prop_assert_eq!(
            buchi::contains_accepting_lasso(&automaton, &[0]),
            buchi::contains_accepting_scc(&automaton, &[0], 1),
        );
    }

    #[test]
    fn rabin_lasso_agrees_with_scc(seed in any::<u64>(), states in 1u32..=10, edges in 0u32..=25, fin in 0u32..3, inf in 0u32..3) {
        let pair = RabinPair { fin, inf };
        // Keep the colours within the range the pair declares.
        let colours = fin.max(inf) + 1;
        let automaton = automaton_with(
            Acceptance::Rabin { pairs: vec![pair.clone()] },
            random_edges(seed, states, edges, colours, 0.3),
        );
        let generalized = vec![GeneralizedRabinPair::from(&pair)];
        prop_assert_eq!(
            rabin::contains_accepting_lasso(&automaton, &[0], &[pair]),
            rabin::contains_accepting_scc(&automaton, &[0], &generalized),
        );
    }

    #[test]
    fn two_pair_rabin_lasso_agrees_with_scc(seed in any::<u64>(), states in 1u32..=10, edges in 0u32..=25) {
        let pairs = vec![RabinPair { fin: 0, inf: 1 }, RabinPair { fin: 2, inf: 3 }];
        let automaton = automaton_with(
            Acceptance::Rabin { pairs: pairs.clone() },
            random_edges(seed, states, edges, 4, 0.25),
        );
        let generalized: Vec<GeneralizedRabinPair> = pairs.iter().map(Into::into).collect();
        prop_assert_eq!(
            rabin::contains_accepting_lasso(&automaton, &[0], &pairs),
            rabin::contains_accepting_scc(&automaton, &[0], &generalized),
        );
    }

    // Every edge carries a priority here; on colourless cycles the two
    // strategies inherit different conventions and are not comparable.
    #[test]
    fn parity_lasso_agrees_with_scc_sweep(seed in any::<u64>(), states in 1u32..=10, edges in 0u32..=25, priorities in 1u32..=4) {
        let edge_list = random_priority_edges(seed, states, edges, priorities);
        for kind in [ParityKind::MinEven, ParityKind::MinOdd] {
            let automaton = automaton_with(
                Acceptance::Parity { kind, sets: priorities },
                edge_list.clone(),
            );
            prop_assert_eq!(
                parity::contains_accepting_lasso(&automaton, &[0], kind, priorities),
                parity::contains_accepting_scc(&automaton, &[0], kind, priorities),
                "disagreement for {:?}", kind
            );
        }
    }

    #[test]
    fn is_empty_is_pure(seed in any::<u64>(), states in 1u32..=10, edges in 0u32..=25) {
        let automaton = automaton_with(
            Acceptance::buchi(),
            random_edges(seed, states, edges, 1, 0.4),
        );
        let first = emptiness::is_empty(&automaton);
        let second = emptiness::is_empty(&automaton);
        prop_assert_eq!(first, second);
    }
}
