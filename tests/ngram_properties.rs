// Property checks over randomly generated training sentences.

use cloze::language::{NgramModel, SMOOTHING};
use proptest::prelude::*;

fn sentence() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,2}", 0..8)
}

proptest! {
    #[test]
    fn context_totals_match_next_counts(
        order in 1usize..5,
        sentences in prop::collection::vec(sentence(), 1..12),
    ) {
        let mut model = NgramModel::new(order).unwrap();
        for tokens in &sentences {
            model.update(tokens);
        }

        for context in model.contexts() {
            prop_assert_eq!(context.len(), order - 1);
            let counts = model.next_counts(context).unwrap();
            let sum: u64 = counts.values().sum();
            prop_assert_eq!(model.context_total(context), sum);
        }
    }

    #[test]
    fn probabilities_stay_in_range(
        sentences in prop::collection::vec(sentence(), 1..8),
        probe in sentence(),
    ) {
        let mut model = NgramModel::new(3).unwrap();
        for tokens in &sentences {
            model.update(tokens);
        }

        let p = model.sentence_probability(&probe.join(" "));
        prop_assert!((0.0..=1.0).contains(&p));

        if !probe.is_empty() {
            let perplexity = model.perplexity_tokens(&probe).unwrap();
            prop_assert!(perplexity.is_finite());
            prop_assert!(perplexity >= 1.0);
            // every window, the end window included, is floored at SMOOTHING
            let windows = (probe.len() + 1) as f64;
            let ceiling = -SMOOTHING.ln() * windows / probe.len() as f64;
            prop_assert!(perplexity.ln() <= ceiling + 1e-9);
        }
    }

    #[test]
    fn updates_only_grow_counts(
        first in sentence(),
        second in sentence(),
    ) {
        let mut model = NgramModel::new(2).unwrap();
        model.update(&first);
        let before: Vec<(Vec<String>, u64)> = model
            .contexts()
            .map(|c| (c.to_vec(), model.context_total(c)))
            .collect();

        model.update(&second);
        for (context, total) in before {
            prop_assert!(model.context_total(&context) >= total);
        }
    }
}
