//! Property test: the tokenizer must terminate, never panic, and keep its
//! offset invariants for arbitrary input, not just well-formed Djot.

use djotters::token::TokenList;
use djotters::tokenizer::build_djot_tokens;
use proptest::prelude::*;

fn check_invariants(document: &str, tokens: &TokenList) {
    let len = document.len();
    let mut previous_end = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        assert!(token.start <= token.end, "token {i} has start > end");
        assert!(token.end <= len, "token {i} end {} exceeds document length {len}", token.end);
        assert!(token.start >= previous_end, "token {i} overlaps the previous token");
        previous_end = token.end;

        if token.jump_to_pair != 0 {
            let pair_index = (i as isize + token.jump_to_pair) as usize;
            assert!(pair_index < tokens.len(), "token {i}'s pair index is out of range");
            let pair = &tokens[pair_index];
            assert_eq!(pair.kind, token.kind, "paired tokens {i}/{pair_index} disagree on kind");
            assert_ne!(pair.is_close, token.is_close, "paired tokens {i}/{pair_index} are both open or both close");
            assert_eq!(pair.jump_to_pair, -token.jump_to_pair, "pair deltas at {i}/{pair_index} aren't negations");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn never_panics_and_keeps_offset_invariants(document in "[-_*#>\\[\\]()^:`$\"'.,!? \\n\\ta-zA-Z0-9]{0,200}") {
        let tokens = build_djot_tokens(&document);
        check_invariants(&document, &tokens);
    }

    #[test]
    fn parsing_twice_is_idempotent(document in "[-_*#>\\[\\]()^:`$\"'.,!? \\n\\ta-zA-Z0-9]{0,200}") {
        let first = djotters::ast::parse(&document);
        let second = djotters::ast::parse(&document);
        prop_assert_eq!(first, second);
    }
}
