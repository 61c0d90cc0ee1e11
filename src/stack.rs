//! A stack of token levels with open/close pairing and commit/forget semantics.
//!
//! Each level is a flat list of tokens that starts with the token that
//! opened it. Closing a level pushes its matching close token and folds the
//! level's contents back into its parent, patching the pair deltas on the
//! first/last tokens if they form a well-formed open/close pair. Forgetting
//! a level discards its opener but still re-emits whatever children it
//! accumulated - used when a candidate opener turns out not to find a
//! matching close before some enclosing boundary.
//!
//! Pushing onto a level auto-inserts a `None`-typed filler token whenever
//! there is a byte gap between the previous token's end and the new
//! token's start, so every byte of input ends up covered by some token.

use crate::token::{DjotToken, Token, TokenList};
use std::collections::HashMap;

pub struct TokenStack {
    levels: Vec<TokenList>,
    type_levels: HashMap<DjotToken, Vec<usize>>,
}

impl Default for TokenStack {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStack {
    pub fn new() -> Self {
        TokenStack {
            levels: vec![Vec::new()],
            type_levels: HashMap::new(),
        }
    }

    pub fn last_level(&self) -> &TokenList {
        self.levels.last().expect("TokenStack always has at least one level")
    }

    pub fn last_level_mut(&mut self) -> &mut TokenList {
        self.levels.last_mut().expect("TokenStack always has at least one level")
    }

    fn push_onto(level: &mut TokenList, token: Token) {
        if let Some(last) = level.last() {
            if last.end < token.start {
                level.push(Token::new(DjotToken::None, last.end, token.start));
            }
        }
        level.push(token);
    }

    /// Push `token` onto the current level, auto-filling any preceding gap.
    pub fn push(&mut self, token: Token) {
        let level = self.last_level_mut();
        Self::push_onto(level, token);
    }

    /// Fill any gap between the last token on the current level and `until`
    /// with a single `kind`-typed filler token (used to account for bytes
    /// skipped between tokenizer sub-passes, e.g. continuation-line padding).
    pub fn fill_until(&mut self, until: usize, kind: DjotToken) {
        let level = self.last_level_mut();
        if let Some(last) = level.last() {
            if last.end < until {
                level.push(Token::new(kind, last.end, until));
            }
        }
    }

    /// Open a new level whose first (and so far only) token is `token`.
    pub fn open_level(&mut self, token: Token) {
        self.type_levels.entry(token.kind).or_default().push(self.levels.len());
        self.levels.push(vec![token]);
    }

    /// Push `token` as the close of the current level, then commit it.
    pub fn close_level(&mut self, token: Token) {
        self.push(token);
        self.pop_commit();
    }

    /// Fold the current level into its parent, patching `jump_to_pair` on
    /// the first/last tokens if they form a matching open/close pair.
    pub fn pop_commit(&mut self) {
        assert!(self.levels.len() > 1, "pop_commit: only the root level remains");
        let pop_level = self.levels.pop().unwrap();
        let n = pop_level.len();
        let opener_kind = pop_level[0].kind;
        let pair_match = !pop_level[0].is_close && pop_level[n - 1].is_close && pop_level[n - 1].kind == opener_kind;

        let mut first_position = 0;
        let mut last_position = 0;
        {
            let active = self.last_level_mut();
            for (i, token) in pop_level.into_iter().enumerate() {
                Self::push_onto(active, token);
                if i == 0 {
                    first_position = active.len() - 1;
                }
                if i == n - 1 {
                    last_position = active.len() - 1;
                }
            }
            if pair_match {
                let delta = (last_position - first_position) as isize;
                active[first_position].jump_to_pair = delta;
                active[last_position].jump_to_pair = -delta;
            }
        }
        if let Some(stack) = self.type_levels.get_mut(&opener_kind) {
            stack.pop();
        }
    }

    /// Discard the current level's opener but re-emit its children into the
    /// parent level - used when a candidate open matches no close.
    pub fn pop_forget(&mut self) {
        assert!(self.levels.len() > 1, "pop_forget: only the root level remains");
        let opener_kind = self.last_level()[0].kind;
        let pop_level = self.levels.pop().unwrap();
        {
            let active = self.last_level_mut();
            for token in pop_level.into_iter().skip(1) {
                Self::push_onto(active, token);
            }
        }
        if let Some(stack) = self.type_levels.get_mut(&opener_kind) {
            stack.pop();
        }
    }

    /// Unwind, forgetting levels, until a level opened by `kind` is on top.
    /// Returns `false` without unwinding anything if no such level is open.
    pub fn pop_forget_until(&mut self, kind: DjotToken) -> bool {
        let Some(&last_depth) = self.type_levels.get(&kind).and_then(|levels| levels.last()) else {
            return false;
        };
        while self.levels.len() > last_depth + 1 {
            self.pop_forget();
        }
        true
    }
}
