//! Byte-pattern recognizers for block openers, inline delimiters, and
//! attribute blocks. Each matcher is a pure function over a `TextReader`
//! position; none of them mutate anything or retain state between calls.

pub mod attribute;
pub mod block;
pub mod inline;
