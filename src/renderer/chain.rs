//! Link counting and layout selection for chained member expressions.
//!
//! A chain is the left-leaning spine `receiver.a(...).b.c(...)`. Only the
//! spine is counted: chains inside call arguments are counted separately and
//! always render inline. The layout is chosen from the number of call links,
//! so `records.get(0).Name` stays on one line.

use crate::parser::{ChainExpression, Expression, Link};

/// How a chain's links are placed relative to its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainLayout {
    /// `receiver.a().b()`
    Inline,
    /// The receiver on its own line, then one indented line per link.
    Exploded,
}

impl ChainLayout {
    pub fn for_links(link_count: usize, threshold: usize) -> Self {
        if link_count >= threshold {
            ChainLayout::Exploded
        } else {
            ChainLayout::Inline
        }
    }
}

pub struct ChainAnalyzer;

impl ChainAnalyzer {
    /// Number of links on the spine rooted at `chain`.
    pub fn link_count(chain: &ChainExpression) -> usize {
        let mut count = 1;
        let mut receiver = chain.receiver.as_ref();
        while let Expression::Chain(inner) = receiver {
            count += 1;
            receiver = inner.receiver.as_ref();
        }
        count
    }

    /// Links on the spine that carry an argument list; this drives the layout.
    pub fn call_link_count(chain: &ChainExpression) -> usize {
        let (_, links) = Self::spine(chain);
        links
            .iter()
            .filter(|link| link.arguments.is_some())
            .count()
    }

    /// Like [`ChainAnalyzer::link_count`], but zero for anything that is not a chain.
    pub fn expression_link_count(expression: &Expression) -> usize {
        match expression {
            Expression::Chain(chain) => Self::link_count(chain),
            _ => 0,
        }
    }

    /// The innermost non-chain receiver and the links in source order.
    pub fn spine(chain: &ChainExpression) -> (&Expression, Vec<&Link>) {
        let mut links = vec![&chain.link];
        let mut receiver = chain.receiver.as_ref();
        while let Expression::Chain(inner) = receiver {
            links.push(&inner.link);
            receiver = inner.receiver.as_ref();
        }
        links.reverse();
        (receiver, links)
    }
}
