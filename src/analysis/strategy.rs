//! Template-specific handling of one cycle's recognized blocks
//!
//! Polyboard scanning accepts every qualifying label in the scan box at once.
//! ABF scanning only trusts a frame with several qualifying blocks and then
//! takes the single best-placed one.

use tracing::debug;

use super::label::{LabelValidator, TemplateType};
use super::ledger::{ClassifiedValue, DedupLedger};
use crate::shared::state::AcceptedValues;
use crate::vision::{GeometryMatcher, TextBlock};

/// Inputs shared by both strategies for one cycle
pub struct CycleContext<'a> {
    pub validator: &'a LabelValidator,
    pub geometry: &'a GeometryMatcher,
    pub accepted: &'a AcceptedValues,
}

/// Why a cycle produced no notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No block passed the filters
    NoMatches,
    /// ABF frame had fewer qualifying blocks than required
    InsufficientConfidence { found: usize, required: usize },
}

/// Result of running a strategy over one cycle's blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleDecision {
    Skip(SkipReason),
    /// Values to announce, in discovery order
    Notify(Vec<ClassifiedValue>),
}

/// Handling strategy, chosen once per session from the template type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Batch filter: every qualifying block is classified
    Polyboard,
    /// Best of batch: needs `min_matches` qualifying blocks, keeps one
    Abf { min_matches: usize },
}

impl ScanStrategy {
    pub fn for_template(template: TemplateType, abf_min_matches: usize) -> Self {
        match template {
            TemplateType::Polyboard => ScanStrategy::Polyboard,
            TemplateType::Abf => ScanStrategy::Abf {
                min_matches: abf_min_matches,
            },
        }
    }

    pub fn handle(&self, blocks: Vec<TextBlock>, ctx: &CycleContext<'_>) -> CycleDecision {
        match *self {
            ScanStrategy::Polyboard => handle_polyboard(blocks, ctx),
            ScanStrategy::Abf { min_matches } => handle_abf(blocks, ctx, min_matches),
        }
    }
}

fn handle_polyboard(blocks: Vec<TextBlock>, ctx: &CycleContext<'_>) -> CycleDecision {
    let mut ledger = DedupLedger::new(ctx.accepted);

    for block in blocks
        .iter()
        .filter(|b| ctx.validator.matches_pattern(&b.text))
        .filter(|b| ctx.geometry.contains_block(b))
    {
        match ctx.validator.in_range_value(&block.text) {
            Some(value) => {
                ledger.classify(&value);
            }
            None => debug!("Polyboard label {:?} outside accept range", block.text),
        }
    }

    let entries = ledger.into_entries();
    if entries.is_empty() {
        CycleDecision::Skip(SkipReason::NoMatches)
    } else {
        CycleDecision::Notify(entries)
    }
}

fn handle_abf(blocks: Vec<TextBlock>, ctx: &CycleContext<'_>, min_matches: usize) -> CycleDecision {
    let mut qualifying: Vec<TextBlock> = Vec::new();
    for block in blocks {
        if !ctx.validator.is_valid_label(&block.text) || !ctx.geometry.contains_block(&block) {
            continue;
        }
        if qualifying.contains(&block) {
            continue;
        }
        qualifying.push(block);
    }

    if qualifying.is_empty() {
        return CycleDecision::Skip(SkipReason::NoMatches);
    }
    if qualifying.len() < min_matches {
        debug!(
            "ABF cycle has {} qualifying block(s), {} required",
            qualifying.len(),
            min_matches
        );
        return CycleDecision::Skip(SkipReason::InsufficientConfidence {
            found: qualifying.len(),
            required: min_matches,
        });
    }

    ctx.geometry.sort_blocks(&mut qualifying);
    let best = &qualifying[0];
    let Some(value) = ctx.validator.accept(&best.text) else {
        return CycleDecision::Skip(SkipReason::NoMatches);
    };

    let mut ledger = DedupLedger::new(ctx.accepted);
    ledger.classify(&value);
    CycleDecision::Notify(ledger.into_entries())
}
