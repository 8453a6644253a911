//! Queue operation validator
//!
//! Pure cost and eligibility computation. The validator is handed a queue,
//! a clock snapshot, and a balance snapshot; it never reads the ledger or the
//! clock itself and never mutates anything.
//!
//! Every violated precondition is reported, not just the first, so a caller can
//! show all blocking reasons at once. Affordability is kept separate from
//! `validation_errors` and derived by comparing `token_costs` to the balances.

use std::collections::BTreeMap;

use super::{QueueOperation, QueueOperationCost, QueueOperationKind, QueueRules, QueueViolation};
use crate::events::RemovalReason;
use crate::{ClockSnapshot, Currency, Letter, LetterQueue, TimeBlock, TokenBalances};

/// Everything outside the queue that validation depends on.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub clock: ClockSnapshot,
    pub balances: &'a TokenBalances,
    pub rules: &'a QueueRules,
    /// Day the morning swap was last used, if ever.
    pub last_morning_swap_day: Option<u32>,
}

/// An operation that passed validation and affordability against a specific
/// queue and balance snapshot.
///
/// Only [`authorize`] can construct one. [`LetterQueue::apply`] consumes it
/// and refuses plans issued against an older revision of the queue, so an
/// unvalidated mutation cannot be expressed outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOperation {
    operation: QueueOperation,
    token_costs: BTreeMap<Currency, u32>,
    change: PlannedChange,
    revision: u64,
}

/// Slot-level mutation an operation resolves to once the rules are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlannedChange {
    Swap { first: usize, second: usize },
    MoveToFront { from: usize },
    ExtendDeadline { position: usize, days: u32 },
    Remove { position: usize, reason: RemovalReason },
    Relocate { from: usize, to: usize },
}

impl ValidatedOperation {
    pub fn operation(&self) -> &QueueOperation {
        &self.operation
    }

    pub fn kind(&self) -> QueueOperationKind {
        self.operation.kind()
    }

    /// Exact amounts to debit before applying.
    pub fn token_costs(&self) -> &BTreeMap<Currency, u32> {
        &self.token_costs
    }

    pub(crate) fn change(&self) -> PlannedChange {
        self.change
    }

    /// Queue revision the plan was checked against.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}

/// Why [`authorize`] refused an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The full cost preview that was evaluated.
    pub cost: QueueOperationCost,
    /// Validation errors followed by affordability shortfalls. Never empty.
    pub violations: Vec<QueueViolation>,
}

impl Rejection {
    pub fn primary_reason(&self) -> Option<&QueueViolation> {
        self.violations.first()
    }
}

/// Computes the cost and every violated precondition for `operation`.
pub fn validate_operation(
    operation: &QueueOperation,
    queue: &LetterQueue,
    ctx: &ValidationContext<'_>,
) -> QueueOperationCost {
    let mut cost = QueueOperationCost::default();
    let rules = ctx.rules;

    match operation {
        QueueOperation::MorningSwap { first, second } => {
            cost.requires_morning_time = true;
            if ctx.clock.time_block != TimeBlock::Dawn {
                cost.reject(QueueViolation::WrongTimeBlock {
                    required: TimeBlock::Dawn,
                    actual: ctx.clock.time_block,
                });
            }
            if rules.morning_swap_once_per_day && ctx.last_morning_swap_day == Some(ctx.clock.day)
            {
                cost.reject(QueueViolation::DailyLimitReached { day: ctx.clock.day });
            }
            // Either slot may be empty; only the range matters.
            require_in_range(&mut cost, queue, *first);
            require_in_range(&mut cost, queue, *second);
            if first == second {
                cost.reject(QueueViolation::invalid_arguments(
                    "morning swap needs two different positions",
                ));
            }
        }

        QueueOperation::PriorityMove { from } => {
            if let Some(letter) = require_letter(&mut cost, queue, *from) {
                cost.charge(letter.currency_type(), rules.priority_move_cost(*from));
            }
            if *from == 1 {
                cost.reject(QueueViolation::invalid_arguments(
                    "letter is already at position 1",
                ));
            }
        }

        QueueOperation::ExtendDeadline { position } => {
            if let Some(letter) = require_letter(&mut cost, queue, *position) {
                cost.charge(letter.currency_type(), rules.extend_deadline_cost);
                if !letter.has_deadline() {
                    cost.reject(QueueViolation::invalid_arguments(
                        "letter has no deadline to extend",
                    ));
                }
            }
        }

        QueueOperation::Deliver => {
            cost.requires_position_1 = true;
            require_letter(&mut cost, queue, 1);
        }

        QueueOperation::SkipDeliver { position } => {
            if let Some(letter) = require_letter(&mut cost, queue, *position) {
                cost.charge(letter.currency_type(), rules.skip_deliver_cost(*position));
            }
            if *position == 1 {
                cost.reject(QueueViolation::invalid_arguments(
                    "position 1 is delivered directly, not skipped to",
                ));
            }
        }

        QueueOperation::Reorder { from, to } => {
            if let Some(letter) = require_letter(&mut cost, queue, *from) {
                cost.charge(letter.currency_type(), rules.reorder_cost);
            }
            require_in_range(&mut cost, queue, *to);
            if from == to {
                cost.reject(QueueViolation::invalid_arguments(
                    "reorder needs different source and target positions",
                ));
            }
        }

        QueueOperation::Purge { payment } => {
            require_letter(&mut cost, queue, queue.capacity());
            let offered: u32 = payment.values().fold(0, |acc, n| acc.saturating_add(*n));
            if offered != rules.purge_cost {
                cost.reject(QueueViolation::invalid_arguments(format!(
                    "purge costs exactly {} tokens, {} offered",
                    rules.purge_cost, offered
                )));
            }
            for (currency, amount) in payment {
                cost.charge(*currency, *amount);
            }
        }
    }

    cost
}

/// True iff the operation has no validation errors and the balances cover it.
pub fn can_perform(
    operation: &QueueOperation,
    queue: &LetterQueue,
    ctx: &ValidationContext<'_>,
) -> bool {
    let cost = validate_operation(operation, queue, ctx);
    cost.is_valid() && cost.is_affordable_with(ctx.balances)
}

/// Validates `operation` and checks affordability in one step.
///
/// On success the returned plan carries the exact debit amounts; on failure
/// the rejection lists every unmet precondition with the primary one first.
pub fn authorize(
    operation: &QueueOperation,
    queue: &LetterQueue,
    ctx: &ValidationContext<'_>,
) -> Result<ValidatedOperation, Rejection> {
    let cost = validate_operation(operation, queue, ctx);
    let violations = cost.unmet_preconditions(ctx.balances);
    if !violations.is_empty() {
        return Err(Rejection { cost, violations });
    }

    Ok(ValidatedOperation {
        operation: operation.clone(),
        token_costs: cost.token_costs,
        change: plan_change(operation, queue, ctx.rules),
        revision: queue.revision(),
    })
}

fn plan_change(
    operation: &QueueOperation,
    queue: &LetterQueue,
    rules: &QueueRules,
) -> PlannedChange {
    match operation {
        QueueOperation::MorningSwap { first, second } => PlannedChange::Swap {
            first: *first,
            second: *second,
        },
        QueueOperation::PriorityMove { from } => PlannedChange::MoveToFront { from: *from },
        QueueOperation::ExtendDeadline { position } => PlannedChange::ExtendDeadline {
            position: *position,
            days: rules.extend_deadline_bonus_days,
        },
        QueueOperation::Deliver => PlannedChange::Remove {
            position: 1,
            reason: RemovalReason::Delivered,
        },
        QueueOperation::SkipDeliver { position } => PlannedChange::Remove {
            position: *position,
            reason: RemovalReason::SkipDelivered,
        },
        QueueOperation::Reorder { from, to } => PlannedChange::Relocate {
            from: *from,
            to: *to,
        },
        QueueOperation::Purge { .. } => PlannedChange::Remove {
            position: queue.capacity(),
            reason: RemovalReason::Purged,
        },
    }
}

fn require_in_range(cost: &mut QueueOperationCost, queue: &LetterQueue, position: usize) -> bool {
    if (1..=queue.capacity()).contains(&position) {
        true
    } else {
        cost.reject(QueueViolation::OutOfRange {
            position,
            capacity: queue.capacity(),
        });
        false
    }
}

fn require_letter<'q>(
    cost: &mut QueueOperationCost,
    queue: &'q LetterQueue,
    position: usize,
) -> Option<&'q Letter> {
    if !require_in_range(cost, queue, position) {
        return None;
    }
    match queue.get(position) {
        Ok(Some(letter)) => Some(letter),
        Ok(None) => {
            cost.reject(QueueViolation::PositionNotOccupied { position });
            None
        }
        Err(violation) => {
            cost.reject(violation);
            None
        }
    }
}
