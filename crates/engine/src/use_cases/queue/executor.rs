//! Queue operation executor.
//!
//! The only code path that mutates a queue and debits a ledger in response to
//! an operation. Every attempt:
//! 1. Re-validates against the current queue, balances, and clock
//! 2. Debits each charged currency, crediting back on a refused debit
//! 3. Applies the validated plan to the queue
//! 4. Emits exactly one `QueueEvent`: success, rejection, or fault
//!
//! The executor borrows the queue and ledger mutably for the whole call, so no
//! caller can observe a debit without its mutation or the reverse.

use std::collections::BTreeMap;

use courier_domain::{
    authorize, ClockSnapshot, Currency, DomainError, LetterQueue, QueueEvent, QueueOperation,
    QueueOperationKind, QueueOperationResult, QueueRules, QueueViolation, ValidationContext,
};

use crate::infrastructure::ports::{read_clock, DeadlineClock, QueueEventSink, TokenLedger};

/// Failures that are not ordinary rejections.
///
/// Rejections (wrong time, empty slot, short balance) come back as a failed
/// [`QueueOperationResult`]. This error means the queue refused a plan the
/// validator had just issued, which is a bug.
#[derive(Debug, thiserror::Error)]
pub enum QueueExecutionError {
    #[error("Validated operation could not be applied: {0}")]
    PlanRejected(#[from] DomainError),
}

/// Borrowed view of everything one execution touches.
pub struct QueueOperationExecutor<'s> {
    pub queue: &'s mut LetterQueue,
    pub ledger: &'s mut dyn TokenLedger,
    pub clock: &'s dyn DeadlineClock,
    pub events: &'s dyn QueueEventSink,
    pub rules: &'s QueueRules,
    /// Updated when a morning swap succeeds.
    pub last_morning_swap_day: &'s mut Option<u32>,
}

impl QueueOperationExecutor<'_> {
    pub fn execute(
        self,
        operation: QueueOperation,
    ) -> Result<QueueOperationResult, QueueExecutionError> {
        let clock = read_clock(self.clock);
        let balances = self.ledger.balances();
        let ctx = ValidationContext {
            clock,
            balances: &balances,
            rules: self.rules,
            last_morning_swap_day: *self.last_morning_swap_day,
        };

        let plan = match authorize(&operation, self.queue, &ctx) {
            Ok(plan) => plan,
            Err(rejection) => {
                return Ok(self.reject(&operation, &clock, rejection.violations));
            }
        };

        let tokens_spent = plan.token_costs().clone();
        if let Err(shortfall) = debit_all(self.ledger, &tokens_spent) {
            return Ok(self.reject(&operation, &clock, vec![shortfall]));
        }

        let change = match self.queue.apply(plan) {
            Ok(change) => change,
            Err(error) => return Err(self.fault(&operation, &clock, &tokens_spent, error)),
        };

        if operation.kind() == QueueOperationKind::MorningSwap {
            *self.last_morning_swap_day = Some(clock.day);
        }

        self.events.emit(QueueEvent::succeeded(
            &operation,
            &clock,
            tokens_spent.clone(),
            change.affected_letter(),
        ));

        Ok(QueueOperationResult::succeeded(
            tokens_spent,
            self.queue.snapshot(),
        ))
    }

    /// Undoes the debits of a plan the queue refused and reports the fault.
    fn fault(
        self,
        operation: &QueueOperation,
        clock: &ClockSnapshot,
        tokens_spent: &BTreeMap<Currency, u32>,
        error: DomainError,
    ) -> QueueExecutionError {
        refund(self.ledger, tokens_spent);
        tracing::error!(
            operation = %operation.kind(),
            error = %error,
            "Queue refused a freshly validated plan"
        );
        self.events.emit(QueueEvent::faulted(operation, clock, &error));
        QueueExecutionError::PlanRejected(error)
    }

    fn reject(
        self,
        operation: &QueueOperation,
        clock: &ClockSnapshot,
        violations: Vec<QueueViolation>,
    ) -> QueueOperationResult {
        self.events
            .emit(QueueEvent::rejected(operation, clock, violations.clone()));
        QueueOperationResult::failed(violations, self.queue.snapshot())
    }
}

/// Debits every currency or none of them.
fn debit_all(
    ledger: &mut dyn TokenLedger,
    costs: &BTreeMap<Currency, u32>,
) -> Result<(), QueueViolation> {
    let mut debited = BTreeMap::new();
    for (&currency, &amount) in costs {
        if ledger.debit(currency, amount) {
            debited.insert(currency, amount);
            continue;
        }

        let available = ledger.balance(currency);
        tracing::warn!(
            currency = %currency,
            required = amount,
            available,
            "Ledger refused debit after validation passed, rolling back"
        );
        refund(ledger, &debited);
        return Err(QueueViolation::InsufficientTokens {
            currency,
            required: amount,
            available,
        });
    }
    Ok(())
}

fn refund(ledger: &mut dyn TokenLedger, amounts: &BTreeMap<Currency, u32>) {
    for (&currency, &amount) in amounts {
        ledger.credit(currency, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_domain::{Letter, TimeBlock, TokenBalances};
    use mockall::predicate::eq;

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::ports::{MockDeadlineClock, MockQueueEventSink, MockTokenLedger};

    fn queue_of(count: usize) -> LetterQueue {
        let currencies = Currency::all();
        let mut slots: Vec<Option<Letter>> = (0..count)
            .map(|i| {
                Some(Letter::new(
                    format!("Sender {}", i + 1),
                    "Recipient",
                    currencies[i % currencies.len()],
                    3,
                    5,
                ))
            })
            .collect();
        slots.resize(8, None);
        LetterQueue::from_slots(slots).expect("valid queue")
    }

    fn run(
        queue: &mut LetterQueue,
        ledger: &mut dyn TokenLedger,
        clock: &dyn DeadlineClock,
        events: &dyn QueueEventSink,
        last_swap: &mut Option<u32>,
        operation: QueueOperation,
    ) -> QueueOperationResult {
        let rules = QueueRules::default();
        QueueOperationExecutor {
            queue,
            ledger,
            clock,
            events,
            rules: &rules,
            last_morning_swap_day: last_swap,
        }
        .execute(operation)
        .expect("no internal failure")
    }

    fn expect_one_event(success: bool) -> MockQueueEventSink {
        let mut events = MockQueueEventSink::new();
        events
            .expect_emit()
            .withf(move |event| event.is_success() == success)
            .times(1)
            .return_const(());
        events
    }

    #[test]
    fn when_validation_fails_then_no_debit_and_one_rejection_event() {
        let mut queue = queue_of(3);
        let before = queue.snapshot();
        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_balances()
            .returning(|| TokenBalances::new().with(Currency::Trust, 10));
        ledger.expect_debit().never();
        ledger.expect_credit().never();
        let events = expect_one_event(false);
        let clock = FixedClock(ClockSnapshot::at(1, 15));

        let result = run(
            &mut queue,
            &mut ledger,
            &clock,
            &events,
            &mut None,
            QueueOperation::MorningSwap { first: 1, second: 3 },
        );

        assert!(!result.success);
        assert!(matches!(
            result.failure_reason,
            Some(QueueViolation::WrongTimeBlock {
                required: TimeBlock::Dawn,
                actual: TimeBlock::Afternoon,
            })
        ));
        assert!(result.tokens_spent.is_empty());
        assert_eq!(result.updated_queue, before);
        assert_eq!(queue.snapshot(), before);
    }

    #[test]
    fn when_balance_snapshot_is_short_then_insufficient_tokens_without_debit() {
        let mut queue = queue_of(4);
        let before = queue.snapshot();
        let mut ledger = MockTokenLedger::new();
        ledger.expect_balances().returning(TokenBalances::new);
        ledger.expect_debit().never();
        let events = expect_one_event(false);
        let clock = FixedClock(ClockSnapshot::at(1, 10));

        let result = run(
            &mut queue,
            &mut ledger,
            &clock,
            &events,
            &mut None,
            QueueOperation::PriorityMove { from: 4 },
        );

        assert!(!result.success);
        assert_eq!(result.unmet_preconditions.len(), 1);
        assert!(matches!(
            result.failure_reason,
            Some(QueueViolation::InsufficientTokens { required: 3, available: 0, .. })
        ));
        assert_eq!(queue.snapshot(), before);
    }

    #[test]
    fn when_ledger_refuses_a_debit_then_earlier_debits_are_credited_back() {
        let mut queue = queue_of(8);
        let before = queue.snapshot();
        let mut ledger = MockTokenLedger::new();
        ledger.expect_balances().returning(|| {
            TokenBalances::new()
                .with(Currency::Trust, 5)
                .with(Currency::Shadow, 5)
        });
        ledger
            .expect_debit()
            .with(eq(Currency::Trust), eq(1))
            .times(1)
            .return_const(true);
        ledger
            .expect_debit()
            .with(eq(Currency::Shadow), eq(2))
            .times(1)
            .return_const(false);
        ledger
            .expect_balance()
            .with(eq(Currency::Shadow))
            .return_const(1u32);
        ledger
            .expect_credit()
            .with(eq(Currency::Trust), eq(1))
            .times(1)
            .return_const(());
        let events = expect_one_event(false);
        let clock = FixedClock(ClockSnapshot::at(1, 10));

        let result = run(
            &mut queue,
            &mut ledger,
            &clock,
            &events,
            &mut None,
            QueueOperation::Purge {
                payment: BTreeMap::from([(Currency::Trust, 1), (Currency::Shadow, 2)]),
            },
        );

        assert!(!result.success);
        assert_eq!(
            result.failure_reason,
            Some(QueueViolation::InsufficientTokens {
                currency: Currency::Shadow,
                required: 2,
                available: 1,
            })
        );
        assert!(result.tokens_spent.is_empty());
        assert_eq!(queue.snapshot(), before);
    }

    #[test]
    fn when_affordable_then_debits_exact_cost_and_mutates() {
        let mut queue = queue_of(4);
        let moved = queue.slots()[3].as_ref().map(Letter::id);
        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_balances()
            .returning(|| TokenBalances::new().with(Currency::Shadow, 9));
        ledger
            .expect_debit()
            .with(eq(Currency::Shadow), eq(3))
            .times(1)
            .return_const(true);
        ledger.expect_credit().never();
        let mut events = MockQueueEventSink::new();
        events
            .expect_emit()
            .withf(move |event| match &event.outcome {
                courier_domain::QueueEventOutcome::Succeeded {
                    affected_letter, ..
                } => *affected_letter == moved,
                _ => false,
            })
            .times(1)
            .return_const(());
        let clock = FixedClock(ClockSnapshot::at(1, 10));

        let result = run(
            &mut queue,
            &mut ledger,
            &clock,
            &events,
            &mut None,
            QueueOperation::PriorityMove { from: 4 },
        );

        assert!(result.success);
        assert_eq!(result.tokens_spent, BTreeMap::from([(Currency::Shadow, 3)]));
        assert_eq!(result.updated_queue[0].as_ref().map(Letter::id), moved);
        assert_eq!(result.updated_queue, queue.snapshot());
    }

    #[test]
    fn when_queue_refuses_the_plan_then_debits_are_refunded_and_a_fault_is_emitted() {
        let mut queue = queue_of(3);
        let mut ledger = MockTokenLedger::new();
        ledger
            .expect_credit()
            .with(eq(Currency::Commerce), eq(2))
            .times(1)
            .return_const(());
        let mut events = MockQueueEventSink::new();
        events
            .expect_emit()
            .withf(|event| {
                matches!(
                    &event.outcome,
                    courier_domain::QueueEventOutcome::Faulted { error } if error.contains("stale")
                ) && event.operation == Some(QueueOperationKind::PriorityMove)
            })
            .times(1)
            .return_const(());
        let clock = FixedClock(ClockSnapshot::at(1, 10));
        let rules = QueueRules::default();
        let mut last_swap = None;
        let executor = QueueOperationExecutor {
            queue: &mut queue,
            ledger: &mut ledger,
            clock: &clock,
            events: &events,
            rules: &rules,
            last_morning_swap_day: &mut last_swap,
        };

        let error = executor.fault(
            &QueueOperation::PriorityMove { from: 2 },
            &ClockSnapshot::at(1, 10),
            &BTreeMap::from([(Currency::Commerce, 2)]),
            DomainError::constraint("stale plan"),
        );

        assert!(matches!(error, QueueExecutionError::PlanRejected(_)));
        assert_eq!(last_swap, None);
    }

    #[test]
    fn when_morning_swap_succeeds_then_day_is_recorded() {
        let mut queue = queue_of(2);
        let mut ledger = MockTokenLedger::new();
        ledger.expect_balances().returning(TokenBalances::new);
        ledger.expect_debit().never();
        let events = expect_one_event(true);

        let mut clock = MockDeadlineClock::new();
        clock.expect_current_day().return_const(4u32);
        clock.expect_current_hour().return_const(7u32);
        clock
            .expect_current_time_block()
            .return_const(TimeBlock::Dawn);
        clock.expect_hours_per_day().return_const(24u32);

        let mut last_swap = Some(3);
        let result = run(
            &mut queue,
            &mut ledger,
            &clock,
            &events,
            &mut last_swap,
            QueueOperation::MorningSwap { first: 1, second: 2 },
        );

        assert!(result.success);
        assert!(result.tokens_spent.is_empty());
        assert_eq!(last_swap, Some(4));
    }
}
