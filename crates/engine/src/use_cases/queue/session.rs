//! Player queue session.
//!
//! Owns one player's queue and ledger together, so the executor can change
//! both or neither. `&mut self` is the exclusion scope; the server-hosted
//! registry wraps each session in its own lock.

use std::sync::Arc;

use courier_domain::{
    can_perform, project_deadline_impact, validate_operation, ClockSnapshot, DeadlineImpact,
    DomainError, Letter, LetterQueue, QueueChange, QueueEvent, QueueOperation, QueueOperationCost,
    QueueOperationResult, QueueRules, QueueViolation, RemovalReason, SessionId, TokenBalances,
    ValidationContext,
};

use super::executor::{QueueExecutionError, QueueOperationExecutor};
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::ledger::InMemoryTokenLedger;
use crate::infrastructure::ports::{read_clock, DeadlineClock, QueueEventSink, TokenLedger};

/// A letter the queue gave up without delivering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedLetter {
    /// Position the letter held before removal.
    pub position: usize,
    pub letter: Letter,
    /// `Expired` or `Displaced`.
    pub reason: RemovalReason,
    /// Tokens actually taken; capped at the balance on hand.
    pub penalty: u32,
}

/// Facade over one player's queue for UI and command layers.
pub struct QueueSession {
    id: SessionId,
    queue: LetterQueue,
    ledger: Box<dyn TokenLedger>,
    clock: Arc<dyn DeadlineClock>,
    events: Arc<dyn QueueEventSink>,
    rules: QueueRules,
    last_morning_swap_day: Option<u32>,
}

impl QueueSession {
    pub fn new(
        queue: LetterQueue,
        ledger: Box<dyn TokenLedger>,
        clock: Arc<dyn DeadlineClock>,
        events: Arc<dyn QueueEventSink>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            queue,
            ledger,
            clock,
            events,
            rules: QueueRules::default(),
            last_morning_swap_day: None,
        }
    }

    /// Fresh session with an empty queue and uniform starting balances.
    pub fn from_config(
        config: &EngineConfig,
        clock: Arc<dyn DeadlineClock>,
        events: Arc<dyn QueueEventSink>,
    ) -> Result<Self, DomainError> {
        let queue = LetterQueue::new(config.queue_capacity)?;
        let ledger = InMemoryTokenLedger::with_uniform_balance(config.starting_tokens);
        Self::new(queue, Box::new(ledger), clock, events).with_rules(config.rules.clone())
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Replaces the default rules. Rules that would make a longer priority
    /// move cheaper, or a skip-delivery no dearer than move-then-deliver, are
    /// refused.
    pub fn with_rules(mut self, rules: QueueRules) -> Result<Self, DomainError> {
        rules.validate()?;
        self.rules = rules;
        Ok(self)
    }

    /// Restores the once-per-day swap marker, e.g. from a save.
    pub fn with_last_morning_swap_day(mut self, day: Option<u32>) -> Self {
        self.last_morning_swap_day = day;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn queue(&self) -> &LetterQueue {
        &self.queue
    }

    pub fn snapshot(&self) -> Vec<Option<Letter>> {
        self.queue.snapshot()
    }

    pub fn rules(&self) -> &QueueRules {
        &self.rules
    }

    pub fn balances(&self) -> TokenBalances {
        self.ledger.balances()
    }

    pub fn clock(&self) -> ClockSnapshot {
        read_clock(self.clock.as_ref())
    }

    pub fn last_morning_swap_day(&self) -> Option<u32> {
        self.last_morning_swap_day
    }

    /// Cost and blocking reasons for `operation`, without side effects.
    pub fn preview(&self, operation: &QueueOperation) -> QueueOperationCost {
        let balances = self.ledger.balances();
        validate_operation(operation, &self.queue, &self.context(&balances))
    }

    pub fn can_perform(&self, operation: &QueueOperation) -> bool {
        let balances = self.ledger.balances();
        can_perform(operation, &self.queue, &self.context(&balances))
    }

    pub fn project_deadline_impact(&self, hours: u32) -> DeadlineImpact {
        project_deadline_impact(&self.queue, &self.clock(), hours)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Re-validates and performs `operation`. Rejections come back as a
    /// failed result; the error case is reserved for internal faults.
    pub fn execute(
        &mut self,
        operation: QueueOperation,
    ) -> Result<QueueOperationResult, QueueExecutionError> {
        tracing::debug!(
            session_id = %self.id,
            operation = %operation.kind(),
            positions = ?operation.positions(),
            "Executing queue operation"
        );
        QueueOperationExecutor {
            queue: &mut self.queue,
            ledger: self.ledger.as_mut(),
            clock: self.clock.as_ref(),
            events: self.events.as_ref(),
            rules: &self.rules,
            last_morning_swap_day: &mut self.last_morning_swap_day,
        }
        .execute(operation)
    }

    /// Queues a newly generated letter in the first free slot.
    pub fn add_letter(&mut self, letter: Letter) -> Result<usize, QueueViolation> {
        let letter_id = letter.id();
        let position = self.queue.insert(letter)?;
        tracing::info!(session_id = %self.id, %letter_id, position, "Letter queued");
        Ok(position)
    }

    pub fn add_letter_at(&mut self, letter: Letter, position: usize) -> Result<(), QueueViolation> {
        let letter_id = letter.id();
        self.queue.insert_at(letter, position)?;
        tracing::info!(session_id = %self.id, %letter_id, position, "Letter queued");
        Ok(())
    }

    /// Queues a letter at `position`, pushing the letters from there onward
    /// back. A letter pushed off the end is dropped and charged the expiry
    /// penalty.
    pub fn add_letter_displacing(
        &mut self,
        letter: Letter,
        position: usize,
    ) -> Result<Option<DroppedLetter>, QueueViolation> {
        let letter_id = letter.id();
        let overflow = self.queue.insert_and_shift(letter, position)?;
        tracing::info!(
            session_id = %self.id,
            %letter_id,
            position,
            "Letter queued ahead of others"
        );
        Ok(overflow.and_then(|change| self.forfeit(change)))
    }

    /// Counts deadlines down by `days`, then removes expired letters and
    /// charges the expiry penalty in each one's currency.
    pub fn process_daily_deadlines(&mut self, days: u32) -> Vec<DroppedLetter> {
        if days == 0 {
            return Vec::new();
        }
        self.queue.tick_deadlines(days);

        self.queue
            .remove_expired()
            .into_iter()
            .filter_map(|change| self.forfeit(change))
            .collect()
    }

    /// Charges the penalty for a letter the queue gave up and reports it
    /// through the event sink.
    fn forfeit(&mut self, change: QueueChange) -> Option<DroppedLetter> {
        let (position, letter, reason) = change.into_removal()?;
        let currency = letter.currency_type();
        let penalty = self.rules.expiry_penalty.min(self.ledger.balance(currency));
        let penalty = if penalty > 0 && !self.ledger.debit(currency, penalty) {
            tracing::error!(%currency, penalty, "Ledger refused forfeit penalty");
            0
        } else {
            penalty
        };

        tracing::warn!(
            session_id = %self.id,
            letter_id = %letter.id(),
            sender = letter.sender_name(),
            position,
            %reason,
            %currency,
            penalty,
            "Letter dropped undelivered"
        );
        self.events.emit(QueueEvent::letter_removed(
            &self.clock(),
            position,
            &letter,
            reason,
            penalty,
        ));

        Some(DroppedLetter {
            position,
            letter,
            reason,
            penalty,
        })
    }

    fn context<'a>(&'a self, balances: &'a TokenBalances) -> ValidationContext<'a> {
        ValidationContext {
            clock: self.clock(),
            balances,
            rules: &self.rules,
            last_morning_swap_day: self.last_morning_swap_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_domain::{Currency, QueueEventOutcome, TimeBlock};

    use crate::infrastructure::clock::GameClock;
    use crate::infrastructure::event_sink::RecordingEventSink;

    struct Fixture {
        session: QueueSession,
        clock: Arc<GameClock>,
        events: Arc<RecordingEventSink>,
    }

    fn fixture(hour: u32, tokens: u32, letters: &[(&str, Currency, i32)]) -> Fixture {
        let clock = Arc::new(GameClock::starting_at(1, hour));
        let events = Arc::new(RecordingEventSink::new());
        let ledger = InMemoryTokenLedger::with_uniform_balance(tokens);
        let mut session = QueueSession::new(
            LetterQueue::new(5).expect("capacity"),
            Box::new(ledger),
            clock.clone(),
            events.clone(),
        );
        for (sender, currency, deadline) in letters {
            session
                .add_letter(Letter::new(*sender, "Recipient", *currency, *deadline, 4))
                .expect("room in queue");
        }
        Fixture {
            session,
            clock,
            events,
        }
    }

    fn senders(session: &QueueSession) -> Vec<Option<String>> {
        session
            .snapshot()
            .iter()
            .map(|slot| slot.as_ref().map(|l| l.sender_name().to_string()))
            .collect()
    }

    fn abc() -> [(&'static str, Currency, i32); 3] {
        [
            ("A", Currency::Trust, 3),
            ("B", Currency::Commerce, 1),
            ("C", Currency::Status, 4),
        ]
    }

    #[test]
    fn preview_twice_is_identical_and_free_of_side_effects() {
        let f = fixture(10, 5, &abc());
        let op = QueueOperation::SkipDeliver { position: 3 };
        let before = f.session.snapshot();

        assert_eq!(f.session.preview(&op), f.session.preview(&op));
        assert_eq!(f.session.snapshot(), before);
        assert_eq!(f.session.balances().get(Currency::Status), 5);
        assert!(f.events.is_empty());
    }

    #[test]
    fn deliver_then_deliver_on_empty_front() {
        let mut f = fixture(10, 5, &abc());

        let result = f.session.execute(QueueOperation::Deliver).expect("executes");
        assert!(result.success);
        assert_eq!(
            senders(&f.session),
            vec![Some("B".into()), Some("C".into()), None, None, None]
        );

        // Empty the front by swapping at dawn, then try again.
        f.clock.advance_hours(f.clock.hours_until(TimeBlock::Dawn));
        let swap = f
            .session
            .execute(QueueOperation::MorningSwap { first: 1, second: 5 })
            .expect("executes");
        assert!(swap.success);

        let before = f.session.snapshot();
        let result = f.session.execute(QueueOperation::Deliver).expect("executes");
        assert!(!result.success);
        assert_eq!(
            result.failure_reason,
            Some(QueueViolation::PositionNotOccupied { position: 1 })
        );
        assert_eq!(f.session.snapshot(), before);
        assert_eq!(f.events.len(), 3);
    }

    #[test]
    fn failed_operations_never_change_queue_or_balances() {
        let mut f = fixture(14, 1, &abc());
        let attempts = [
            QueueOperation::MorningSwap { first: 1, second: 3 },
            QueueOperation::PriorityMove { from: 3 },
            QueueOperation::SkipDeliver { position: 2 },
            QueueOperation::ExtendDeadline { position: 9 },
            QueueOperation::Reorder { from: 4, to: 1 },
        ];

        for op in attempts {
            let queue_before = f.session.snapshot();
            let balances_before = f.session.balances();
            let result = f.session.execute(op.clone()).expect("executes");

            assert!(!result.success, "{:?}", op);
            assert!(result.failure_reason.is_some());
            assert!(result.tokens_spent.is_empty());
            assert_eq!(result.updated_queue, queue_before);
            assert_eq!(f.session.snapshot(), queue_before);
            assert_eq!(f.session.balances(), balances_before);
        }

        let events = f.events.events();
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| !e.is_success()));
    }

    #[test]
    fn can_perform_agrees_with_preview_and_balances() {
        let f = fixture(7, 2, &abc());
        let balances = f.session.balances();
        for op in [
            QueueOperation::Deliver,
            QueueOperation::PriorityMove { from: 2 },
            QueueOperation::PriorityMove { from: 3 },
            QueueOperation::SkipDeliver { position: 2 },
            QueueOperation::ExtendDeadline { position: 1 },
            QueueOperation::MorningSwap { first: 2, second: 4 },
            QueueOperation::Reorder { from: 3, to: 1 },
        ] {
            let cost = f.session.preview(&op);
            assert_eq!(
                f.session.can_perform(&op),
                cost.is_valid() && balances.covers(&cost.token_costs),
                "{:?}",
                op
            );
        }
    }

    #[test]
    fn successful_execution_debits_exactly_the_previewed_cost() {
        let mut f = fixture(10, 5, &abc());
        let op = QueueOperation::ExtendDeadline { position: 2 };
        let cost = f.session.preview(&op);

        let result = f.session.execute(op).expect("executes");
        assert!(result.success);
        assert_eq!(result.tokens_spent, cost.token_costs);
        assert_eq!(f.session.balances().get(Currency::Commerce), 3);
        assert_eq!(
            f.session.queue().get(2).expect("in range").map(Letter::deadline_in_days),
            Some(3)
        );

        match &f.events.events()[0].outcome {
            QueueEventOutcome::Succeeded { tokens_spent, .. } => {
                assert_eq!(tokens_spent, &cost.token_costs)
            }
            other => panic!("expected success event, got {:?}", other),
        }
    }

    #[test]
    fn morning_swap_is_once_per_day() {
        let mut f = fixture(6, 0, &abc());
        let op = QueueOperation::MorningSwap { first: 1, second: 2 };

        assert!(f.session.execute(op.clone()).expect("executes").success);
        assert_eq!(f.session.last_morning_swap_day(), Some(1));

        let again = f.session.execute(op.clone()).expect("executes");
        assert_eq!(
            again.failure_reason,
            Some(QueueViolation::DailyLimitReached { day: 1 })
        );

        f.clock.advance_hours(24);
        assert!(f.session.execute(op).expect("executes").success);
    }

    #[test]
    fn projection_warns_before_time_is_spent() {
        let f = fixture(20, 5, &abc());
        let impact = f.session.project_deadline_impact(6);

        assert!(impact.would_cross_day);
        assert_eq!(impact.resulting_day, 2);
        let expiring: Vec<_> = impact
            .affected_letters
            .iter()
            .map(|a| a.sender_name.as_str())
            .collect();
        assert_eq!(expiring, vec!["B"]);
        assert_eq!(
            f.session
                .queue()
                .get(2)
                .expect("in range")
                .map(Letter::deadline_in_days),
            Some(1)
        );
    }

    #[test]
    fn daily_sweep_removes_expired_letters_and_charges_penalty() {
        let mut f = fixture(10, 1, &abc());

        let expired = f.session.process_daily_deadlines(1);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].position, 2);
        assert_eq!(expired[0].letter.sender_name(), "B");
        assert_eq!(expired[0].reason, RemovalReason::Expired);
        // Penalty of 2 capped at the single Commerce token held.
        assert_eq!(expired[0].penalty, 1);
        assert_eq!(f.session.balances().get(Currency::Commerce), 0);
        assert_eq!(
            senders(&f.session),
            vec![Some("A".into()), Some("C".into()), None, None, None]
        );
    }

    #[test]
    fn when_a_letter_expires_then_one_removal_event_is_recorded() {
        let mut f = fixture(10, 5, &[("Marcus", Currency::Commerce, 1)]);
        let marcus = f.session.queue().slots()[0].as_ref().map(Letter::id);

        f.session.process_daily_deadlines(1);

        let events = f.events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, None);
        assert_eq!(events[0].positions, vec![1]);
        match &events[0].outcome {
            QueueEventOutcome::LetterRemoved {
                letter_id,
                reason,
                currency,
                penalty,
            } => {
                assert_eq!(Some(*letter_id), marcus);
                assert_eq!(*reason, RemovalReason::Expired);
                assert_eq!(*currency, Currency::Commerce);
                assert_eq!(*penalty, 2);
            }
            other => panic!("expected removal event, got {:?}", other),
        }
    }

    #[test]
    fn displacing_insert_mid_queue_shifts_without_penalty() {
        let mut f = fixture(10, 5, &abc());

        let dropped = f
            .session
            .add_letter_displacing(Letter::new("N", "R", Currency::Shadow, 2, 1), 2)
            .expect("in range");

        assert!(dropped.is_none());
        assert_eq!(
            senders(&f.session),
            vec![
                Some("A".into()),
                Some("N".into()),
                Some("B".into()),
                Some("C".into()),
                None
            ]
        );
        assert_eq!(f.session.balances(), fixture(10, 5, &[]).session.balances());
        assert!(f.events.is_empty());
    }

    #[test]
    fn displacing_insert_into_full_queue_drops_and_charges_the_last_letter() {
        let mut f = fixture(
            10,
            5,
            &[
                ("A", Currency::Trust, 3),
                ("B", Currency::Commerce, 3),
                ("C", Currency::Status, 3),
                ("D", Currency::Shadow, 3),
                ("E", Currency::Status, 3),
            ],
        );

        let dropped = f
            .session
            .add_letter_displacing(Letter::new("N", "R", Currency::Trust, 2, 1), 1)
            .expect("in range")
            .expect("last letter forced out");

        assert_eq!(dropped.position, 5);
        assert_eq!(dropped.letter.sender_name(), "E");
        assert_eq!(dropped.reason, RemovalReason::Displaced);
        assert_eq!(dropped.penalty, f.session.rules().expiry_penalty);
        assert_eq!(f.session.balances().get(Currency::Status), 3);
        assert_eq!(
            senders(&f.session),
            vec![
                Some("N".into()),
                Some("A".into()),
                Some("B".into()),
                Some("C".into()),
                Some("D".into())
            ]
        );

        let events = f.events.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].outcome,
            QueueEventOutcome::LetterRemoved {
                reason: RemovalReason::Displaced,
                penalty: 2,
                ..
            }
        ));
    }

    #[test]
    fn rules_that_make_moves_free_are_refused() {
        let f = fixture(10, 5, &abc());
        let free_moves = QueueRules {
            priority_move_cost_per_position: 0,
            skip_deliver_cost_per_position: 0,
            skip_deliver_premium: 0,
            ..QueueRules::default()
        };

        assert!(matches!(
            f.session.with_rules(free_moves),
            Err(DomainError::Constraint(_))
        ));
    }

    #[test]
    fn validated_rules_keep_priority_cost_monotonic() {
        let f = fixture(10, 5, &abc());
        let session = f
            .session
            .with_rules(QueueRules {
                priority_move_cost_per_position: 2,
                skip_deliver_cost_per_position: 3,
                ..QueueRules::default()
            })
            .expect("valid rules");

        let near = session.preview(&QueueOperation::PriorityMove { from: 2 });
        let far = session.preview(&QueueOperation::PriorityMove { from: 3 });
        assert!(far.total_tokens() > near.total_tokens());

        let skip = session.preview(&QueueOperation::SkipDeliver { position: 3 });
        let deliver = session.preview(&QueueOperation::Deliver);
        assert!(skip.total_tokens() > far.total_tokens() + deliver.total_tokens());
    }

    #[test]
    fn add_letter_reports_full_queue() {
        let mut f = fixture(10, 0, &abc());
        for name in ["D", "E"] {
            f.session
                .add_letter(Letter::new(name, "R", Currency::Shadow, 2, 1))
                .expect("room in queue");
        }
        assert_eq!(
            f.session.add_letter(Letter::new("F", "R", Currency::Shadow, 2, 1)),
            Err(QueueViolation::QueueFull { capacity: 5 })
        );
    }

    #[test]
    fn from_config_applies_capacity_rules_and_tokens() {
        let config = EngineConfig {
            queue_capacity: 4,
            starting_tokens: 7,
            rules: QueueRules {
                reorder_cost: 1,
                ..QueueRules::default()
            },
            ..EngineConfig::default()
        };
        let session = QueueSession::from_config(
            &config,
            Arc::new(GameClock::new()),
            Arc::new(RecordingEventSink::new()),
        )
        .expect("valid config");

        assert_eq!(session.queue().capacity(), 4);
        assert_eq!(session.balances().get(Currency::Shadow), 7);
        assert_eq!(session.rules().reorder_cost, 1);
    }
}
