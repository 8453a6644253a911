//! LetterQueue aggregate - fixed-capacity, position-indexed delivery obligations
//!
//! # Invariants
//!
//! - **I1**: a letter id appears at most once across all slots.
//! - **I2**: plain delivery only ever removes position 1.
//! - **I3**: removals (deliver, skip-deliver, purge, expiry) compact: every
//!   later slot shifts one step toward position 1. Swap and reorder only
//!   exchange or rotate slots and may leave a letter next to a gap.
//! - The slot vector always has exactly `capacity` entries.
//!
//! # Mutation
//!
//! Operation-driven changes go through [`LetterQueue::apply`], which only
//! accepts a [`ValidatedOperation`] issued by the validator for the queue's
//! current revision. The slot mutators behind it are private. Letter intake
//! (`insert`, `insert_at`, `insert_and_shift`) and the daily deadline sweep
//! validate their own arguments.

use std::collections::BTreeSet;

use crate::error::DomainError;
use crate::events::{QueueChange, RemovalReason};
use crate::queue_rules::{PlannedChange, QueueViolation, ValidatedOperation};
use crate::{Letter, LetterId};

/// Ordered container of delivery obligations.
///
/// Positions are 1-based. Empty slots are `None`.
///
/// # Example
///
/// ```
/// use courier_domain::{Currency, Letter, LetterQueue};
///
/// let mut queue = LetterQueue::with_default_capacity();
/// let position = queue
///     .insert(Letter::new("Elena", "Lord Aldric", Currency::Trust, 3, 12))
///     .expect("empty queue has room");
///
/// assert_eq!(position, 1);
/// assert_eq!(queue.letter_count(), 1);
/// assert_eq!(queue.capacity(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterQueue {
    slots: Vec<Option<Letter>>,
    /// Bumped on every mutation; validated plans are pinned to it.
    revision: u64,
}

impl LetterQueue {
    pub const DEFAULT_CAPACITY: usize = 8;

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn new(capacity: usize) -> Result<Self, DomainError> {
        if capacity == 0 {
            return Err(DomainError::validation("Queue capacity must be at least 1"));
        }
        Ok(Self {
            slots: vec![None; capacity],
            revision: 0,
        })
    }

    pub fn with_default_capacity() -> Self {
        Self {
            slots: vec![None; Self::DEFAULT_CAPACITY],
            revision: 0,
        }
    }

    /// Rebuilds a queue from a snapshot. Capacity is the slot count.
    pub fn from_slots(slots: Vec<Option<Letter>>) -> Result<Self, DomainError> {
        if slots.is_empty() {
            return Err(DomainError::validation("Queue capacity must be at least 1"));
        }
        let mut seen = BTreeSet::new();
        for letter in slots.iter().flatten() {
            if !seen.insert(letter.id()) {
                return Err(DomainError::validation(format!(
                    "Letter {} appears in more than one slot",
                    letter.id()
                )));
            }
        }
        Ok(Self { slots, revision: 0 })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Read-only view of all slots, position 1 first.
    #[inline]
    pub fn slots(&self) -> &[Option<Letter>] {
        &self.slots
    }

    /// Independent copy of all slots.
    pub fn snapshot(&self) -> Vec<Option<Letter>> {
        self.slots.clone()
    }

    pub fn get(&self, position: usize) -> Result<Option<&Letter>, QueueViolation> {
        let index = self.index_of(position)?;
        Ok(self.slots[index].as_ref())
    }

    pub fn is_occupied(&self, position: usize) -> bool {
        matches!(self.get(position), Ok(Some(_)))
    }

    pub fn letter_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn position_of(&self, id: LetterId) -> Option<usize> {
        self.letters()
            .find(|(_, letter)| letter.id() == id)
            .map(|(position, _)| position)
    }

    /// Occupied slots as `(position, letter)`, position 1 first.
    pub fn letters(&self) -> impl Iterator<Item = (usize, &Letter)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|letter| (index + 1, letter)))
    }

    /// Letter with the smallest positive deadline; ties go to the lower position.
    pub fn most_urgent(&self) -> Option<(usize, &Letter)> {
        self.letters()
            .filter(|(_, letter)| letter.has_deadline() && letter.deadline_in_days() > 0)
            .min_by_key(|(position, letter)| (letter.deadline_in_days(), *position))
    }

    /// Letters due within `days` days, including already-expired ones.
    pub fn expiring_within(&self, days: u32) -> Vec<(usize, &Letter)> {
        let limit = i64::from(days);
        self.letters()
            .filter(|(_, letter)| {
                letter.has_deadline() && i64::from(letter.deadline_in_days()) <= limit
            })
            .collect()
    }

    // =========================================================================
    // Intake
    // =========================================================================

    /// Places `letter` in the first empty slot and returns its position.
    pub fn insert(&mut self, letter: Letter) -> Result<usize, QueueViolation> {
        self.reject_duplicate(&letter)?;
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(QueueViolation::QueueFull {
                capacity: self.capacity(),
            })?;
        self.slots[index] = Some(letter);
        self.committed();
        Ok(index + 1)
    }

    /// Places `letter` at an empty `position`.
    pub fn insert_at(&mut self, letter: Letter, position: usize) -> Result<(), QueueViolation> {
        let index = self.index_of(position)?;
        self.reject_duplicate(&letter)?;
        if self.slots[index].is_some() {
            return Err(QueueViolation::PositionAlreadyOccupied { position });
        }
        self.slots[index] = Some(letter);
        self.committed();
        Ok(())
    }

    /// Places `letter` at `position`, pushing the letters from there onward
    /// toward the back. Gaps behind the target close up as they shift.
    ///
    /// If no slot is left for the last pushed letter it is forced out and
    /// returned as a [`RemovalReason::Displaced`] removal carrying the
    /// position it held.
    pub fn insert_and_shift(
        &mut self,
        letter: Letter,
        position: usize,
    ) -> Result<Option<QueueChange>, QueueViolation> {
        let index = self.index_of(position)?;
        self.reject_duplicate(&letter)?;

        let capacity = self.capacity();
        let pushed: Vec<(usize, Letter)> = self.slots[index..]
            .iter_mut()
            .enumerate()
            .filter_map(|(offset, slot)| slot.take().map(|l| (index + offset + 1, l)))
            .collect();

        self.slots[index] = Some(letter);
        let mut overflow = None;
        for (next, (held_at, pushed_letter)) in (index + 1..).zip(pushed) {
            if next < capacity {
                self.slots[next] = Some(pushed_letter);
            } else {
                overflow = Some(QueueChange::Removed {
                    letter: pushed_letter,
                    position: held_at,
                    reason: RemovalReason::Displaced,
                });
            }
        }

        self.committed();
        Ok(overflow)
    }

    // =========================================================================
    // Deadline sweep
    // =========================================================================

    /// Counts every dated letter down by `days`.
    pub fn tick_deadlines(&mut self, days: u32) {
        if days == 0 {
            return;
        }
        for letter in self.slots.iter_mut().flatten() {
            letter.elapse_days(days);
        }
        self.committed();
    }

    /// Removes expired letters, compacting the queue. Each removal reports the
    /// position the letter held before the sweep.
    pub fn remove_expired(&mut self) -> Vec<QueueChange> {
        let capacity = self.capacity();
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(capacity);

        for (index, slot) in std::mem::take(&mut self.slots).into_iter().enumerate() {
            match slot {
                Some(letter) if letter.has_deadline() && letter.is_expired() => {
                    expired.push(QueueChange::Removed {
                        letter,
                        position: index + 1,
                        reason: RemovalReason::Expired,
                    })
                }
                other => kept.push(other),
            }
        }
        kept.resize(capacity, None);
        self.slots = kept;

        if !expired.is_empty() {
            self.committed();
        }
        expired
    }

    // =========================================================================
    // Validated mutation
    // =========================================================================

    /// Applies a plan produced by
    /// [`authorize`](crate::queue_rules::authorize) for this queue.
    ///
    /// A plan issued against another revision is refused before anything
    /// changes. That only happens when a caller holds a plan across a
    /// mutation, which is a programming error, so it also trips a debug
    /// assertion.
    pub fn apply(&mut self, plan: ValidatedOperation) -> Result<QueueChange, DomainError> {
        debug_assert_eq!(
            plan.revision(),
            self.revision,
            "queue plan applied to a different revision"
        );
        if plan.revision() != self.revision {
            return Err(DomainError::constraint(format!(
                "Plan for {} was authorized at queue revision {}, queue is at {}",
                plan.kind(),
                plan.revision(),
                self.revision
            )));
        }

        let change = match plan.change() {
            PlannedChange::Swap { first, second } => self
                .swap(first, second)
                .map(|()| QueueChange::Swapped { first, second }),
            PlannedChange::MoveToFront { from } => self
                .move_to_front(from)
                .map(|letter_id| QueueChange::MovedToFront { letter_id, from }),
            PlannedChange::ExtendDeadline { position, days } => self
                .extend_deadline(position, days)
                .map(|(letter_id, new_deadline)| QueueChange::DeadlineExtended {
                    letter_id,
                    position,
                    new_deadline,
                }),
            PlannedChange::Remove { position, reason } => self
                .remove_and_compact(position)
                .map(|letter| QueueChange::Removed {
                    letter,
                    position,
                    reason,
                }),
            PlannedChange::Relocate { from, to } => self
                .relocate(from, to)
                .map(|letter_id| QueueChange::Relocated { letter_id, from, to }),
        };

        let change = change.ok_or_else(|| {
            DomainError::constraint(format!(
                "Validated {} no longer matches the queue slots",
                plan.kind()
            ))
        })?;
        self.committed();
        Ok(change)
    }

    // =========================================================================
    // Slot mutators
    // =========================================================================

    fn swap(&mut self, first: usize, second: usize) -> Option<()> {
        let a = self.index_of(first).ok()?;
        let b = self.index_of(second).ok()?;
        self.slots.swap(a, b);
        Some(())
    }

    /// Removes the letter at `position`; later slots shift up one.
    fn remove_and_compact(&mut self, position: usize) -> Option<Letter> {
        let index = self.occupied_index(position)?;
        let removed = self.slots.remove(index);
        self.slots.push(None);
        removed
    }

    /// Moves the letter at `from` to position 1; slots 1..from shift down one.
    fn move_to_front(&mut self, from: usize) -> Option<LetterId> {
        self.relocate(from, 1)
    }

    /// Moves the letter at `from` to `to`; slots in between shift one step
    /// toward `from`.
    fn relocate(&mut self, from: usize, to: usize) -> Option<LetterId> {
        let source = self.occupied_index(from)?;
        let target = self.index_of(to).ok()?;
        let letter = self.slots.remove(source);
        let id = letter.as_ref().map(Letter::id);
        self.slots.insert(target, letter);
        id
    }

    fn extend_deadline(&mut self, position: usize, days: u32) -> Option<(LetterId, i32)> {
        let index = self.occupied_index(position)?;
        let letter = self.slots[index].as_mut()?;
        letter.extend_deadline(days);
        Some((letter.id(), letter.deadline_in_days()))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn index_of(&self, position: usize) -> Result<usize, QueueViolation> {
        if (1..=self.capacity()).contains(&position) {
            Ok(position - 1)
        } else {
            Err(QueueViolation::OutOfRange {
                position,
                capacity: self.capacity(),
            })
        }
    }

    fn occupied_index(&self, position: usize) -> Option<usize> {
        let index = self.index_of(position).ok()?;
        self.slots[index].is_some().then_some(index)
    }

    fn reject_duplicate(&self, letter: &Letter) -> Result<(), QueueViolation> {
        match self.position_of(letter.id()) {
            Some(position) => Err(QueueViolation::invalid_arguments(format!(
                "letter {} is already queued at position {}",
                letter.id(),
                position
            ))),
            None => Ok(()),
        }
    }

    fn committed(&mut self) {
        self.revision += 1;
        self.debug_check_invariants();
    }

    fn debug_check_invariants(&self) {
        if cfg!(debug_assertions) {
            let mut seen = BTreeSet::new();
            for letter in self.slots.iter().flatten() {
                debug_assert!(
                    seen.insert(letter.id()),
                    "letter {} occupies two positions",
                    letter.id()
                );
            }
        }
    }
}

impl Default for LetterQueue {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
