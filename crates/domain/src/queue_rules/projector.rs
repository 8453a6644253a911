//! Deadline impact projection
//!
//! Answers "if I spend this many hours, which letters expire?" without touching
//! the queue or the clock.

use serde::{Deserialize, Serialize};

use crate::{ClockSnapshot, LetterId, LetterQueue, TimeBlock};

/// A letter that would reach its deadline during the projected advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedLetter {
    pub position: usize,
    pub letter_id: LetterId,
    pub sender_name: String,
    pub recipient_name: String,
    pub deadline_in_days: i32,
    /// Days left after the advance; zero or negative.
    pub remaining_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineImpact {
    pub affected_letters: Vec<AffectedLetter>,
    pub days_advanced: u32,
    pub resulting_day: u32,
    pub resulting_hour: u32,
    pub resulting_time_block: TimeBlock,
    pub would_cross_day: bool,
}

impl DeadlineImpact {
    pub fn has_expirations(&self) -> bool {
        !self.affected_letters.is_empty()
    }
}

/// Projects advancing `clock` by `hours` over `queue`.
///
/// Days advanced is `(hour + hours) / hours_per_day`, floored. A letter is
/// affected iff it currently has a positive deadline and would reach zero or
/// below. Letters without a deadline are skipped.
pub fn project_deadline_impact(
    queue: &LetterQueue,
    clock: &ClockSnapshot,
    hours: u32,
) -> DeadlineImpact {
    let hours_per_day = clock.hours_per_day.max(1);
    let total_hours = u64::from(clock.hour) + u64::from(hours);
    let days_advanced = total_hours / u64::from(hours_per_day);
    let resulting_hour = (total_hours % u64::from(hours_per_day)) as u32;

    let affected_letters = queue
        .letters()
        .filter(|(_, letter)| letter.has_deadline() && letter.deadline_in_days() > 0)
        .filter_map(|(position, letter)| {
            let remaining = i64::from(letter.deadline_in_days()) - days_advanced as i64;
            (remaining <= 0).then(|| AffectedLetter {
                position,
                letter_id: letter.id(),
                sender_name: letter.sender_name().to_string(),
                recipient_name: letter.recipient_name().to_string(),
                deadline_in_days: letter.deadline_in_days(),
                remaining_days: remaining,
            })
        })
        .collect();

    let days_advanced = u32::try_from(days_advanced).unwrap_or(u32::MAX);

    DeadlineImpact {
        affected_letters,
        days_advanced,
        resulting_day: clock.day.saturating_add(days_advanced),
        resulting_hour,
        resulting_time_block: TimeBlock::from_hour(resulting_hour),
        would_cross_day: days_advanced > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Currency, Letter};

    fn queue_with_deadlines(deadlines: &[i32]) -> LetterQueue {
        let mut slots: Vec<Option<Letter>> = deadlines
            .iter()
            .map(|d| Some(Letter::new("Sender", "Recipient", Currency::Trust, *d, 1)))
            .collect();
        slots.resize(8, None);
        LetterQueue::from_slots(slots).expect("valid queue")
    }

    #[test]
    fn same_day_advance_affects_nothing() {
        let queue = queue_with_deadlines(&[1, 2]);
        let impact = project_deadline_impact(&queue, &ClockSnapshot::at(3, 10), 4);

        assert!(!impact.has_expirations());
        assert!(!impact.would_cross_day);
        assert_eq!(impact.resulting_day, 3);
        assert_eq!(impact.resulting_hour, 14);
        assert_eq!(impact.resulting_time_block, TimeBlock::Afternoon);
    }

    #[test]
    fn crossing_midnight_expires_one_day_letters() {
        let queue = queue_with_deadlines(&[1, 2, 0, Letter::NO_DEADLINE]);
        let impact = project_deadline_impact(&queue, &ClockSnapshot::at(3, 20), 6);

        assert!(impact.would_cross_day);
        assert_eq!(impact.days_advanced, 1);
        assert_eq!(impact.resulting_day, 4);
        assert_eq!(impact.resulting_hour, 2);
        assert_eq!(impact.resulting_time_block, TimeBlock::LateNight);

        // Already-expired and deadline-free letters are not reported.
        let positions: Vec<_> = impact.affected_letters.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![1]);
        assert_eq!(impact.affected_letters[0].remaining_days, 0);
    }

    #[test]
    fn multi_day_advance_reports_negative_remaining() {
        let queue = queue_with_deadlines(&[1, 2, 5]);
        let impact = project_deadline_impact(&queue, &ClockSnapshot::at(1, 0), 72);

        assert_eq!(impact.days_advanced, 3);
        let remaining: Vec<_> = impact
            .affected_letters
            .iter()
            .map(|a| (a.position, a.remaining_days))
            .collect();
        assert_eq!(remaining, vec![(1, -2), (2, -1)]);
    }

    #[test]
    fn projection_is_pure() {
        let queue = queue_with_deadlines(&[1, 3]);
        let before = queue.snapshot();
        let clock = ClockSnapshot::at(2, 22);

        let first = project_deadline_impact(&queue, &clock, 30);
        let second = project_deadline_impact(&queue, &clock, 30);

        assert_eq!(first, second);
        assert_eq!(queue.snapshot(), before);
    }

    #[test]
    fn honors_custom_day_length() {
        let queue = queue_with_deadlines(&[1]);
        let clock = ClockSnapshot {
            hours_per_day: 10,
            ..ClockSnapshot::at(1, 8)
        };
        let impact = project_deadline_impact(&queue, &clock, 3);
        assert_eq!(impact.days_advanced, 1);
        assert_eq!(impact.resulting_hour, 1);
        assert_eq!(impact.affected_letters.len(), 1);
    }
}
