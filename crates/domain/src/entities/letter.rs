//! Letter entity - one delivery obligation held in the queue
//!
//! # Invariants
//!
//! Everything except the deadline counter is fixed once the letter is built.
//! The queue may reposition or remove a letter, and may move its deadline
//! (extension, daily countdown), but never rewrites sender, recipient,
//! currency, or payment.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Currency, LetterId};

/// Physical size of a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Massive,
}

/// Handling constraints a letter may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalProperty {
    Fragile,
    Heavy,
    Perishable,
    Valuable,
    Bulky,
    RequiresProtection,
}

impl std::fmt::Display for PhysicalProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fragile => write!(f, "Fragile"),
            Self::Heavy => write!(f, "Heavy"),
            Self::Perishable => write!(f, "Perishable"),
            Self::Valuable => write!(f, "Valuable"),
            Self::Bulky => write!(f, "Bulky"),
            Self::RequiresProtection => write!(f, "Requires protection"),
        }
    }
}

/// A queued delivery obligation.
///
/// # Example
///
/// ```
/// use courier_domain::{Currency, Letter, PhysicalProperty};
///
/// let letter = Letter::new("Elena", "Lord Aldric", Currency::Trust, 3, 12)
///     .with_physical_property(PhysicalProperty::Fragile)
///     .with_description("A sealed plea for help");
///
/// assert_eq!(letter.deadline_in_days(), 3);
/// assert!(!letter.is_expired());
/// assert!(letter.has_physical_property(PhysicalProperty::Fragile));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    // Identity
    id: LetterId,

    // Routing (display only, never matched on)
    sender_name: String,
    recipient_name: String,

    // Queue mechanics
    currency_type: Currency,
    deadline_in_days: i32,
    payment: u32,

    // Content metadata, opaque to the queue
    size: LetterSize,
    physical_properties: BTreeSet<PhysicalProperty>,
    required_equipment: Option<String>,
    description: Option<String>,

    // Provenance
    is_generated: bool,
    generation_reason: Option<String>,
}

impl Letter {
    /// Deadline marker for letters that never expire. Such letters are
    /// ignored by deadline projection and by the daily countdown.
    pub const NO_DEADLINE: i32 = i32::MAX;

    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(
        sender_name: impl Into<String>,
        recipient_name: impl Into<String>,
        currency_type: Currency,
        deadline_in_days: i32,
        payment: u32,
    ) -> Self {
        Self {
            id: LetterId::new(),
            sender_name: sender_name.into(),
            recipient_name: recipient_name.into(),
            currency_type,
            deadline_in_days,
            payment,
            size: LetterSize::default(),
            physical_properties: BTreeSet::new(),
            required_equipment: None,
            description: None,
            is_generated: false,
            generation_reason: None,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_id(mut self, id: LetterId) -> Self {
        self.id = id;
        self
    }

    pub fn with_size(mut self, size: LetterSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_physical_property(mut self, property: PhysicalProperty) -> Self {
        self.physical_properties.insert(property);
        self
    }

    pub fn with_required_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.required_equipment = Some(equipment.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the letter as produced by a generator rather than authored content.
    pub fn generated(mut self, reason: impl Into<String>) -> Self {
        self.is_generated = true;
        self.generation_reason = Some(reason.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> LetterId {
        self.id
    }

    #[inline]
    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    #[inline]
    pub fn recipient_name(&self) -> &str {
        &self.recipient_name
    }

    #[inline]
    pub fn currency_type(&self) -> Currency {
        self.currency_type
    }

    #[inline]
    pub fn deadline_in_days(&self) -> i32 {
        self.deadline_in_days
    }

    #[inline]
    pub fn payment(&self) -> u32 {
        self.payment
    }

    #[inline]
    pub fn size(&self) -> LetterSize {
        self.size
    }

    pub fn physical_properties(&self) -> impl Iterator<Item = PhysicalProperty> + '_ {
        self.physical_properties.iter().copied()
    }

    pub fn has_physical_property(&self, property: PhysicalProperty) -> bool {
        self.physical_properties.contains(&property)
    }

    #[inline]
    pub fn required_equipment(&self) -> Option<&str> {
        self.required_equipment.as_deref()
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    #[inline]
    pub fn generation_reason(&self) -> Option<&str> {
        self.generation_reason.as_deref()
    }

    // =========================================================================
    // Deadline
    // =========================================================================

    pub fn is_expired(&self) -> bool {
        self.deadline_in_days <= 0
    }

    /// False for letters carrying [`Letter::NO_DEADLINE`].
    pub fn has_deadline(&self) -> bool {
        self.deadline_in_days != Self::NO_DEADLINE
    }

    pub(crate) fn extend_deadline(&mut self, days: u32) {
        if self.has_deadline() {
            let days = i32::try_from(days).unwrap_or(i32::MAX);
            // Stay below the marker so an extended letter still counts down.
            self.deadline_in_days = self
                .deadline_in_days
                .saturating_add(days)
                .min(Self::NO_DEADLINE - 1);
        }
    }

    pub(crate) fn elapse_days(&mut self, days: u32) {
        if self.has_deadline() {
            let days = i32::try_from(days).unwrap_or(i32::MAX);
            self.deadline_in_days = self.deadline_in_days.saturating_sub(days);
        }
    }

    pub fn deadline_description(&self) -> String {
        match self.deadline_in_days {
            Self::NO_DEADLINE => "No deadline".to_string(),
            d if d <= 0 => "EXPIRED".to_string(),
            1 => "Due tomorrow".to_string(),
            d => format!("Due in {} days", d),
        }
    }
}
