//! Assembled Lesson

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::card::{Card, CardKind};
use super::plan::DomainPlan;
use crate::core::resolution::ExtractedEntities;
use crate::core::schema::SchemaViolation;

/// One card position in a lesson.
///
/// `Absent` only appears in partial-compile mode and records why the card is missing;
/// a card is never fabricated to fill the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CardSlot {
    Present {
        card: Card,
    },
    Absent {
        reason: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        violations: Vec<SchemaViolation>,
    },
}

impl CardSlot {
    pub fn present(card: Card) -> Self {
        CardSlot::Present { card }
    }

    pub fn absent(reason: impl Into<String>, violations: Vec<SchemaViolation>) -> Self {
        CardSlot::Absent {
            reason: reason.into(),
            violations,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            CardSlot::Present { card } => Some(card),
            CardSlot::Absent { .. } => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CardSlot::Absent { .. })
    }
}

/// A compiled lesson: metadata plus the four ordered card slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonRoot {
    pub lesson_id: Uuid,
    pub descriptor_id: String,
    pub version: u32,
    pub level: String,
    pub objectives: Vec<String>,
    pub metatext_locale: String,
    /// Model selector the lesson was generated with
    pub model: String,
    pub plan: DomainPlan,
    pub reading: CardSlot,
    pub comprehension: CardSlot,
    pub production: CardSlot,
    pub interaction: CardSlot,
    pub entities: ExtractedEntities,
    pub created_at: DateTime<Utc>,
}

impl LessonRoot {
    pub fn slot(&self, kind: CardKind) -> &CardSlot {
        match kind {
            CardKind::Reading => &self.reading,
            CardKind::Comprehension => &self.comprehension,
            CardKind::Production => &self.production,
            CardKind::Interaction => &self.interaction,
        }
    }

    /// Slots in assembly order.
    pub fn slots(&self) -> impl Iterator<Item = (CardKind, &CardSlot)> {
        CardKind::ALL.into_iter().map(move |kind| (kind, self.slot(kind)))
    }

    pub fn absent_cards(&self) -> Vec<CardKind> {
        self.slots()
            .filter(|(_, slot)| slot.is_absent())
            .map(|(kind, _)| kind)
            .collect()
    }

    /// Present cards in assembly order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.slots().filter_map(|(_, slot)| slot.card())
    }
}
