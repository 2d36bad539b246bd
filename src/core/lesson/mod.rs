//! Lesson Model
//!
//! Typed views of accepted generator output and the assembled lesson document.
//!
//! # Module Structure
//!
//! - `plan`: the pedagogical descriptor and the domain plan derived from it
//! - `card`: card variants and their sub-items
//! - `root`: the assembled lesson with per-card slots

pub mod card;
pub mod plan;
pub mod root;

pub use card::{
    Card, CardKind, ComprehensionCard, ComprehensionItem, ComprehensionItemType, DialogueTurn,
    EnhancementStatus, InteractionActivity, InteractionActivityType, InteractionCard,
    ProductionCard, ProductionExercise, ProductionExerciseType, ReadingCard,
};
pub use plan::{DomainPlan, LessonDescriptor};
pub use root::{CardSlot, LessonRoot};
