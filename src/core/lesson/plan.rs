use serde::{Deserialize, Serialize};

/// Terse pedagogical input a lesson is compiled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDescriptor {
    pub id: String,
    /// Proficiency level label, e.g. `"A1"`
    pub level: String,
    pub topic: String,
    /// Can-do statement the lesson targets
    pub can_do: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub vocabulary_hints: Vec<String>,
    #[serde(default)]
    pub grammar_hints: Vec<String>,
}

/// Planning artifact conditioning every card of one compile request.
///
/// Produced once by the plan stage and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPlan {
    pub target_function: String,
    pub scenarios: Vec<String>,
    pub grammar_functions: Vec<String>,
    pub evaluation_criteria: Vec<String>,
}

impl DomainPlan {
    /// Compact rendering for inclusion in card prompts.
    pub fn summary(&self) -> String {
        format!(
            "Target function: {}\nScenarios: {}\nGrammar functions: {}\nEvaluation criteria: {}",
            self.target_function,
            self.scenarios.join("; "),
            self.grammar_functions.join("; "),
            self.evaluation_criteria.join("; "),
        )
    }
}
