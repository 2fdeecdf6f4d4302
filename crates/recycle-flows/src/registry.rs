//! Process-wide flow registry.
//!
//! Every `FlowSpec` is constructed exactly once, at first use, and is
//! read-only afterwards. Invocations share nothing but these immutable
//! specs, so concurrent calls need no coordination.

use once_cell::sync::Lazy;

use crate::flow::FlowSpec;
use crate::flows;

static REGISTRY: Lazy<FlowRegistry> = Lazy::new(FlowRegistry::new);

/// The registered flows.
pub struct FlowRegistry {
    pub suggest_category: FlowSpec,
    pub estimate_price: FlowSpec,
    pub generate_description: FlowSpec,
    pub suggest_title: FlowSpec,
    pub assess_condition: FlowSpec,
    pub translate_text: FlowSpec,
    pub check_compatibility: FlowSpec,
    pub suggest_locality: FlowSpec,
    pub draft_reply: FlowSpec,
}

impl FlowRegistry {
    fn new() -> Self {
        Self {
            suggest_category: flows::category::spec(),
            estimate_price: flows::pricing::spec(),
            generate_description: flows::description::spec(),
            suggest_title: flows::title::spec(),
            assess_condition: flows::condition::spec(),
            translate_text: flows::translation::spec(),
            check_compatibility: flows::compatibility::spec(),
            suggest_locality: flows::locality::spec(),
            draft_reply: flows::reply::spec(),
        }
    }

    /// All registered flows.
    pub fn all(&self) -> [&FlowSpec; 9] {
        [
            &self.suggest_category,
            &self.estimate_price,
            &self.generate_description,
            &self.suggest_title,
            &self.assess_condition,
            &self.translate_text,
            &self.check_compatibility,
            &self.suggest_locality,
            &self.draft_reply,
        ]
    }

    /// Look up a flow by name.
    pub fn get(&self, name: &str) -> Option<&FlowSpec> {
        self.all().into_iter().find(|spec| spec.name == name)
    }
}

/// The process-wide registry.
pub fn registry() -> &'static FlowRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_names_are_unique() {
        let registry = registry();
        let mut names: Vec<_> = registry.all().iter().map(|spec| spec.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = registry();
        assert!(registry.get("suggest_category").is_some());
        assert!(registry.get("no_such_flow").is_none());
    }

    #[test]
    fn test_only_locality_flow_carries_a_tool() {
        let registry = registry();
        for spec in registry.all() {
            if spec.name == "suggest_locality" {
                assert!(spec.tool.is_some());
            } else {
                assert!(spec.tool.is_none(), "{} must not carry a tool", spec.name);
            }
        }
    }

    #[test]
    fn test_every_flow_has_task_framing() {
        for spec in registry().all() {
            assert!(!spec.system_prompt.is_empty());
            assert!(
                spec.system_prompt.contains("JSON"),
                "{} must instruct JSON output",
                spec.name
            );
        }
    }
}
