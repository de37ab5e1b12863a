//! Scenario runner.

use std::rc::Rc;

use valobj_core::Registry;
use valobj_mutation::Instantiate;

use crate::error::{ScenarioError, ScenarioResult};
use crate::scenario::Scenario;

/// Runs a scenario against a registry.
pub struct Runner<'s> {
    scenario: &'s Scenario,
    registry: Rc<Registry>,
}

impl<'s> Runner<'s> {
    /// Create a new runner for a scenario.
    pub fn new(scenario: &'s Scenario) -> ScenarioResult<Self> {
        let registry = scenario.registry_ref()?.clone();
        Ok(Self { scenario, registry })
    }

    /// Run the scenario.
    pub fn run(&self) -> ScenarioResult<()> {
        // 1. Construct the starting instance
        let (class, attrs) = self.scenario.start_ref()?;
        let mut current = self
            .registry
            .instantiate(class, attrs.clone())
            .map_err(|e| ScenarioError::construction(self.scenario.name(), class, e))?;

        // 2. Execute each step and verify assertions
        for step in self.scenario.steps() {
            let before = current.deep_copy();
            let result = (step.operation)(&current);

            step.assertion.verify(&step.name, &current, &before, &result)?;

            // 3. Successful results carry over to the next step
            if let Ok(next) = result {
                current = next;
            }
        }

        Ok(())
    }
}
