use std::collections::HashMap;

use crate::engine::{Assignment, EngineResult, ProcessNavigator, StepSpec};
use crate::models::CoreError;

/// Assignment placeholder resolved to the process creator when the initial
/// steps are opened.
pub const INITIATOR_PLACEHOLDER: &str = "#{initiator}";

/// A navigator backed by in-memory routing tables. Each definition registers
/// its initial steps and a map of (step, action) transitions; an empty
/// transition target is a terminal node.
#[derive(Debug, Default)]
pub struct TableNavigator {
    initial: HashMap<String, Vec<StepSpec>>,
    routes: HashMap<(String, String, String), Vec<StepSpec>>,
}

impl TableNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_initial(&mut self, definition_id: &str, steps: Vec<StepSpec>) {
        self.initial.insert(definition_id.to_string(), steps);
    }

    pub fn define_route(
        &mut self,
        definition_id: &str,
        current_step: &str,
        action_name: &str,
        successors: Vec<StepSpec>,
    ) {
        self.routes.insert(
            (
                definition_id.to_string(),
                current_step.to_string(),
                action_name.to_string(),
            ),
            successors,
        );
    }
}

impl ProcessNavigator for TableNavigator {
    fn initial_steps(
        &self,
        definition_id: &str,
        creator_login: &str,
    ) -> EngineResult<Vec<StepSpec>> {
        let steps = self.initial.get(definition_id).ok_or_else(|| {
            CoreError::execution(format!(
                "no initial steps registered for process definition '{definition_id}'"
            ))
        })?;
        Ok(steps
            .iter()
            .cloned()
            .map(|step| resolve_initiator(step, creator_login))
            .collect())
    }

    fn route(
        &self,
        definition_id: &str,
        current_step: &str,
        action_name: &str,
    ) -> EngineResult<Vec<StepSpec>> {
        let key = (
            definition_id.to_string(),
            current_step.to_string(),
            action_name.to_string(),
        );
        let successors = self.routes.get(&key).ok_or_else(|| {
            CoreError::execution(format!(
                "action '{action_name}' is not available from step '{current_step}'"
            ))
        })?;
        Ok(successors.clone())
    }
}

fn resolve_initiator(mut step: StepSpec, creator_login: &str) -> StepSpec {
    if let Assignment::User(login) = &step.assignment {
        if login == INITIATOR_PLACEHOLDER {
            step.assignment = Assignment::User(creator_login.to_string());
        }
    }
    step
}
