//! # Action Executor Registry
//!
//! Typed mapping from [`ActionType`] to its executor. Registration is
//! validated up front: duplicates are rejected and
//! [`ExecutorRegistry::validate_complete`] confirms at startup that every
//! known action type has an executor, so unknown or unhandled action types
//! fail at configuration time, not while a batch is running.
//!
//! New action types are added by registering an executor, never by
//! modifying the orchestrator.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::executors::ActionExecutor;
use crate::orchestration::types::ActionType;

/// Errors raised during registration or resolution
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Executor already registered for action type '{0}'")]
    DuplicateExecutor(ActionType),

    #[error("No executor registered for action type '{0}'")]
    ExecutorNotRegistered(ActionType),

    #[error("Registry incomplete, missing executors for: {}", format_types(.0))]
    Incomplete(Vec<ActionType>),
}

fn format_types(types: &[ActionType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Registry of action executors keyed by action type
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: DashMap<ActionType, Arc<dyn ActionExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its own action type; duplicate
    /// registrations are a configuration error
    pub fn register(&self, executor: Arc<dyn ActionExecutor>) -> Result<(), RegistryError> {
        let action_type = executor.action_type();
        if self.executors.contains_key(&action_type) {
            return Err(RegistryError::DuplicateExecutor(action_type));
        }
        self.executors.insert(action_type, executor);
        info!(action_type = %action_type, "Registered action executor");
        Ok(())
    }

    /// Resolve the executor for an action type
    pub fn resolve(&self, action_type: ActionType) -> Result<Arc<dyn ActionExecutor>, RegistryError> {
        self.executors
            .get(&action_type)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::ExecutorNotRegistered(action_type))
    }

    /// Confirm every known action type has an executor; called at startup
    pub fn validate_complete(&self) -> Result<(), RegistryError> {
        let missing: Vec<ActionType> = ActionType::ALL
            .into_iter()
            .filter(|action_type| !self.executors.contains_key(action_type))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Incomplete(missing))
        }
    }

    /// Action types with a registered executor
    pub fn registered_types(&self) -> Vec<ActionType> {
        self.executors.iter().map(|entry| *entry.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::{ExecutionContext, ExecutorFault};
    use crate::orchestration::types::ExecutorResult;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubExecutor {
        action_type: ActionType,
    }

    #[async_trait]
    impl ActionExecutor for StubExecutor {
        fn action_type(&self) -> ActionType {
            self.action_type
        }

        async fn execute(
            &self,
            _context: ExecutionContext<'_>,
        ) -> Result<ExecutorResult, ExecutorFault> {
            Ok(ExecutorResult::success(json!({})))
        }
    }

    fn stub(action_type: ActionType) -> Arc<dyn ActionExecutor> {
        Arc::new(StubExecutor { action_type })
    }

    #[test]
    fn registers_and_resolves() {
        let registry = ExecutorRegistry::new();
        registry.register(stub(ActionType::Tag)).unwrap();

        assert!(registry.resolve(ActionType::Tag).is_ok());
        assert!(matches!(
            registry.resolve(ActionType::MoveStage),
            Err(RegistryError::ExecutorNotRegistered(ActionType::MoveStage))
        ));
    }

    #[test]
    fn rejects_duplicate_registration() {
        let registry = ExecutorRegistry::new();
        registry.register(stub(ActionType::Tag)).unwrap();
        assert!(matches!(
            registry.register(stub(ActionType::Tag)),
            Err(RegistryError::DuplicateExecutor(ActionType::Tag))
        ));
    }

    #[test]
    fn validate_complete_reports_missing_types() {
        let registry = ExecutorRegistry::new();
        registry.register(stub(ActionType::Tag)).unwrap();

        match registry.validate_complete() {
            Err(RegistryError::Incomplete(missing)) => {
                assert!(missing.contains(&ActionType::MoveStage));
                assert!(missing.contains(&ActionType::PersonalizedEmail));
                assert!(!missing.contains(&ActionType::Tag));
            }
            other => panic!("expected incomplete registry, got {other:?}"),
        }

        registry.register(stub(ActionType::MoveStage)).unwrap();
        registry.register(stub(ActionType::PersonalizedEmail)).unwrap();
        assert!(registry.validate_complete().is_ok());
    }
}
