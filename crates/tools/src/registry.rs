//! Tool registry
//!
//! Name-keyed lookup plus timeout-guarded execution. Every call goes
//! through [`ToolRegistry::execute`] so no tool can block an agent run
//! past its own budget.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::{Tool, ToolError, ToolOutput};

/// Default timeout for tool execution
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Registry of callable tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    default_timeout_secs: u64,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            default_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }

    /// Set the execution timeout applied to tools without their own override
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Name and description of every tool, for prompt construction
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .values()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect()
    }

    /// Execute a tool by name under the configured timeout
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let timeout_secs = tool.timeout_secs().unwrap_or(self.default_timeout_secs);
        tracing::trace!(tool = name, timeout_secs, "executing tool");

        match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tool.execute(arguments),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                name: name.to_string(),
                secs: timeout_secs,
            }),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the deterministic scoring tools registered
///
/// The knowledge-search tool is wired separately because it needs a live
/// retriever.
pub fn scoring_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(crate::subjects::SubjectScoreTool);
    registry.register(crate::cutoffs::GraduationCutoffTool);
    registry.register(crate::cutoffs::CompetencyCutoffTool);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "never finishes in time"
        }

        fn timeout_secs(&self) -> Option<u64> {
            Some(1)
        }

        async fn execute(&self, _: Value) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ToolOutput::text("late"))
        }
    }

    #[test]
    fn test_scoring_registry_contents() {
        let registry = scoring_registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.has("sum_subjects"));
        assert!(registry.has("compare_graduation_cutoffs"));
        assert!(registry.has("compare_competency_cutoffs"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute("missing", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_enforced() {
        let mut registry = ToolRegistry::new();
        registry.register(SlowTool);
        let err = registry.execute("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    struct SleepyTool;

    #[async_trait]
    impl Tool for SleepyTool {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn description(&self) -> &str {
            "no timeout override of its own"
        }

        async fn execute(&self, _: Value) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ToolOutput::text("late"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_timeout_applies_without_override() {
        let mut registry = ToolRegistry::new().with_timeout_secs(2);
        registry.register(SleepyTool);
        let err = registry.execute("sleepy", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { secs: 2, .. }));
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let registry = scoring_registry();
        let output = registry
            .execute(
                "sum_subjects",
                json!({
                    "subject_a_name": "toan",
                    "subject_b_name": "ly",
                    "subject_c_name": "hoa",
                    "subject_a_point": 8.0,
                    "subject_b_point": 7.5,
                    "subject_c_point": 9.0,
                }),
            )
            .await
            .unwrap();
        assert_eq!(output.value["combination"], "A00");
    }
}
