//! Crew configuration: agent personas and task templates.
//!
//! Two YAML files keyed by name, as in:
//!
//! ```yaml
//! # agents.yaml
//! pr_analyzer:
//!   role: Pull Request Analyzer
//!   goal: ...
//!   backstory: ...
//!   tools: [github_pr_list, github_pr_details]
//!
//! # tasks.yaml
//! analyze_prs:
//!   description: ...
//!   expected_output: ...
//!   agent: pr_analyzer
//! ```
//!
//! The embedded defaults are used unless other files are given.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crewgate_core::{Persona, TaskSpec};
use crewgate_github::tools::{scope_for, TOOL_NAMES};
use crewgate_identity::ScopeGrants;

use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;

pub const DEFAULT_AGENTS_YAML: &str = include_str!("../config/agents.yaml");
pub const DEFAULT_TASKS_YAML: &str = include_str!("../config/tasks.yaml");

/// Task names in pipeline order.
pub const TASK_ORDER: [&str; 3] = ["analyze_prs", "review_code_changes", "create_pr_reviews"];

/// One agent persona and its tool list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl AgentConfig {
    pub fn persona(&self) -> Persona {
        Persona::new(self.role.trim(), self.goal.trim()).with_backstory(self.backstory.trim())
    }
}

/// One task template and the agent that performs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub description: String,
    pub expected_output: String,
    pub agent: String,
}

impl TaskConfig {
    pub fn spec(&self, name: &str) -> TaskSpec {
        TaskSpec::new(name, self.description.trim(), self.expected_output.trim())
    }
}

/// Validated crew configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewConfig {
    pub agents: BTreeMap<String, AgentConfig>,
    pub tasks: BTreeMap<String, TaskConfig>,
}

impl CrewConfig {
    /// Parse and validate both documents.
    pub fn from_yaml(agents_yaml: &str, tasks_yaml: &str) -> AgentResult<Self> {
        let config = Self {
            agents: serde_yaml::from_str(agents_yaml)?,
            tasks: serde_yaml::from_str(tasks_yaml)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// The embedded default crew.
    pub fn embedded() -> AgentResult<Self> {
        Self::from_yaml(DEFAULT_AGENTS_YAML, DEFAULT_TASKS_YAML)
    }

    /// Load from files, falling back to the embedded document for any path not given.
    pub fn load(agents: Option<&Path>, tasks: Option<&Path>) -> AgentResult<Self> {
        let agents_yaml = match agents {
            Some(path) => {
                debug!("Reading agents config from {:?}", path);
                std::fs::read_to_string(path)?
            }
            None => DEFAULT_AGENTS_YAML.to_string(),
        };
        let tasks_yaml = match tasks {
            Some(path) => {
                debug!("Reading tasks config from {:?}", path);
                std::fs::read_to_string(path)?
            }
            None => DEFAULT_TASKS_YAML.to_string(),
        };

        let config = Self::from_yaml(&agents_yaml, &tasks_yaml)?;
        info!(
            "Loaded crew config: {} agent(s), {} task(s)",
            config.agents.len(),
            config.tasks.len()
        );
        Ok(config)
    }

    /// Check role names, persona text, tool lists and task references.
    pub fn validate(&self) -> AgentResult<()> {
        for role in AgentRole::all() {
            if !self.agents.contains_key(role.config_key()) {
                return Err(AgentError::config(format!(
                    "Missing agent '{}'",
                    role.config_key()
                )));
            }
        }

        for (key, agent) in &self.agents {
            if AgentRole::from_key(key).is_none() {
                return Err(AgentError::UnknownRole(key.clone()));
            }
            if agent.role.trim().is_empty() {
                return Err(AgentError::config(format!("Agent '{}' has an empty role", key)));
            }
            if agent.goal.trim().is_empty() {
                return Err(AgentError::config(format!("Agent '{}' has an empty goal", key)));
            }
            for tool in &agent.tools {
                if !TOOL_NAMES.contains(&tool.as_str()) {
                    return Err(AgentError::UnknownTool {
                        agent: key.clone(),
                        tool: tool.clone(),
                    });
                }
            }
        }

        if self.tasks.len() != TASK_ORDER.len() {
            return Err(AgentError::config(format!(
                "Expected exactly {} tasks, found {}",
                TASK_ORDER.len(),
                self.tasks.len()
            )));
        }
        for name in TASK_ORDER {
            let task = self
                .tasks
                .get(name)
                .ok_or_else(|| AgentError::config(format!("Missing task '{}'", name)))?;
            if task.description.trim().is_empty() {
                return Err(AgentError::config(format!("Task '{}' has an empty description", name)));
            }
            let agent = self.agents.get(&task.agent).ok_or_else(|| {
                AgentError::config(format!(
                    "Task '{}' references unknown agent '{}'",
                    name, task.agent
                ))
            })?;
            let needed = AgentRole::all()
                .into_iter()
                .find(|role| role.task() == name)
                .map(|role| role.default_tools())
                .unwrap_or_default();
            for tool in needed {
                if !agent.tools.iter().any(|t| t == tool) {
                    return Err(AgentError::config(format!(
                        "Task '{}' needs tool '{}' which agent '{}' does not list",
                        name, tool, task.agent
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn agent(&self, role: AgentRole) -> Option<&AgentConfig> {
        self.agents.get(role.config_key())
    }

    /// Tasks in pipeline order with the role assigned to each.
    pub fn ordered_tasks(&self) -> AgentResult<Vec<(TaskSpec, AgentRole)>> {
        TASK_ORDER
            .iter()
            .map(|name| {
                let task = self
                    .tasks
                    .get(*name)
                    .ok_or_else(|| AgentError::config(format!("Missing task '{}'", name)))?;
                let role = AgentRole::from_key(&task.agent)
                    .ok_or_else(|| AgentError::UnknownRole(task.agent.clone()))?;
                Ok((task.spec(name), role))
            })
            .collect()
    }

    /// Scope grants derived from each role's tool list.
    pub fn grants(&self) -> ScopeGrants {
        let mut grants = ScopeGrants::new();
        for (key, agent) in &self.agents {
            let Some(role) = AgentRole::from_key(key) else {
                continue;
            };
            for scope in agent.tools.iter().filter_map(|t| scope_for(t)) {
                grants.insert(role.as_str(), scope);
            }
        }
        grants
    }
}
