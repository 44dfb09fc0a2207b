//! Agents: a persona bound to an identity context and a toolbox.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crewgate_identity::AgentContext;

use crate::tool::Toolbox;

/// Persona text handed to the agent runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Short role title (e.g. "Pull Request Analyzer")
    pub role: String,
    /// What the agent is trying to achieve
    pub goal: String,
    /// Background the runtime may use to phrase its output
    #[serde(default)]
    pub backstory: String,
}

impl Persona {
    pub fn new(role: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: String::new(),
        }
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }
}

/// An agent role ready to run a stage.
pub struct Agent {
    persona: Persona,
    context: AgentContext,
    tools: Toolbox,
}

impl Agent {
    /// Bind a persona to an identity context and the tools it may use.
    ///
    /// Tools whose scope the context does not hold are kept (calls to them
    /// will be denied by the guard) but reported at construction.
    pub fn new(persona: Persona, context: AgentContext, tools: Toolbox) -> Self {
        for scope in tools.required_scopes() {
            if !context.holds(&scope) {
                warn!(
                    "Agent {} was given a tool requiring {} which it is not granted",
                    context.role(),
                    scope
                );
            }
        }

        Self {
            persona,
            context,
            tools,
        }
    }

    /// The agent's role name (its identity context name).
    pub fn name(&self) -> &str {
        self.context.role()
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    pub fn tools(&self) -> &Toolbox {
        &self.tools
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name())
            .field("persona", &self.persona.role)
            .field("tools", &self.tools)
            .finish()
    }
}
