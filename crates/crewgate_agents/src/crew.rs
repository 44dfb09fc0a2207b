//! The three-stage review crew.

use std::sync::Arc;

use tracing::{debug, info};

use crewgate_core::{Agent, AgentRuntime, CoreResult, ExecutionLog, Pipeline, Stage, Toolbox};
use crewgate_github::{bind_tool, ApiClient, ApiSettings, HttpTransport, RepoTarget, ToolBinding};
use crewgate_identity::{Credentials, IdentityProvider, TokenIssuer};

use crate::config::CrewConfig;
use crate::error::{AgentError, AgentResult};
use crate::roles::AgentRole;
use crate::runtime::HeuristicRuntime;

pub const PIPELINE_NAME: &str = "pr-review";

/// A built review pipeline together with the identity provider its agents
/// borrow from.
pub struct ReviewCrew {
    provider: IdentityProvider,
    repo: RepoTarget,
    client: ApiClient,
    pipeline: Pipeline<3>,
}

impl ReviewCrew {
    pub fn builder(config: CrewConfig) -> ReviewCrewBuilder {
        ReviewCrewBuilder {
            config,
            credentials: None,
            issuer: None,
            tracing: false,
            repo: None,
            settings: ApiSettings::default(),
            transport: None,
            runtime: None,
        }
    }

    pub fn provider(&self) -> &IdentityProvider {
        &self.provider
    }

    pub fn repo(&self) -> &RepoTarget {
        &self.repo
    }

    pub fn pipeline(&self) -> &Pipeline<3> {
        &self.pipeline
    }

    /// A tool binding for `role`, for calling capabilities outside the pipeline.
    pub fn binding(&self, role: AgentRole) -> AgentResult<ToolBinding> {
        Ok(ToolBinding::new(
            self.repo.clone(),
            self.client.clone(),
            self.provider.create_agent_context(role.as_str())?,
        ))
    }

    /// Run the pipeline once.
    pub async fn run(&mut self) -> CoreResult<ExecutionLog> {
        info!("Running review crew against {}", self.repo);
        self.pipeline.run().await
    }
}

impl std::fmt::Debug for ReviewCrew {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewCrew")
            .field("repo", &self.repo)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// Builder for [`ReviewCrew`].
pub struct ReviewCrewBuilder {
    config: CrewConfig,
    credentials: Option<Credentials>,
    issuer: Option<Arc<dyn TokenIssuer>>,
    tracing: bool,
    repo: Option<RepoTarget>,
    settings: ApiSettings,
    transport: Option<Arc<dyn HttpTransport>>,
    runtime: Option<Arc<dyn AgentRuntime>>,
}

impl ReviewCrewBuilder {
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn tracing(mut self, enabled: bool) -> Self {
        self.tracing = enabled;
        self
    }

    pub fn repo(mut self, repo: RepoTarget) -> Self {
        self.repo = Some(repo);
        self
    }

    pub fn settings(mut self, settings: ApiSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Transport for API calls (defaults to `reqwest`).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Runtime performing the stages (defaults to [`HeuristicRuntime`]).
    pub fn runtime(mut self, runtime: Arc<dyn AgentRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validate everything and assemble the pipeline.
    ///
    /// Fails before any stage runs on missing credentials, a missing
    /// repository, bad API settings or an invalid configuration.
    pub fn build(self) -> AgentResult<ReviewCrew> {
        self.config.validate()?;

        let credentials = self
            .credentials
            .ok_or_else(|| AgentError::config("Credentials are required"))?;
        let repo = self
            .repo
            .ok_or_else(|| AgentError::config("Target repository is required"))?;
        self.settings.validate()?;

        let mut provider = IdentityProvider::builder(credentials)
            .tracing(self.tracing)
            .grants(self.config.grants());
        if let Some(issuer) = self.issuer {
            provider = provider.issuer(issuer);
        }
        let provider = provider.build();

        let client = match self.transport {
            Some(transport) => ApiClient::new(self.settings, transport),
            None => ApiClient::http(self.settings),
        };

        let tasks = self.config.ordered_tasks()?;
        let mut stages = Vec::with_capacity(tasks.len());
        for (task, role) in tasks {
            let agent_config = self
                .config
                .agent(role)
                .ok_or_else(|| AgentError::UnknownRole(role.config_key().to_string()))?;

            let context = provider.create_agent_context(role.as_str())?;
            let mut tools = Toolbox::new();
            for name in &agent_config.tools {
                let binding = ToolBinding::new(repo.clone(), client.clone(), context.clone());
                tools.register(bind_tool(name, binding)?);
            }
            debug!("Stage {} runs as {} with tools {:?}", task.name, role, tools.names());

            stages.push(Stage::new(task, Agent::new(agent_config.persona(), context, tools)));
        }

        let stages: [Stage; 3] = stages
            .try_into()
            .map_err(|_| AgentError::config("The review crew needs exactly three stages"))?;

        let runtime: Arc<dyn AgentRuntime> = match self.runtime {
            Some(runtime) => runtime,
            None => Arc::new(HeuristicRuntime::new()),
        };
        let pipeline = Pipeline::new(PIPELINE_NAME, stages, runtime)?;

        info!("Built review crew for {} ({:?})", repo, pipeline);

        Ok(ReviewCrew {
            provider,
            repo,
            client,
            pipeline,
        })
    }
}
