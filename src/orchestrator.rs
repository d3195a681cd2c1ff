//! Assembly of the assistant from configuration.
//!
//! Builds the model, the API clients and the tool registry, and hands out
//! conversations started from the configured profiles.

use crate::agent::{ChatAgent, Conversation, StateEmitter, ToolRegistry, TurnOutput, TurnRequest};
use crate::clients::{
    Geocoder, NominatimGeocoder, OpenMeteoClient, SearchBackend, TavilyClient, WeatherService,
};
use crate::config::{AgentProfile, Prompts, Settings};
use crate::error::{Result, SporError};
use crate::llm::{ChatModel, OpenAIChatModel, ToolSpec};
use crate::search::{SearchExecutor, SearchPlanner};
use crate::tools::{ConfirmationTool, WeatherTool, WebSearchTool};
use std::sync::Arc;
use tracing::{info, warn};

/// Models and service clients the assistant is built from.
pub struct Services {
    pub chat_model: Arc<dyn ChatModel>,
    pub planner_model: Arc<dyn ChatModel>,
    pub synthesis_model: Arc<dyn ChatModel>,
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherService>,
    /// Absent when no search API key is configured.
    pub search: Option<Arc<dyn SearchBackend>>,
}

impl Services {
    /// Connect to the configured OpenAI, Nominatim, Open-Meteo and Tavily endpoints.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let model = |name: &str| -> Result<Arc<dyn ChatModel>> {
            Ok(Arc::new(
                OpenAIChatModel::new(name, settings.model.timeout())?
                    .with_parallel_tool_calls(settings.model.parallel_tool_calls),
            ))
        };

        let search: Option<Arc<dyn SearchBackend>> = match settings.search.resolved_api_key() {
            Some(key) => Some(Arc::new(TavilyClient::new(
                &settings.search.api_url,
                &key,
                &settings.search.search_depth,
                settings.search.timeout(),
            )?)),
            None => {
                warn!("TAVILY_API_KEY not set, web search is disabled");
                None
            }
        };

        Ok(Self {
            chat_model: model(&settings.model.chat_model)?,
            planner_model: model(&settings.model.planner_model)?,
            synthesis_model: model(&settings.model.synthesis_model)?,
            geocoder: Arc::new(NominatimGeocoder::new(
                &settings.weather.geocoding_url,
                &settings.weather.user_agent,
                settings.weather.timeout(),
            )?),
            weather: Arc::new(OpenMeteoClient::new(
                &settings.weather.forecast_url,
                settings.weather.timeout(),
            )?),
            search,
        })
    }
}

/// The assembled assistant.
pub struct Orchestrator {
    settings: Settings,
    prompts: Arc<Prompts>,
    agent: ChatAgent,
    planner: SearchPlanner,
    search: Option<Arc<dyn SearchBackend>>,
    synthesis_model: Arc<dyn ChatModel>,
}

impl Orchestrator {
    /// Build the assistant against the real services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let services = Services::from_settings(&settings)?;
        Ok(Self::with_services(settings, prompts, services))
    }

    /// Build the assistant from explicit services.
    pub fn with_services(settings: Settings, prompts: Prompts, services: Services) -> Self {
        let prompts = Arc::new(prompts);

        let planner = SearchPlanner::new(services.planner_model.clone(), prompts.clone())
            .with_temperature(settings.model.planner_temperature)
            .with_max_queries(settings.search.max_queries);

        let mut tools = ToolRegistry::new().with(Arc::new(WeatherTool::new(
            services.geocoder,
            services.weather,
        )));

        if let Some(backend) = &services.search {
            let executor = build_executor(
                &settings,
                backend.clone(),
                services.synthesis_model.clone(),
                prompts.clone(),
            );
            tools.register(Arc::new(WebSearchTool::new(planner.clone(), executor)));
        }

        tools.register(Arc::new(ConfirmationTool));

        info!(
            "Assistant ready with model {} and {} tools",
            services.chat_model.model_name(),
            tools.len()
        );

        let agent = ChatAgent::new(services.chat_model, tools)
            .with_prompts(prompts.clone())
            .with_routing(settings.agent.routing)
            .with_max_iterations(settings.agent.max_iterations);

        Self {
            settings,
            prompts,
            agent,
            planner,
            search: services.search,
            synthesis_model: services.synthesis_model,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn agent(&self) -> &ChatAgent {
        &self.agent
    }

    /// Definitions of the tools the model is offered.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.agent.tools().specs()
    }

    /// Look up a profile; `None` selects the configured default.
    pub fn profile(&self, key: Option<&str>) -> Result<&AgentProfile> {
        self.settings
            .profile(key.unwrap_or(self.settings.agent.default_profile.as_str()))
    }

    /// Start an empty conversation with the given profile.
    pub fn new_conversation(&self, profile: Option<&str>) -> Result<Conversation> {
        Ok(Conversation::new(self.profile(profile)?))
    }

    /// Run one turn of a conversation.
    pub async fn run_turn(
        &self,
        conversation: Conversation,
        request: TurnRequest,
        emitter: &StateEmitter,
    ) -> Result<TurnOutput> {
        self.agent.run_turn(conversation, request, emitter).await
    }

    pub fn planner(&self) -> &SearchPlanner {
        &self.planner
    }

    /// Search executor, if web search is configured.
    pub fn executor(&self) -> Result<SearchExecutor> {
        let backend = self.search.clone().ok_or_else(|| {
            SporError::Config("Web search requires TAVILY_API_KEY or search.api_key".to_string())
        })?;
        Ok(build_executor(
            &self.settings,
            backend,
            self.synthesis_model.clone(),
            self.prompts.clone(),
        ))
    }
}

fn build_executor(
    settings: &Settings,
    backend: Arc<dyn SearchBackend>,
    model: Arc<dyn ChatModel>,
    prompts: Arc<Prompts>,
) -> SearchExecutor {
    SearchExecutor::new(backend, model, prompts)
        .with_max_results(settings.search.max_results, settings.search.plan_max_results)
        .with_pacing(settings.search.pacing())
        .with_synthesis(
            settings.model.synthesis_temperature,
            settings.search.summary_max_words,
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StopReason;
    use crate::clients::WeatherReading;
    use crate::llm::Completion;
    use crate::testing::{tool_call, FakeGeocoder, FakeSearch, FakeWeather, ScriptedModel};

    fn reading() -> WeatherReading {
        WeatherReading {
            temperature: 21.0,
            humidity: 55.0,
            weather_code: 1.0,
        }
    }

    fn services(model: Arc<ScriptedModel>, search: bool) -> Services {
        Services {
            chat_model: model.clone(),
            planner_model: model.clone(),
            synthesis_model: model,
            geocoder: Arc::new(FakeGeocoder::new()),
            weather: Arc::new(FakeWeather::new(reading())),
            search: search.then(|| Arc::new(FakeSearch::new()) as Arc<dyn SearchBackend>),
        }
    }

    fn orchestrator(model: Arc<ScriptedModel>, search: bool) -> Orchestrator {
        let mut settings = Settings::default();
        settings.search.pacing_ms = 0;
        Orchestrator::with_services(settings, Prompts::default(), services(model, search))
    }

    #[test]
    fn test_registry_depends_on_search_backend() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let names = |o: &Orchestrator| o.tool_specs().into_iter().map(|s| s.name).collect::<Vec<_>>();

        let with_search = orchestrator(model.clone(), true);
        assert_eq!(
            names(&with_search),
            vec!["get_weather", "web_search", "ask_user_confirmation"]
        );

        let without_search = orchestrator(model, false);
        assert_eq!(names(&without_search), vec!["get_weather", "ask_user_confirmation"]);
        assert!(matches!(without_search.executor(), Err(SporError::Config(_))));
    }

    #[tokio::test]
    async fn test_oversized_max_queries_setting_is_capped() {
        let model = Arc::new(ScriptedModel::new(vec![Completion {
            content: Some(r#"["q1", "q2", "q3", "q4", "q5", "q6", "q7", "q8"]"#.to_string()),
            tool_calls: vec![],
        }]));
        let mut settings = Settings::default();
        settings.search.max_queries = 8;
        let o = Orchestrator::with_services(settings, Prompts::default(), services(model.clone(), true));

        let plan = o.planner().plan("q").await;
        assert!(!plan.is_empty());
        assert!(plan.len() <= 5);

        let prompt = model.requests()[0].messages[0].text().unwrap().to_string();
        assert!(prompt.contains("Maximum 5 search queries"));
    }

    #[test]
    fn test_conversations_start_from_profiles() {
        let o = orchestrator(Arc::new(ScriptedModel::new(vec![])), false);

        let conversation = o.new_conversation(None).unwrap();
        assert_eq!(conversation.session.agent_name, "Jarvis");

        let conversation = o.new_conversation(Some("spanish_assistant")).unwrap();
        assert_eq!(conversation.session.agent_name, "Carlos");

        assert!(o.new_conversation(Some("pirate")).is_err());
    }

    #[tokio::test]
    async fn test_weather_question_end_to_end() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![tool_call("w", "get_weather", r#"{"location": "Oslo"}"#)],
            },
            Completion {
                content: Some("It is 21°C and partly cloudy in Oslo.".to_string()),
                tool_calls: vec![],
            },
        ]));
        let o = orchestrator(model, false);
        let conversation = o.new_conversation(Some("weather_expert")).unwrap();

        let output = o
            .run_turn(conversation, TurnRequest::user("Weather in Oslo?"), &StateEmitter::disabled())
            .await
            .unwrap();

        assert_eq!(output.stop, StopReason::FinalAnswer);
        assert_eq!(output.conversation.session.weather, Some(reading()));
        assert_eq!(output.observed_steps.len(), 3);
        assert_eq!(output.tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_place_is_reported_to_model() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![tool_call("w", "get_weather", r#"{"location": "Atlantis"}"#)],
            },
            Completion {
                content: Some("I could not find Atlantis.".to_string()),
                tool_calls: vec![],
            },
        ]));
        let o = orchestrator(model, false);
        let conversation = o.new_conversation(None).unwrap();

        let output = o
            .run_turn(conversation, TurnRequest::user("Weather in Atlantis?"), &StateEmitter::disabled())
            .await
            .unwrap();

        assert_eq!(
            output.tool_calls[0].result,
            "Unable to find coordinates for Atlantis!"
        );
        assert!(output.conversation.session.weather.is_none());
    }
}
