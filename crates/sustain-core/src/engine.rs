//! The SUSTAIN engine.
//!
//! Routes each user message either to the math short-circuit or through
//! the optimizer to the language model, and records the savings of every
//! completed exchange in the caller's [`Session`].

use std::sync::Arc;
use std::time::Duration;

use sustain_token::{TokenCounter, load_tokenizer};
use tracing::{debug, info, warn};

use crate::config::SustainConfig;
use crate::error::{SustainError, SustainResult};
use crate::llm::LanguageModel;
use crate::math::{self, MathShortCircuit};
use crate::optimizer::{RuleHit, TextOptimizer};
use crate::savings::{
    EnergyProjection, ImpactRates, SavingsAccountant, SavingsRecord, SessionReport, SessionStats,
};

/// Savings state of one conversation.
///
/// Exchanges take the session by `&mut`, so two exchanges on the same
/// session can never interleave.
#[derive(Debug, Clone, Default)]
pub struct Session {
    accountant: SavingsAccountant,
}

impl Session {
    pub fn new(rates: ImpactRates) -> Self {
        Self {
            accountant: SavingsAccountant::new(rates),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        self.accountant.stats()
    }

    pub fn history(&self) -> &[SavingsRecord] {
        self.accountant.history()
    }

    /// Mean percentage saved so far; 0.0 for a fresh session.
    pub fn running_average(&self) -> f64 {
        self.accountant.running_average()
    }

    pub fn project_annual_impact(&self) -> EnergyProjection {
        self.accountant.project_annual_impact()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport::new(&self.accountant)
    }

    /// Forget every recorded exchange.
    pub fn reset(&mut self) {
        self.accountant.reset();
    }

    fn record(
        &mut self,
        original_tokens: usize,
        optimized_tokens: usize,
        response_tokens: usize,
        was_math_shortcut: bool,
    ) -> SavingsRecord {
        self.accountant
            .record_exchange(original_tokens, optimized_tokens, response_tokens, was_math_shortcut)
    }
}

/// Prompt optimization and short-circuit engine.
pub struct SustainEngine {
    counter: Arc<dyn TokenCounter>,
    optimizer: TextOptimizer,
    math: MathShortCircuit,
    model: Arc<dyn LanguageModel>,
    rates: ImpactRates,
    timeout: Duration,
}

impl SustainEngine {
    /// Assemble an engine from its parts.
    pub fn new(
        counter: Arc<dyn TokenCounter>,
        optimizer: TextOptimizer,
        math: MathShortCircuit,
        model: Arc<dyn LanguageModel>,
        rates: ImpactRates,
        timeout: Duration,
    ) -> Self {
        Self {
            counter,
            optimizer,
            math,
            model,
            rates,
            timeout,
        }
    }

    /// Build an engine from configuration around the given model backend.
    pub fn from_config(config: &SustainConfig, model: Arc<dyn LanguageModel>) -> SustainResult<Self> {
        config.validate()?;

        let counter = load_tokenizer(config.tokenizer)
            .map_err(|e| SustainError::config(format!("Failed to load tokenizer {}: {}", config.tokenizer, e)))?;
        let optimizer = TextOptimizer::from_config(config)?;
        let timeout = Duration::try_from_secs_f64(config.model_timeout_seconds)
            .map_err(|e| SustainError::config(format!("Invalid model_timeout_seconds: {}", e)))?;

        debug!(
            tokenizer = counter.name(),
            rules = optimizer.rules().len(),
            model = model.name(),
            "Engine configured"
        );

        Ok(Self::new(
            counter,
            optimizer,
            MathShortCircuit::new(config.math_named_functions),
            model,
            ImpactRates::from_config(config),
            timeout,
        ))
    }

    /// A fresh session using this engine's projection rates.
    pub fn new_session(&self) -> Session {
        Session::new(self.rates)
    }

    /// Answer one user message and return the reply with the percentage of
    /// prompt tokens saved.
    ///
    /// The session is only updated when a reply is produced; a failed or
    /// timed-out model call leaves it untouched.
    pub async fn get_response(&self, session: &mut Session, text: &str) -> SustainResult<(String, f64)> {
        if text.trim().is_empty() {
            return Err(SustainError::invalid_input("Message is empty"));
        }

        let original_tokens = self.counter.count_tokens(text);

        if let Some(value) = self.math.try_solve(text) {
            let reply = math::format_number(value);
            let record = session.record(original_tokens, 0, self.counter.count_tokens(&reply), true);
            info!(original_tokens, "Answered locally by math short-circuit");
            return Ok((reply, record.percentage_saved));
        }

        let optimized = self.optimizer.optimize(text);
        let optimized_tokens = self.counter.count_tokens(&optimized);
        debug!(original_tokens, optimized_tokens, prompt = %optimized, "Prompt optimized");

        let reply = match tokio::time::timeout(self.timeout, self.model.complete(&optimized)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(model = self.model.name(), error = %err, "Model call failed");
                return Err(match err {
                    SustainError::Upstream(_) => err,
                    other => SustainError::upstream(other.to_string()),
                });
            }
            Err(_) => {
                warn!(model = self.model.name(), timeout = ?self.timeout, "Model call timed out");
                return Err(SustainError::upstream(format!(
                    "Model did not answer within {:.1}s",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        let record = session.record(
            original_tokens,
            optimized_tokens,
            self.counter.count_tokens(&reply),
            false,
        );
        info!(
            original_tokens,
            optimized_tokens,
            percentage_saved = record.percentage_saved,
            "Exchange completed"
        );

        Ok((reply, record.percentage_saved))
    }

    /// Evaluate `text` if it is a pure arithmetic query.
    pub fn try_solve(&self, text: &str) -> Option<f64> {
        self.math.try_solve(text)
    }

    pub fn optimize(&self, text: &str) -> String {
        self.optimizer.optimize(text)
    }

    pub fn explain(&self, text: &str) -> (String, Vec<RuleHit>) {
        self.optimizer.explain(text)
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count_tokens(text)
    }

    pub fn project_annual_impact(&self, session: &Session) -> EnergyProjection {
        session.project_annual_impact()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sustain_token::TokenizerKind;

    use super::*;

    enum Behavior {
        Reply(&'static str),
        Fail,
        Stall,
    }

    struct ScriptedModel {
        behavior: Behavior,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> SustainResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.behavior {
                Behavior::Reply(text) => Ok(text.to_string()),
                Behavior::Fail => Err(SustainError::upstream("rate limited")),
                Behavior::Stall => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }

    fn engine_with(model: Arc<ScriptedModel>, timeout_seconds: f64) -> SustainEngine {
        let config = SustainConfig {
            tokenizer: TokenizerKind::Heuristic,
            model_timeout_seconds: timeout_seconds,
            ..SustainConfig::default()
        };
        SustainEngine::from_config(&config, model).unwrap()
    }

    #[tokio::test]
    async fn test_optimized_prompt_reaches_model() {
        let model = ScriptedModel::new(Behavior::Reply("Paris"));
        let engine = engine_with(model.clone(), 5.0);
        let mut session = engine.new_session();

        let (reply, saved) = engine
            .get_response(&mut session, "Could you please tell me what the capital of France is?")
            .await
            .unwrap();

        assert_eq!(reply, "Paris");
        assert!(saved > 0.0 && saved < 100.0);
        assert_eq!(model.calls(), 1);
        assert_eq!(
            model.prompts.lock().unwrap()[0],
            "what capital of France is?"
        );
        assert_eq!(session.stats().message_count, 1);
        assert_eq!(session.running_average(), saved);
        assert!(!session.history()[0].was_math_shortcut);
    }

    #[tokio::test]
    async fn test_math_never_calls_model() {
        let model = ScriptedModel::new(Behavior::Reply("unused"));
        let engine = engine_with(model.clone(), 5.0);
        let mut session = engine.new_session();

        let (reply, saved) = engine.get_response(&mut session, "12 * (3 + 4)").await.unwrap();

        assert_eq!(reply, "84");
        assert_eq!(saved, 100.0);
        assert_eq!(model.calls(), 0);
        let record = session.history()[0];
        assert!(record.was_math_shortcut);
        assert_eq!(record.optimized_tokens, 0);
    }

    #[tokio::test]
    async fn test_running_average_over_mixed_exchanges() {
        let model = ScriptedModel::new(Behavior::Reply("ok"));
        let engine = engine_with(model, 5.0);
        let mut session = engine.new_session();

        let (_, first) = engine.get_response(&mut session, "Hello, how does DNS work?").await.unwrap();
        let (_, second) = engine.get_response(&mut session, "what is 2 + 2").await.unwrap();

        assert_eq!(second, 100.0);
        assert_eq!(session.stats().message_count, 2);
        assert_eq!(session.running_average(), (first + second) / 2.0);
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_session_unchanged() {
        let model = ScriptedModel::new(Behavior::Fail);
        let engine = engine_with(model.clone(), 5.0);
        let mut session = engine.new_session();

        let err = engine
            .get_response(&mut session, "Explain how tides work")
            .await
            .unwrap_err();

        assert!(matches!(err, SustainError::Upstream(_)));
        assert_eq!(model.calls(), 1);
        assert_eq!(*session.stats(), SessionStats::default());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_error() {
        let model = ScriptedModel::new(Behavior::Stall);
        let engine = engine_with(model, 0.05);
        let mut session = engine.new_session();

        let err = engine
            .get_response(&mut session, "Explain how tides work")
            .await
            .unwrap_err();

        assert!(matches!(err, SustainError::Upstream(_)));
        assert_eq!(session.stats().message_count, 0);
    }

    #[tokio::test]
    async fn test_dropped_exchange_leaves_session_untouched() {
        let model = ScriptedModel::new(Behavior::Stall);
        let engine = engine_with(model.clone(), 30.0);
        let mut session = engine.new_session();

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            engine.get_response(&mut session, "Explain how tides work"),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(model.calls(), 1);
        assert_eq!(*session.stats(), SessionStats::default());
        assert!(session.history().is_empty());
        assert_eq!(session.running_average(), 0.0);
    }

    #[test]
    fn test_local_operations_skip_model() {
        let model = ScriptedModel::new(Behavior::Fail);
        let engine = engine_with(model.clone(), 5.0);

        assert_eq!(engine.try_solve("2 + 2"), Some(4.0));
        assert_eq!(engine.try_solve("Explain tides"), None);
        assert!(engine.count_tokens("hello world") > 0);
        let (optimized, hits) = engine.explain("Can you show me the logs");
        assert_eq!(optimized, engine.optimize("Can you show me the logs"));
        assert!(!hits.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let model = ScriptedModel::new(Behavior::Reply("unused"));
        let engine = engine_with(model.clone(), 5.0);
        let mut session = engine.new_session();

        for input in ["", "   ", "\n\t"] {
            let err = engine.get_response(&mut session, input).await.unwrap_err();
            assert!(matches!(err, SustainError::InvalidInput(_)));
        }
        assert_eq!(model.calls(), 0);
        assert_eq!(session.stats().message_count, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let model = ScriptedModel::new(Behavior::Reply("ok"));
        let engine = engine_with(model, 5.0);
        let mut first = engine.new_session();
        let second = engine.new_session();

        engine.get_response(&mut first, "1 + 1").await.unwrap();

        assert_eq!(first.stats().message_count, 1);
        assert_eq!(second.stats().message_count, 0);
        assert_eq!(engine.project_annual_impact(&second).tokens_saved, 0);
        assert!(engine.project_annual_impact(&first).tokens_saved > 0);
    }

    #[tokio::test]
    async fn test_reset_clears_session() {
        let model = ScriptedModel::new(Behavior::Reply("ok"));
        let engine = engine_with(model, 5.0);
        let mut session = engine.new_session();

        engine.get_response(&mut session, "3 ^ 2").await.unwrap();
        session.reset();

        assert_eq!(session.running_average(), 0.0);
        assert!(session.report().records.is_empty());
    }

    #[test]
    fn test_invalid_rule_is_config_error() {
        let config = SustainConfig {
            tokenizer: TokenizerKind::Heuristic,
            optimizer_rules: vec![crate::config::RuleConfig {
                name: None,
                pattern: "(unclosed".to_string(),
                replacement: String::new(),
            }],
            ..SustainConfig::default()
        };
        let model = ScriptedModel::new(Behavior::Reply("unused"));
        let result = SustainEngine::from_config(&config, model);
        assert!(matches!(result, Err(SustainError::Config(_))));
    }
}
