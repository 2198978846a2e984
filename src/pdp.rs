use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::combining::{AlgorithmRegistry, CombiningAlgorithm};
use crate::config::PdpConfig;
use crate::error::PdpError;
use crate::evaluate::{EvaluationContext, Root, Services};
use crate::functions::{Function, FunctionRegistry};
use crate::multi;
use crate::repository::{InMemoryRepository, PolicyRepository, VersionConstraints};
use crate::source::{AttributeSource, RequestAttributeSource};
use crate::types::{
    ConfigError, EvaluationResult, Policy, PolicySet, Request, RequestBuilder,
};

/// Builder for a [`Pdp`].
///
/// The root policy or policy set is evaluated for every request; policies
/// added with [`policy`](Self::policy) and [`policy_set`](Self::policy_set)
/// are only reachable through id references.
///
/// # Example
///
/// ```
/// use xacml_pdp::{Decision, Effect, PdpBuilder, Policy, literal, uri};
///
/// let pdp = PdpBuilder::new()
///     .root_policy(
///         Policy::builder("allow-all", uri::algorithm::RULE_DENY_OVERRIDES)
///             .rule("permit", Effect::Permit, |r| r.when(literal(true)))
///             .build(),
///     )
///     .build()
///     .unwrap();
///
/// let results = pdp.evaluate(&pdp.request().build()).unwrap();
/// assert_eq!(results[0].decision, Decision::Permit);
/// ```
#[derive(Default)]
pub struct PdpBuilder {
    root: Option<Root>,
    local: InMemoryRepository,
    external: Option<Arc<dyn PolicyRepository>>,
    functions: Vec<(String, Arc<dyn Function>)>,
    algorithms: Vec<(String, Arc<dyn CombiningAlgorithm>)>,
    attribute_source: Option<Arc<dyn AttributeSource + Send + Sync>>,
    config: PdpConfig,
}

impl fmt::Debug for PdpBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdpBuilder")
            .field("root", &self.root)
            .field("local", &self.local)
            .field("external", &self.external.is_some())
            .field("functions", &self.functions.len())
            .field("algorithms", &self.algorithms.len())
            .field("attribute_source", &self.attribute_source.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl PdpBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `policy` for every request.
    #[must_use]
    pub fn root_policy(mut self, policy: impl Into<Arc<Policy>>) -> Self {
        self.root = Some(Root::Policy(policy.into()));
        self
    }

    /// Evaluate `set` for every request.
    #[must_use]
    pub fn root_policy_set(mut self, set: impl Into<Arc<PolicySet>>) -> Self {
        self.root = Some(Root::PolicySet(set.into()));
        self
    }

    /// Make `policy` available to references.
    #[must_use]
    pub fn policy(mut self, policy: impl Into<Arc<Policy>>) -> Self {
        self.local.add_policy(policy);
        self
    }

    /// Make `set` available to references.
    #[must_use]
    pub fn policy_set(mut self, set: impl Into<Arc<PolicySet>>) -> Self {
        self.local.add_policy_set(set);
        self
    }

    /// Consult `repository` for references the builder's own policies do
    /// not satisfy. Its policies are not validated at build time.
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn PolicyRepository>) -> Self {
        self.external = Some(repository);
        self
    }

    /// Add or replace a function.
    #[must_use]
    pub fn function(mut self, uri: impl Into<String>, function: Arc<dyn Function>) -> Self {
        self.functions.push((uri.into(), function));
        self
    }

    /// Add or replace a combining algorithm.
    #[must_use]
    pub fn algorithm(
        mut self,
        uri: impl Into<String>,
        algorithm: Arc<dyn CombiningAlgorithm>,
    ) -> Self {
        self.algorithms.push((uri.into(), algorithm));
        self
    }

    /// Consulted for attributes the request does not carry, and for every
    /// attribute selector.
    #[must_use]
    pub fn attribute_source(mut self, source: Arc<dyn AttributeSource + Send + Sync>) -> Self {
        self.attribute_source = Some(source);
        self
    }

    #[must_use]
    pub fn config(mut self, config: PdpConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the policies and assemble the PDP.
    ///
    /// # Errors
    ///
    /// Returns [`PdpError::Config`] when no root was given, or when a policy
    /// names an unknown function, datatype or combining algorithm, refers to
    /// an undefined variable, defines variables cyclically, repeats a rule
    /// or variable id, or carries a malformed version.
    pub fn build(self) -> Result<Pdp, PdpError> {
        let root = self.root.ok_or(ConfigError::MissingPolicy)?;

        let mut functions = FunctionRegistry::standard().clone();
        for (uri, function) in self.functions {
            functions.register(uri, function);
        }
        let mut algorithms = AlgorithmRegistry::standard().clone();
        for (uri, algorithm) in self.algorithms {
            algorithms.register(uri, algorithm);
        }

        crate::compile::validate(&root, &self.local, &functions, &algorithms)?;
        debug!(
            functions = functions.len(),
            algorithms = algorithms.len(),
            "policy decision point built"
        );

        Ok(Pdp {
            root,
            repository: Layered {
                local: self.local,
                external: self.external,
            },
            functions,
            algorithms,
            fallback: self.attribute_source,
            config: self.config,
        })
    }
}

/// Policies from the builder first, then the external repository.
struct Layered {
    local: InMemoryRepository,
    external: Option<Arc<dyn PolicyRepository>>,
}

impl PolicyRepository for Layered {
    fn resolve_policy(&self, id: &str, constraints: &VersionConstraints) -> Option<Arc<Policy>> {
        self.local.resolve_policy(id, constraints).or_else(|| {
            self.external
                .as_ref()
                .and_then(|external| external.resolve_policy(id, constraints))
        })
    }

    fn resolve_policy_set(
        &self,
        id: &str,
        constraints: &VersionConstraints,
    ) -> Option<Arc<PolicySet>> {
        self.local.resolve_policy_set(id, constraints).or_else(|| {
            self.external
                .as_ref()
                .and_then(|external| external.resolve_policy_set(id, constraints))
        })
    }
}

/// A validated, immutable policy decision point. Thread-safe and designed
/// to live behind `Arc`.
pub struct Pdp {
    root: Root,
    repository: Layered,
    functions: FunctionRegistry,
    algorithms: AlgorithmRegistry,
    fallback: Option<Arc<dyn AttributeSource + Send + Sync>>,
    config: PdpConfig,
}

impl fmt::Debug for Pdp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdp")
            .field("root", &self.root)
            .field("functions", &self.functions)
            .field("algorithms", &self.algorithms)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pdp {
    #[must_use]
    pub fn builder() -> PdpBuilder {
        PdpBuilder::new()
    }

    /// Start a request in the configured default version.
    #[must_use]
    pub fn request(&self) -> RequestBuilder {
        Request::builder(self.config.default_version)
    }

    #[must_use]
    pub fn config(&self) -> &PdpConfig {
        &self.config
    }

    /// Evaluate `request` against the root policy.
    ///
    /// Returns one result per individual request. A 3.0 request asking for
    /// several decisions is split first; with `combined_decision` set the
    /// results are merged into one.
    ///
    /// Problems with the request or the attributes only ever produce
    /// Indeterminate results.
    ///
    /// # Errors
    ///
    /// Returns [`PdpError::Config`] if evaluation reaches a configuration
    /// error, for instance an unknown function in a policy served by an
    /// external repository.
    pub fn evaluate(&self, request: &Request) -> Result<Vec<EvaluationResult>, PdpError> {
        let services = Services {
            functions: &self.functions,
            algorithms: &self.algorithms,
            repository: &self.repository,
            config: &self.config,
        };

        let mut results = Vec::new();
        for individual in multi::split(request) {
            let result = match individual {
                Ok(individual) => self.evaluate_individual(services, &individual)?,
                Err(err) => {
                    debug!(error = %err, "individual request rejected");
                    EvaluationResult::indeterminate(&err)
                }
            };
            results.push(result);
        }

        if request.combined_decision && results.len() > 1 {
            results = vec![multi::combine(results)];
        }
        Ok(results)
    }

    fn evaluate_individual(
        &self,
        services: Services<'_>,
        request: &Request,
    ) -> Result<EvaluationResult, ConfigError> {
        let source = match &self.fallback {
            Some(fallback) => RequestAttributeSource::new(request).with_fallback(fallback.as_ref()),
            None => RequestAttributeSource::new(request),
        };
        let ctx = EvaluationContext::new(
            services,
            request.version,
            &source,
            request.return_policy_id_list,
        );
        let mut result = ctx.evaluate_root(&self.root)?;
        result.attributes = multi::echoed(request);
        debug!(
            version = %request.version,
            decision = ?result.decision,
            status = %result.status.code,
            "request evaluated"
        );
        Ok(result)
    }
}
