use super::expr::{AttributeDesignator, AttributeSelector, AttributeValue};

/// Conjunction of disjunctions of conjunctions of [`Match`]es. An empty
/// target matches every request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
    pub any_of: Vec<AnyOf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyOf {
    pub all_of: Vec<AllOf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllOf {
    pub matches: Vec<Match>,
}

/// Compares a literal (first argument) against every member of the bag the
/// source yields (second argument) with a boolean function.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub function: String,
    pub value: AttributeValue,
    pub source: MatchSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchSource {
    Designator(AttributeDesignator),
    Selector(AttributeSelector),
}

impl Target {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a target from the 1.0/2.0 four-section form. Each section
    /// becomes one [`AnyOf`]; an empty section stands for `Any*` and
    /// always matches.
    #[must_use]
    pub fn legacy(
        subjects: Vec<AllOf>,
        resources: Vec<AllOf>,
        actions: Vec<AllOf>,
        environments: Vec<AllOf>,
    ) -> Self {
        Self {
            any_of: [subjects, resources, actions, environments]
                .into_iter()
                .map(|all_of| AnyOf { all_of })
                .collect(),
        }
    }

    #[must_use]
    pub fn any_of(mut self, any_of: AnyOf) -> Self {
        self.any_of.push(any_of);
        self
    }

    /// Shorthand for a target with a single match.
    #[must_use]
    pub fn single(m: Match) -> Self {
        Self::new().any_of(AnyOf::new().all_of(AllOf::new().matching(m)))
    }
}

impl AnyOf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn all_of(mut self, all_of: AllOf) -> Self {
        self.all_of.push(all_of);
        self
    }
}

impl AllOf {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn matching(mut self, m: Match) -> Self {
        self.matches.push(m);
        self
    }
}

impl Match {
    pub fn new(
        function: impl Into<String>,
        value: impl Into<AttributeValue>,
        source: impl Into<MatchSource>,
    ) -> Self {
        Self {
            function: function.into(),
            value: value.into(),
            source: source.into(),
        }
    }
}

impl From<AttributeDesignator> for MatchSource {
    fn from(d: AttributeDesignator) -> Self {
        MatchSource::Designator(d)
    }
}

impl From<AttributeSelector> for MatchSource {
    fn from(s: AttributeSelector) -> Self {
        MatchSource::Selector(s)
    }
}
