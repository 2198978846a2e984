//! Attribute lookup for designators and selectors.

use crate::types::{DataType, EvaluationError, Request, XacmlVersion};

/// Resolves attribute designators and selectors to lexical values.
///
/// An empty result is not an error; the caller decides whether a missing
/// attribute is fatal for the expression.
pub trait AttributeSource {
    /// Values of the named attribute, in source order.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError`] if the lookup itself fails.
    fn values(
        &self,
        category: &str,
        attribute_id: &str,
        data_type: &str,
        issuer: Option<&str>,
    ) -> Result<Vec<String>, EvaluationError>;

    /// Values selected by an XPath expression over a category's content.
    ///
    /// # Errors
    ///
    /// The default implementation has no XPath engine and always fails with
    /// a processing error.
    fn values_by_xpath(
        &self,
        _version: XacmlVersion,
        path: &str,
        _category: &str,
        _context_selector_id: Option<&str>,
        _namespaces: &[(String, String)],
    ) -> Result<Vec<String>, EvaluationError> {
        Err(EvaluationError::processing(format!(
            "no XPath support for '{path}'"
        )))
    }
}

fn same_data_type(a: &str, b: &str) -> bool {
    match (DataType::from_uri(a), DataType::from_uri(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// The default source: answers from the attributes carried by the request,
/// then from an optional fallback.
pub struct RequestAttributeSource<'a> {
    request: &'a Request,
    fallback: Option<&'a dyn AttributeSource>,
}

impl<'a> RequestAttributeSource<'a> {
    #[must_use]
    pub fn new(request: &'a Request) -> Self {
        Self {
            request,
            fallback: None,
        }
    }

    /// Consult `fallback` when the request carries no matching attribute.
    #[must_use]
    pub fn with_fallback(mut self, fallback: &'a dyn AttributeSource) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl AttributeSource for RequestAttributeSource<'_> {
    fn values(
        &self,
        category: &str,
        attribute_id: &str,
        data_type: &str,
        issuer: Option<&str>,
    ) -> Result<Vec<String>, EvaluationError> {
        let found: Vec<String> = self
            .request
            .blocks(category)
            .flat_map(|block| &block.attributes)
            .filter(|a| a.attribute_id == attribute_id && same_data_type(&a.data_type, data_type))
            .filter(|a| issuer.is_none() || a.issuer.as_deref() == issuer)
            .flat_map(|a| a.values.iter().cloned())
            .collect();
        match self.fallback {
            Some(fallback) if found.is_empty() => {
                fallback.values(category, attribute_id, data_type, issuer)
            }
            _ => Ok(found),
        }
    }

    fn values_by_xpath(
        &self,
        version: XacmlVersion,
        path: &str,
        category: &str,
        context_selector_id: Option<&str>,
        namespaces: &[(String, String)],
    ) -> Result<Vec<String>, EvaluationError> {
        match self.fallback {
            Some(fallback) => {
                fallback.values_by_xpath(version, path, category, context_selector_id, namespaces)
            }
            None => Err(EvaluationError::processing(format!(
                "no XPath support for '{path}'"
            ))),
        }
    }
}
