use super::decision::XacmlVersion;
use super::expr::AttributeValue;

/// An authorization request: attribute blocks grouped by category.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    /// Selects the evaluation semantics.
    pub version: XacmlVersion,
    pub attributes: Vec<Attributes>,
    pub return_policy_id_list: bool,
    pub combined_decision: bool,
    /// Multiple Decision Profile references, each naming the ids of the
    /// attribute blocks forming one individual request.
    pub multi_requests: Vec<RequestReference>,
}

/// One `<Attributes>` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    pub category: String,
    /// `xml:id`, the target of [`RequestReference`]s.
    pub id: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl Attributes {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            id: None,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub attribute_id: String,
    pub issuer: Option<String>,
    pub data_type: String,
    /// Lexical forms, converted on lookup.
    pub values: Vec<String>,
    pub include_in_result: bool,
}

impl Attribute {
    /// A single-valued attribute; the datatype is taken from the value.
    pub fn new(attribute_id: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let value = value.into();
        Self {
            attribute_id: attribute_id.into(),
            issuer: None,
            data_type: value.data_type,
            values: vec![value.value],
            include_in_result: false,
        }
    }

    /// Add another value of the same datatype.
    #[must_use]
    pub fn value(mut self, text: impl Into<String>) -> Self {
        self.values.push(text.into());
        self
    }

    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn include_in_result(mut self) -> Self {
        self.include_in_result = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestReference {
    pub attributes_ids: Vec<String>,
}

impl Request {
    #[must_use]
    pub fn builder(version: XacmlVersion) -> RequestBuilder {
        RequestBuilder {
            request: Request {
                version,
                ..Request::default()
            },
        }
    }

    /// All attribute blocks of a category, in request order.
    pub fn blocks<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Attributes> + 'a {
        self.attributes.iter().filter(move |a| a.category == category)
    }
}

/// Builder for constructing a [`Request`].
///
/// ```
/// use xacml_pdp::{Request, XacmlVersion, uri};
///
/// let request = Request::builder(XacmlVersion::V3_0)
///     .attribute(uri::category::ACCESS_SUBJECT, uri::attribute::SUBJECT_ID, "alice")
///     .attribute(uri::category::ACTION, uri::attribute::ACTION_ID, "read")
///     .build();
/// assert_eq!(request.attributes.len(), 2);
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Add a single-valued attribute to the first block of `category`,
    /// creating the block if needed.
    #[must_use]
    pub fn attribute(
        self,
        category: &str,
        attribute_id: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.with_attribute(category, Attribute::new(attribute_id, value))
    }

    #[must_use]
    pub fn with_attribute(mut self, category: &str, attribute: Attribute) -> Self {
        match self
            .request
            .attributes
            .iter_mut()
            .find(|a| a.category == category)
        {
            Some(block) => block.attributes.push(attribute),
            None => self
                .request
                .attributes
                .push(Attributes::new(category).attribute(attribute)),
        }
        self
    }

    /// Append a separate block, even when the category already has one.
    #[must_use]
    pub fn block(mut self, attributes: Attributes) -> Self {
        self.request.attributes.push(attributes);
        self
    }

    #[must_use]
    pub fn return_policy_id_list(mut self, enabled: bool) -> Self {
        self.request.return_policy_id_list = enabled;
        self
    }

    #[must_use]
    pub fn combined_decision(mut self, enabled: bool) -> Self {
        self.request.combined_decision = enabled;
        self
    }

    #[must_use]
    pub fn multi_request<I, S>(mut self, attributes_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.multi_requests.push(RequestReference {
            attributes_ids: attributes_ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::{attribute, category, data_type};

    #[test]
    fn attributes_share_the_first_block_of_a_category() {
        let request = Request::builder(XacmlVersion::V2_0)
            .attribute(category::ACCESS_SUBJECT, attribute::SUBJECT_ID, "alice")
            .attribute(category::ACCESS_SUBJECT, "role", "admin")
            .build();
        assert_eq!(request.attributes.len(), 1);
        assert_eq!(request.attributes[0].attributes.len(), 2);
    }

    #[test]
    fn explicit_blocks_stay_separate() {
        let request = Request::builder(XacmlVersion::V3_0)
            .block(Attributes::new(category::RESOURCE).id("r1"))
            .block(Attributes::new(category::RESOURCE).id("r2"))
            .build();
        assert_eq!(request.blocks(category::RESOURCE).count(), 2);
    }

    #[test]
    fn multi_valued_attribute() {
        let attr = Attribute::new("group", "a").value("b").include_in_result();
        assert_eq!(attr.values, ["a", "b"]);
        assert_eq!(attr.data_type, data_type::STRING);
        assert!(attr.include_in_result);
    }
}
