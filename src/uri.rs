//! Well-known XACML identifiers.

/// Attribute categories.
pub mod category {
    pub const ACCESS_SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";
    pub const RESOURCE: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:resource";
    pub const ACTION: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:action";
    pub const ENVIRONMENT: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:environment";
}

/// Datatype URIs, see also [`DataType::uri`](crate::DataType::uri).
pub mod data_type {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DAY_TIME_DURATION: &str = "http://www.w3.org/2001/XMLSchema#dayTimeDuration";
    pub const YEAR_MONTH_DURATION: &str = "http://www.w3.org/2001/XMLSchema#yearMonthDuration";
    pub const ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
    pub const HEX_BINARY: &str = "http://www.w3.org/2001/XMLSchema#hexBinary";
    pub const BASE64_BINARY: &str = "http://www.w3.org/2001/XMLSchema#base64Binary";
    pub const RFC822_NAME: &str = "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name";
    pub const X500_NAME: &str = "urn:oasis:names:tc:xacml:1.0:data-type:x500Name";
}

/// Common attribute identifiers.
pub mod attribute {
    pub const SUBJECT_ID: &str = "urn:oasis:names:tc:xacml:1.0:subject:subject-id";
    pub const RESOURCE_ID: &str = "urn:oasis:names:tc:xacml:1.0:resource:resource-id";
    pub const ACTION_ID: &str = "urn:oasis:names:tc:xacml:1.0:action:action-id";
    pub const CURRENT_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-time";
    pub const CURRENT_DATE: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-date";
    pub const CURRENT_DATE_TIME: &str = "urn:oasis:names:tc:xacml:1.0:environment:current-dateTime";
}

/// Prefixes of the standard function identifiers.
pub mod function {
    pub const V1: &str = "urn:oasis:names:tc:xacml:1.0:function:";
    pub const V2: &str = "urn:oasis:names:tc:xacml:2.0:function:";
    pub const V3: &str = "urn:oasis:names:tc:xacml:3.0:function:";
}

/// Rule- and policy-combining algorithm identifiers.
pub mod algorithm {
    pub const RULE_DENY_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides";
    pub const RULE_PERMIT_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides";
    pub const RULE_FIRST_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable";
    pub const RULE_ORDERED_DENY_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-deny-overrides";
    pub const RULE_ORDERED_PERMIT_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-permit-overrides";
    pub const RULE_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-overrides";
    pub const RULE_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-overrides";
    pub const RULE_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-deny-overrides";
    pub const RULE_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-permit-overrides";
    pub const RULE_DENY_UNLESS_PERMIT: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-unless-permit";
    pub const RULE_PERMIT_UNLESS_DENY: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-unless-deny";

    pub const POLICY_DENY_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:deny-overrides";
    pub const POLICY_PERMIT_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:permit-overrides";
    pub const POLICY_FIRST_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable";
    pub const POLICY_ONLY_ONE_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable";
    pub const POLICY_ORDERED_DENY_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-deny-overrides";
    pub const POLICY_ORDERED_PERMIT_OVERRIDES_V1: &str =
        "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-permit-overrides";
    pub const POLICY_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-overrides";
    pub const POLICY_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-overrides";
    pub const POLICY_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-deny-overrides";
    pub const POLICY_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-permit-overrides";
    pub const POLICY_DENY_UNLESS_PERMIT: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-unless-permit";
    pub const POLICY_PERMIT_UNLESS_DENY: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-unless-deny";
}
