//! Expected-policy templating
//!
//! Expected policies in checks are usually written once and filled in with
//! the partition, account and resource names of the environment under test.
//! Placeholder variables are in the format ${VariableName}. Namespaced names
//! such as `${aws:username}` or `${s3:prefix}` are IAM policy variables and
//! pass through untouched.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::{PolicyEquivalenceError, PolicyEquivalenceResult};

/// Regex pattern to match placeholder variables in the format ${VariableName}
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Get the compiled regex for placeholder matching (also matches the empty `${}`)
fn get_placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\$\{([^}]*)\}").expect("Invalid placeholder regex"))
}

/// Derive the AWS partition from a region name
///
/// # Examples
/// ```
/// use iam_policy_equivalence::partition_for_region;
///
/// assert_eq!(partition_for_region("us-east-1"), "aws");
/// assert_eq!(partition_for_region("cn-north-1"), "aws-cn");
/// assert_eq!(partition_for_region("us-gov-west-1"), "aws-us-gov");
/// ```
#[must_use]
pub fn partition_for_region(region: &str) -> &'static str {
    const PREFIXES: [(&str, &str); 5] = [
        ("cn-", "aws-cn"),
        ("us-gov-", "aws-us-gov"),
        ("us-isob-", "aws-iso-b"),
        ("us-iso-", "aws-iso"),
        ("eusc-", "aws-eusc"),
    ];
    PREFIXES
        .iter()
        .find(|(prefix, _)| region.starts_with(*prefix))
        .map_or("aws", |(_, partition)| *partition)
}

/// Values substituted into expected-policy templates
///
/// `${Partition}`, `${Region}` and `${Account}` match case-insensitively;
/// every other placeholder is looked up verbatim in `variables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub partition: String,
    pub region: Option<String>,
    pub account: Option<String>,
    pub variables: BTreeMap<String, String>,
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self {
            partition: "aws".to_string(),
            region: None,
            account: None,
            variables: BTreeMap::new(),
        }
    }
}

impl TemplateContext {
    /// Context for an account in a region; the partition is derived from the region
    #[must_use]
    pub fn for_region(region: impl Into<String>, account: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            partition: partition_for_region(&region).to_string(),
            region: Some(region),
            account: Some(account.into()),
            variables: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }

    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, placeholder: &str) -> Option<&str> {
        match placeholder.to_lowercase().as_str() {
            "partition" => Some(self.partition.as_str()),
            "region" => self.region.as_deref(),
            "account" => self.account.as_deref(),
            _ => self.variables.get(placeholder).map(String::as_str),
        }
    }

    /// Substitute every placeholder in `template`
    ///
    /// Values are inserted verbatim; they are not JSON-escaped. Placeholders
    /// whose name contains `:` are IAM policy variables (`${aws:username}`,
    /// `${aws:PrincipalTag/team}`) and are left as written.
    ///
    /// # Errors
    /// Returns a `Template` error for empty placeholders (`${}`) or placeholders
    /// without a value in this context.
    pub fn render(&self, template: &str) -> PolicyEquivalenceResult<String> {
        let regex = get_placeholder_regex();

        let mut missing = Vec::new();
        for caps in regex.captures_iter(template) {
            let placeholder = caps.get(1).map_or("", |m| m.as_str());
            if placeholder.is_empty() {
                return Err(PolicyEquivalenceError::template(
                    "template contains empty placeholder ${}",
                ));
            }
            if is_policy_variable(placeholder) {
                continue;
            }
            if self.lookup(placeholder).is_none() && !missing.contains(&placeholder) {
                missing.push(placeholder);
            }
        }
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|name| format!("${{{name}}}")).collect();
            return Err(PolicyEquivalenceError::template(format!(
                "no value for placeholder(s): {}",
                names.join(", ")
            )));
        }

        let rendered = regex.replace_all(template, |caps: &Captures| {
            let placeholder = caps.get(1).map_or("", |m| m.as_str());
            if is_policy_variable(placeholder) {
                return caps[0].to_string();
            }
            self.lookup(placeholder).unwrap_or_default().to_string()
        });
        log::trace!("Rendered expected policy template: {rendered}");
        Ok(rendered.into_owned())
    }
}

/// IAM policy variables are always namespaced (`aws:`, `s3:`, `saml:`, ...)
fn is_policy_variable(placeholder: &str) -> bool {
    placeholder.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bucket_policy_template() {
        let ctx = TemplateContext::for_region("us-west-2", "123456789012")
            .with_variable("BucketName", "tf-test-bucket");
        let rendered = ctx
            .render(r#"{"Resource":["arn:${Partition}:s3:::${BucketName}/*"],"Principal":{"AWS":"arn:${partition}:iam::${Account}:root"}}"#)
            .unwrap();
        assert_eq!(
            rendered,
            r#"{"Resource":["arn:aws:s3:::tf-test-bucket/*"],"Principal":{"AWS":"arn:aws:iam::123456789012:root"}}"#
        );
    }

    #[test]
    fn test_partition_derivation() {
        assert_eq!(partition_for_region("eu-west-1"), "aws");
        assert_eq!(partition_for_region("cn-northwest-1"), "aws-cn");
        assert_eq!(partition_for_region("us-gov-east-1"), "aws-us-gov");
        assert_eq!(partition_for_region("us-iso-east-1"), "aws-iso");
        assert_eq!(partition_for_region("us-isob-east-1"), "aws-iso-b");
        assert_eq!(partition_for_region("eusc-de-east-1"), "aws-eusc");
    }

    #[test]
    fn test_for_region_sets_partition() {
        let ctx = TemplateContext::for_region("cn-north-1", "123456789012");
        assert_eq!(ctx.partition, "aws-cn");
        assert_eq!(ctx.region.as_deref(), Some("cn-north-1"));
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        let ctx = TemplateContext::default();
        assert_eq!(ctx.render(r#"{"a":"$b{c}"}"#).unwrap(), r#"{"a":"$b{c}"}"#);
    }

    #[test]
    fn test_custom_variables_are_case_sensitive() {
        let ctx = TemplateContext::default().with_variable("Name", "x");
        assert!(ctx.render("${Name}").is_ok());
        assert!(ctx.render("${name}").is_err());
    }

    #[test]
    fn test_missing_values_are_reported() {
        let ctx = TemplateContext::default();
        let err = ctx.render("${Account} ${Bucket} ${Account}").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("${Account}, ${Bucket}"), "{msg}");
    }

    #[test]
    fn test_empty_placeholder_is_rejected() {
        let err = TemplateContext::default().render("arn:${}:s3").unwrap_err();
        assert!(matches!(err, PolicyEquivalenceError::Template(_)));
        assert!(err.to_string().contains("empty placeholder"));
    }

    #[test]
    fn test_builder_overrides() {
        let ctx = TemplateContext::default()
            .with_partition("aws-us-gov")
            .with_account("210987654321");
        assert_eq!(
            ctx.render("${Partition}:${Account}").unwrap(),
            "aws-us-gov:210987654321"
        );
    }

    #[test]
    fn test_policy_variables_are_left_in_place() {
        let ctx = TemplateContext::for_region("us-west-2", "123456789012")
            .with_variable("BucketName", "tf-test-bucket");
        let rendered = ctx
            .render(r#""Resource":"arn:${Partition}:s3:::${BucketName}/home/${aws:username}/*""#)
            .unwrap();
        assert_eq!(
            rendered,
            r#""Resource":"arn:aws:s3:::tf-test-bucket/home/${aws:username}/*""#
        );

        let tagged = ctx
            .render("${aws:PrincipalTag/team}-${s3:prefix}-${Account}")
            .unwrap();
        assert_eq!(tagged, "${aws:PrincipalTag/team}-${s3:prefix}-123456789012");
    }

    #[test]
    fn test_policy_variables_do_not_hide_missing_values() {
        let err = TemplateContext::default()
            .render("${aws:username}/${BucketName}")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("${BucketName}"), "{msg}");
        assert!(!msg.contains("aws:username"), "{msg}");
    }
}
