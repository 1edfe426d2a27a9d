//! JSON policy text -> normalized `PolicyDocument`
//!
//! Policies arrive in whatever shape the author (or the service echoing them
//! back) chose: `Statement` as one object or a list, `Action` as a string or a
//! list, condition values as strings, booleans or numbers. Everything is
//! collapsed here so the comparator only ever sees sets.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::principal::normalize_aws_identifier;
use crate::error::{PolicyEquivalenceError, PolicyEquivalenceResult};
use crate::options::EquivalenceOptions;
use crate::types::{ConditionMap, Effect, PolicyDocument, PrincipalSet, Statement, StringSet};

/// A value that may be written as a single item or as a list of items
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPolicy {
    version: Option<String>,
    id: Option<String>,
    statement: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStatement {
    sid: Option<String>,
    effect: String,
    principal: Option<RawPrincipal>,
    not_principal: Option<RawPrincipal>,
    action: Option<OneOrMany<String>>,
    not_action: Option<OneOrMany<String>>,
    resource: Option<OneOrMany<String>>,
    not_resource: Option<OneOrMany<String>>,
    condition: Option<BTreeMap<String, BTreeMap<String, OneOrMany<ConditionValue>>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrincipal {
    Text(String),
    Typed(BTreeMap<String, OneOrMany<String>>),
}

/// Condition values are strings on the wire but authors often write JSON scalars
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConditionValue {
    Text(String),
    Flag(bool),
    Number(serde_json::Number),
}

impl ConditionValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Flag(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
        }
    }
}

/// Parse policy text with default options
pub fn parse_policy(text: &str) -> PolicyEquivalenceResult<PolicyDocument> {
    parse_policy_with(text, &EquivalenceOptions::default())
}

/// Parse policy text into a normalized `PolicyDocument`
///
/// Fails when the text is not JSON, is not a JSON object, lacks `Statement`,
/// or has a field whose shape IAM would reject.
pub fn parse_policy_with(
    text: &str,
    options: &EquivalenceOptions,
) -> PolicyEquivalenceResult<PolicyDocument> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| PolicyEquivalenceError::parse(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(PolicyEquivalenceError::parse(format!(
            "policy document must be a JSON object, found {}",
            json_kind(&value)
        )));
    }

    let raw: RawPolicy = serde_json::from_value(value)
        .map_err(|e| PolicyEquivalenceError::parse(format!("invalid policy document: {e}")))?;

    let items = match raw.statement {
        None => {
            return Err(PolicyEquivalenceError::parse(
                "missing required field `Statement`",
            ))
        }
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => vec![item],
        Some(other) => {
            return Err(PolicyEquivalenceError::parse(format!(
                "`Statement` must be an object or an array of objects, found {}",
                json_kind(&other)
            )))
        }
    };

    let statements = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_statement(index, item, options))
        .collect::<PolicyEquivalenceResult<Vec<_>>>()?;

    log::debug!(
        "Parsed policy document (Version {:?}, Id {:?}) with {} statement(s)",
        raw.version,
        raw.id,
        statements.len()
    );

    Ok(PolicyDocument {
        version: raw.version.unwrap_or_default(),
        id: raw.id,
        statements,
    })
}

fn parse_statement(
    index: usize,
    item: Value,
    options: &EquivalenceOptions,
) -> PolicyEquivalenceResult<Statement> {
    let raw: RawStatement = serde_json::from_value(item)
        .map_err(|e| PolicyEquivalenceError::parse(format!("statement {index}: {e}")))?;

    let effect = match raw.effect.as_str() {
        "Allow" => Effect::Allow,
        "Deny" => Effect::Deny,
        other => {
            return Err(PolicyEquivalenceError::parse(format!(
                "statement {index}: unsupported Effect {other:?}, expected \"Allow\" or \"Deny\""
            )))
        }
    };

    if raw.principal.is_some() && raw.not_principal.is_some() {
        return Err(PolicyEquivalenceError::parse(format!(
            "statement {index}: Principal and NotPrincipal are mutually exclusive"
        )));
    }

    let principal = raw
        .principal
        .map(|p| normalize_principal(index, "Principal", p, options))
        .transpose()?;
    let not_principal = raw
        .not_principal
        .map(|p| normalize_principal(index, "NotPrincipal", p, options))
        .transpose()?;

    Ok(Statement {
        sid: raw.sid,
        effect,
        principal,
        not_principal,
        action: to_set(raw.action),
        not_action: to_set(raw.not_action),
        resource: to_set(raw.resource),
        not_resource: to_set(raw.not_resource),
        condition: normalize_condition(raw.condition),
    })
}

fn to_set(value: Option<OneOrMany<String>>) -> StringSet {
    value
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

fn normalize_principal(
    index: usize,
    field: &str,
    raw: RawPrincipal,
    options: &EquivalenceOptions,
) -> PolicyEquivalenceResult<PrincipalSet> {
    match raw {
        RawPrincipal::Text(value) if value == "*" => Ok(PrincipalSet::Wildcard),
        RawPrincipal::Text(value) => Err(PolicyEquivalenceError::parse(format!(
            "statement {index}: {field} must be \"*\" or an object, found {value:?}"
        ))),
        RawPrincipal::Typed(map) => {
            let typed = map
                .into_iter()
                .map(|(principal_type, ids)| {
                    let normalize = options.normalize_account_principals && principal_type == "AWS";
                    let ids: StringSet = ids
                        .into_vec()
                        .into_iter()
                        .map(|id| if normalize { normalize_aws_identifier(id) } else { id })
                        .collect();
                    (principal_type, ids)
                })
                .collect();
            Ok(PrincipalSet::Typed(typed))
        }
    }
}

fn normalize_condition(
    raw: Option<BTreeMap<String, BTreeMap<String, OneOrMany<ConditionValue>>>>,
) -> ConditionMap {
    raw.unwrap_or_default()
        .into_iter()
        .map(|(operator, keys)| {
            let keys = keys
                .into_iter()
                .map(|(key, values)| {
                    let values: StringSet = values
                        .into_vec()
                        .into_iter()
                        .map(ConditionValue::into_string)
                        .collect();
                    (key, values)
                })
                .collect();
            (operator, keys)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET_POLICY: &str = r#"{
  "Version": "2012-10-17",
  "Statement": [
    {
      "Sid": "",
      "Effect": "Allow",
      "Principal": {
        "AWS": "arn:aws:iam::123456789012:root"
      },
      "Action": "s3:*",
      "Resource": [
        "arn:aws:s3:::tf-test-bucket/*",
        "arn:aws:s3:::tf-test-bucket"
      ]
    }
  ]
}"#;

    fn parse_err(text: &str) -> String {
        match parse_policy(text) {
            Err(PolicyEquivalenceError::Parse(msg)) => msg,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_bucket_policy() {
        let doc = parse_policy(BUCKET_POLICY).unwrap();
        assert_eq!(doc.version, "2012-10-17");
        assert!(doc.id.is_none());
        assert_eq!(doc.statements.len(), 1);

        let stmt = &doc.statements[0];
        assert_eq!(stmt.sid.as_deref(), Some(""));
        assert_eq!(stmt.effect, Effect::Allow);
        assert_eq!(stmt.action, StringSet::from(["s3:*".to_string()]));
        assert_eq!(stmt.resource.len(), 2);
        let principal = stmt.principal.as_ref().unwrap();
        assert_eq!(
            principal.identifiers("AWS"),
            Some(&StringSet::from(["123456789012".to_string()]))
        );
    }

    #[test]
    fn test_parse_single_statement_object() {
        let doc = parse_policy(
            r#"{"Version":"2012-10-17","Id":"p1","Statement":{"Effect":"Deny","Action":["a","b","a"]}}"#,
        )
        .unwrap();
        assert_eq!(doc.id.as_deref(), Some("p1"));
        assert_eq!(doc.statements.len(), 1);
        assert_eq!(doc.statements[0].effect, Effect::Deny);
        assert_eq!(doc.statements[0].action.len(), 2);
    }

    #[test]
    fn test_parse_missing_version_is_empty() {
        let doc = parse_policy(r#"{"Statement":[]}"#).unwrap();
        assert_eq!(doc.version, "");
        assert!(doc.statements.is_empty());
    }

    #[test]
    fn test_parse_wildcard_principal() {
        let doc = parse_policy(
            r#"{"Statement":[{"Effect":"Allow","Principal":"*","Action":"s3:GetObject"}]}"#,
        )
        .unwrap();
        assert_eq!(doc.statements[0].principal, Some(PrincipalSet::Wildcard));
    }

    #[test]
    fn test_parse_typed_star_principal_is_not_wildcard() {
        let doc = parse_policy(
            r#"{"Statement":[{"Effect":"Allow","Principal":{"AWS":"*"},"Action":"s3:GetObject"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            doc.statements[0].principal,
            Some(PrincipalSet::Typed(_))
        ));
    }

    #[test]
    fn test_parse_not_principal_and_not_action() {
        let doc = parse_policy(
            r#"{"Statement":[{"Effect":"Deny","NotPrincipal":{"AWS":["r2","r1"]},"NotAction":"iam:*","NotResource":["x"]}]}"#,
        )
        .unwrap();
        let stmt = &doc.statements[0];
        assert!(stmt.principal.is_none());
        assert_eq!(
            stmt.not_principal.as_ref().and_then(|p| p.identifiers("AWS")),
            Some(&StringSet::from(["r1".to_string(), "r2".to_string()]))
        );
        assert_eq!(stmt.not_action, StringSet::from(["iam:*".to_string()]));
        assert_eq!(stmt.not_resource, StringSet::from(["x".to_string()]));
    }

    #[test]
    fn test_parse_condition_scalars_become_strings() {
        let doc = parse_policy(
            r#"{"Statement":[{"Effect":"Allow","Action":"s3:*","Condition":{
                "Bool":{"aws:SecureTransport":false},
                "NumericLessThan":{"s3:max-keys":[10, "20"]},
                "StringEquals":{"s3:ExistingObjectTag/av-status":"INFECTED"}
            }}]}"#,
        )
        .unwrap();
        let condition = &doc.statements[0].condition;
        assert_eq!(
            condition["Bool"]["aws:SecureTransport"],
            StringSet::from(["false".to_string()])
        );
        assert_eq!(
            condition["NumericLessThan"]["s3:max-keys"],
            StringSet::from(["10".to_string(), "20".to_string()])
        );
        assert_eq!(
            condition["StringEquals"]["s3:ExistingObjectTag/av-status"],
            StringSet::from(["INFECTED".to_string()])
        );
    }

    #[test]
    fn test_account_normalization_can_be_disabled() {
        let options = EquivalenceOptions::default().with_account_normalization(false);
        let doc = parse_policy_with(BUCKET_POLICY, &options).unwrap();
        let principal = doc.statements[0].principal.as_ref().unwrap();
        assert_eq!(
            principal.identifiers("AWS"),
            Some(&StringSet::from([
                "arn:aws:iam::123456789012:root".to_string()
            ]))
        );
    }

    #[test]
    fn test_service_principals_are_not_normalized() {
        let doc = parse_policy(
            r#"{"Statement":[{"Effect":"Allow","Principal":{"Service":"arn:aws:iam::123456789012:root"},"Action":"sts:AssumeRole"}]}"#,
        )
        .unwrap();
        let principal = doc.statements[0].principal.as_ref().unwrap();
        assert_eq!(
            principal.identifiers("Service"),
            Some(&StringSet::from([
                "arn:aws:iam::123456789012:root".to_string()
            ]))
        );
    }

    #[test]
    fn test_parse_error_invalid_json() {
        assert!(parse_err("{not json").contains("invalid JSON"));
    }

    #[test]
    fn test_parse_error_not_an_object() {
        assert!(parse_err("[1, 2]").contains("must be a JSON object, found an array"));
    }

    #[test]
    fn test_parse_error_missing_statement() {
        assert!(parse_err(r#"{"Version":"2012-10-17"}"#).contains("`Statement`"));
        assert!(parse_err(r#"{"Version":"2012-10-17","Statement":null}"#).contains("`Statement`"));
    }

    #[test]
    fn test_parse_error_statement_wrong_type() {
        assert!(parse_err(r#"{"Statement":"Allow"}"#).contains("found a string"));
    }

    #[test]
    fn test_parse_error_bad_effect() {
        let msg = parse_err(r#"{"Statement":[{"Effect":"allow","Action":"s3:*"}]}"#);
        assert!(msg.contains("statement 0"));
        assert!(msg.contains("unsupported Effect"));
    }

    #[test]
    fn test_parse_error_missing_effect() {
        let msg = parse_err(r#"{"Statement":[{"Effect":"Allow"},{"Action":"s3:*"}]}"#);
        assert!(msg.contains("statement 1"));
    }

    #[test]
    fn test_parse_error_principal_and_not_principal() {
        let msg = parse_err(
            r#"{"Statement":[{"Effect":"Deny","Principal":"*","NotPrincipal":{"AWS":"r1"}}]}"#,
        );
        assert!(msg.contains("mutually exclusive"));
    }

    #[test]
    fn test_parse_error_non_wildcard_string_principal() {
        let msg = parse_err(r#"{"Statement":[{"Effect":"Allow","Principal":"r1"}]}"#);
        assert!(msg.contains("Principal must be \"*\""));
    }
}
