//! Equivalence comparator
//!
//! Two documents are equivalent when their `Version` and `Id` agree, they
//! have the same number of statements, and the statements can be paired one
//! to one such that every pair is field-equivalent. Statement order never
//! matters.

mod diagnostics;
mod matching;

pub use diagnostics::{ClosestCandidate, Diagnostics, Difference, Side, StatementField};

use serde::Serialize;

use crate::error::{PolicyEquivalenceError, PolicyEquivalenceResult};
use crate::options::EquivalenceOptions;
use crate::parsing::parse_policy_with;
use crate::types::{PolicyDocument, Statement};
use matching::maximum_matching;

/// Outcome of comparing two policies
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comparison {
    pub equivalent: bool,
    /// Present only when `equivalent` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl Comparison {
    fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        if diagnostics.is_empty() {
            Self {
                equivalent: true,
                diagnostics: None,
            }
        } else {
            Self {
                equivalent: false,
                diagnostics: Some(diagnostics),
            }
        }
    }
}

/// Compares policies under a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct EquivalenceChecker {
    options: EquivalenceOptions,
}

impl EquivalenceChecker {
    #[must_use]
    pub fn new(options: EquivalenceOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &EquivalenceOptions {
        &self.options
    }

    /// Parse both texts and compare them
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error naming the side that failed when either text is
    /// not a valid policy document. No partial comparison is returned.
    pub fn compare_text(&self, left: &str, right: &str) -> PolicyEquivalenceResult<Comparison> {
        let left = parse_policy_with(left, &self.options).map_err(|e| label(Side::Left, e))?;
        let right = parse_policy_with(right, &self.options).map_err(|e| label(Side::Right, e))?;
        Ok(self.compare_documents(&left, &right))
    }

    /// Compare two already-parsed documents
    #[must_use]
    pub fn compare_documents(&self, left: &PolicyDocument, right: &PolicyDocument) -> Comparison {
        let mut diagnostics = Diagnostics::default();

        if left.version != right.version {
            diagnostics.push(Difference::Version {
                left: left.version.clone(),
                right: right.version.clone(),
            });
        }
        if left.id != right.id {
            diagnostics.push(Difference::Id {
                left: left.id.clone(),
                right: right.id.clone(),
            });
        }
        if left.statements.len() != right.statements.len() {
            diagnostics.push(Difference::StatementCount {
                left: left.statements.len(),
                right: right.statements.len(),
            });
        }

        let differences: Vec<Vec<Vec<StatementField>>> = left
            .statements
            .iter()
            .map(|l| {
                right
                    .statements
                    .iter()
                    .map(|r| self.differing_fields(l, r))
                    .collect()
            })
            .collect();
        let compatible: Vec<Vec<bool>> = differences
            .iter()
            .map(|row| row.iter().map(Vec::is_empty).collect())
            .collect();

        let matching = maximum_matching(&compatible, right.statements.len());
        log::debug!(
            "Matched {} of {} left and {} right statement(s)",
            matching.left_to_right.iter().filter(|m| m.is_some()).count(),
            left.statements.len(),
            right.statements.len()
        );

        if !matching.is_perfect() {
            for index in matching.unmatched_left() {
                let candidates = differences[index].iter().enumerate();
                diagnostics.push(unmatched(Side::Left, index, left, right, candidates));
            }
            for index in matching.unmatched_right() {
                let candidates = differences.iter().map(|row| &row[index]).enumerate();
                diagnostics.push(unmatched(Side::Right, index, right, left, candidates));
            }
        }

        Comparison::from_diagnostics(diagnostics)
    }

    /// Fields on which two statements disagree; empty means field-equivalent
    fn differing_fields(&self, left: &Statement, right: &Statement) -> Vec<StatementField> {
        let mut fields = Vec::new();
        if !self
            .options
            .sid
            .matches(left.sid.as_deref(), right.sid.as_deref())
        {
            fields.push(StatementField::Sid);
        }
        if left.effect != right.effect {
            fields.push(StatementField::Effect);
        }
        if left.principal != right.principal {
            fields.push(StatementField::Principal);
        }
        if left.not_principal != right.not_principal {
            fields.push(StatementField::NotPrincipal);
        }
        if left.action != right.action {
            fields.push(StatementField::Action);
        }
        if left.not_action != right.not_action {
            fields.push(StatementField::NotAction);
        }
        if left.resource != right.resource {
            fields.push(StatementField::Resource);
        }
        if left.not_resource != right.not_resource {
            fields.push(StatementField::NotResource);
        }
        if left.condition != right.condition {
            fields.push(StatementField::Condition);
        }
        log::trace!("Statement pair differs in {:?}", fields);
        fields
    }
}

/// Build the diagnostic for a statement that found no partner
fn unmatched<'a>(
    side: Side,
    index: usize,
    own: &PolicyDocument,
    other: &PolicyDocument,
    candidates: impl Iterator<Item = (usize, &'a Vec<StatementField>)>,
) -> Difference {
    // Fewest differing fields wins; ties go to the lowest index.
    let closest = candidates
        .min_by_key(|(candidate, fields)| (fields.len(), *candidate))
        .map(|(candidate, fields)| ClosestCandidate {
            index: candidate,
            sid: other.statements[candidate].sid.clone(),
            differing_fields: fields.clone(),
        });
    Difference::UnmatchedStatement {
        side,
        index,
        sid: own.statements[index].sid.clone(),
        closest,
    }
}

fn label(side: Side, error: PolicyEquivalenceError) -> PolicyEquivalenceError {
    match error {
        PolicyEquivalenceError::Parse(msg) => {
            PolicyEquivalenceError::parse(format!("{side} policy: {msg}"))
        }
        other => other,
    }
}

/// Compare two policy texts with default options
///
/// # Errors
///
/// Returns a `Parse` error when either text is not a valid policy document.
///
/// # Examples
/// ```
/// use iam_policy_equivalence::policies_are_equivalent;
///
/// let a = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"AWS":["r1","r2"]},"Action":["s3:Get"],"Resource":"arn:x"}]}"#;
/// let b = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"AWS":["r2","r1"]},"Action":"s3:Get","Resource":["arn:x"]}]}"#;
///
/// let comparison = policies_are_equivalent(a, b).unwrap();
/// assert!(comparison.equivalent);
/// assert!(comparison.diagnostics.is_none());
/// ```
pub fn policies_are_equivalent(left: &str, right: &str) -> PolicyEquivalenceResult<Comparison> {
    EquivalenceChecker::default().compare_text(left, right)
}
