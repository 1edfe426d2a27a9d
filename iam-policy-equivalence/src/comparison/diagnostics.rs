//! Structured explanation of why two policies are not equivalent

use serde::Serialize;
use std::fmt;

/// Which of the two compared documents a statement belongs to
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Statement field that can prevent two statements from pairing
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatementField {
    Sid,
    Effect,
    Principal,
    NotPrincipal,
    Action,
    NotAction,
    Resource,
    NotResource,
    Condition,
}

impl fmt::Display for StatementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sid => "Sid",
            Self::Effect => "Effect",
            Self::Principal => "Principal",
            Self::NotPrincipal => "NotPrincipal",
            Self::Action => "Action",
            Self::NotAction => "NotAction",
            Self::Resource => "Resource",
            Self::NotResource => "NotResource",
            Self::Condition => "Condition",
        };
        f.write_str(name)
    }
}

/// The statement on the other side that came closest to pairing
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClosestCandidate {
    pub index: usize,
    pub sid: Option<String>,
    /// Fields that differ; empty when the candidate is equivalent but already
    /// paired with another statement
    pub differing_fields: Vec<StatementField>,
}

/// One reason two documents are not equivalent
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    Version {
        left: String,
        right: String,
    },
    Id {
        left: Option<String>,
        right: Option<String>,
    },
    StatementCount {
        left: usize,
        right: usize,
    },
    UnmatchedStatement {
        side: Side,
        index: usize,
        sid: Option<String>,
        /// `None` when the other document has no statements at all
        closest: Option<ClosestCandidate>,
    },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version { left, right } => {
                write!(f, "Version differs: left {left:?}, right {right:?}")
            }
            Self::Id { left, right } => write!(
                f,
                "Id differs: left {}, right {}",
                display_optional(left.as_deref()),
                display_optional(right.as_deref())
            ),
            Self::StatementCount { left, right } => {
                write!(f, "statement count differs: left {left}, right {right}")
            }
            Self::UnmatchedStatement {
                side,
                index,
                sid,
                closest,
            } => {
                write!(
                    f,
                    "{side} statement {} has no equivalent on the {} side",
                    statement_label(*index, sid.as_deref()),
                    side.other()
                )?;
                match closest {
                    Some(candidate) if candidate.differing_fields.is_empty() => write!(
                        f,
                        "; {} statement {} is equivalent but already paired",
                        side.other(),
                        statement_label(candidate.index, candidate.sid.as_deref())
                    ),
                    Some(candidate) => {
                        let fields: Vec<String> = candidate
                            .differing_fields
                            .iter()
                            .map(ToString::to_string)
                            .collect();
                        write!(
                            f,
                            "; closest is {} statement {} (differs in: {})",
                            side.other(),
                            statement_label(candidate.index, candidate.sid.as_deref()),
                            fields.join(", ")
                        )
                    }
                    None => write!(f, "; the {} side has no statements", side.other()),
                }
            }
        }
    }
}

/// Everything that differed between two documents, in discovery order
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Diagnostics {
    pub differences: Vec<Difference>,
}

impl Diagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub(crate) fn push(&mut self, difference: Difference) {
        self.differences.push(difference);
    }

    /// Unmatched statement indices on one side
    #[must_use]
    pub fn unmatched(&self, on: Side) -> Vec<usize> {
        self.differences
            .iter()
            .filter_map(|difference| match difference {
                Difference::UnmatchedStatement { side, index, .. } if *side == on => Some(*index),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.differences.is_empty() {
            return f.write_str("no differences");
        }
        f.write_str("policies are not equivalent:")?;
        for difference in &self.differences {
            write!(f, "\n  - {difference}")?;
        }
        Ok(())
    }
}

fn statement_label(index: usize, sid: Option<&str>) -> String {
    match sid {
        Some(sid) if !sid.is_empty() => format!("#{index} (Sid {sid:?})"),
        _ => format!("#{index}"),
    }
}

fn display_optional(value: Option<&str>) -> String {
    value.map_or_else(|| "<absent>".to_string(), |v| format!("{v:?}"))
}
