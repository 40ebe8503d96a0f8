//! The eight normal forms every axiom is rewritten into and the queue entries derived from them.

use crate::datatype::Datatype;
use crate::factory::{ConceptId, FeatureId, RoleId};
use std::fmt;

/// A normalised axiom.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum NormalFormRule {
    /// `lhs1 ⊓ lhs2 ⊑ rhs`, or `lhs1 ⊑ rhs` if `lhs2` is `None`.
    Nf1 {
        lhs1: ConceptId,
        lhs2: Option<ConceptId>,
        rhs: ConceptId,
    },
    /// `lhs ⊑ ∃role.filler`
    Nf2 {
        lhs: ConceptId,
        role: RoleId,
        filler: ConceptId,
    },
    /// `∃role.filler ⊑ rhs`
    Nf3 {
        role: RoleId,
        filler: ConceptId,
        rhs: ConceptId,
    },
    /// `sub ⊑ sup`
    Nf4 { sub: RoleId, sup: RoleId },
    /// `first ∘ second ⊑ sup`
    Nf5 {
        first: RoleId,
        second: RoleId,
        sup: RoleId,
    },
    /// `role` is reflexive.
    Nf6 { role: RoleId },
    /// `lhs ⊑ feature.(op, v)`
    Nf7 {
        lhs: ConceptId,
        feature: FeatureId,
        datatype: Datatype,
    },
    /// `feature.(op, v) ⊑ rhs`
    Nf8 {
        feature: FeatureId,
        datatype: Datatype,
        rhs: ConceptId,
    },
}

impl NormalFormRule {
    /// Builds a NF1 rule with its two conjuncts in a canonical order.
    pub fn conjunction(a: ConceptId, b: ConceptId, rhs: ConceptId) -> Self {
        if a == b {
            Self::Nf1 {
                lhs1: a,
                lhs2: None,
                rhs,
            }
        } else {
            Self::Nf1 {
                lhs1: a.min(b),
                lhs2: Some(a.max(b)),
                rhs,
            }
        }
    }

    #[inline]
    pub fn subsumption(lhs: ConceptId, rhs: ConceptId) -> Self {
        Self::Nf1 {
            lhs1: lhs,
            lhs2: None,
            rhs,
        }
    }

    pub fn kind(&self) -> NormalFormKind {
        match self {
            Self::Nf1 { .. } => NormalFormKind::Nf1,
            Self::Nf2 { .. } => NormalFormKind::Nf2,
            Self::Nf3 { .. } => NormalFormKind::Nf3,
            Self::Nf4 { .. } => NormalFormKind::Nf4,
            Self::Nf5 { .. } => NormalFormKind::Nf5,
            Self::Nf6 { .. } => NormalFormKind::Nf6,
            Self::Nf7 { .. } => NormalFormKind::Nf7,
            Self::Nf8 { .. } => NormalFormKind::Nf8,
        }
    }
}

impl fmt::Display for NormalFormRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nf1 {
                lhs1,
                lhs2: None,
                rhs,
            } => write!(f, "{lhs1} [= {rhs}"),
            Self::Nf1 {
                lhs1,
                lhs2: Some(lhs2),
                rhs,
            } => write!(f, "{lhs1} and {lhs2} [= {rhs}"),
            Self::Nf2 { lhs, role, filler } => write!(f, "{lhs} [= some {role}.{filler}"),
            Self::Nf3 { role, filler, rhs } => write!(f, "some {role}.{filler} [= {rhs}"),
            Self::Nf4 { sub, sup } => write!(f, "{sub} [= {sup}"),
            Self::Nf5 { first, second, sup } => write!(f, "{first} o {second} [= {sup}"),
            Self::Nf6 { role } => write!(f, "reflexive {role}"),
            Self::Nf7 {
                lhs,
                feature,
                datatype,
            } => write!(f, "{lhs} [= {feature}.({datatype})"),
            Self::Nf8 {
                feature,
                datatype,
                rhs,
            } => write!(f, "{feature}.({datatype}) [= {rhs}"),
        }
    }
}

/// The shape of a [`NormalFormRule`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum NormalFormKind {
    Nf1,
    Nf2,
    Nf3,
    Nf4,
    Nf5,
    Nf6,
    Nf7,
    Nf8,
}

impl NormalFormKind {
    pub const ALL: [Self; 8] = [
        Self::Nf1,
        Self::Nf2,
        Self::Nf3,
        Self::Nf4,
        Self::Nf5,
        Self::Nf6,
        Self::Nf7,
        Self::Nf8,
    ];

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// "If `conjunct` subsumes the owner, `consequence` does too."
///
/// The top concept as `conjunct` makes the entry unconditional.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ConjunctionEntry {
    pub conjunct: ConceptId,
    pub consequence: ConceptId,
}

impl ConjunctionEntry {
    #[inline]
    pub fn new(conjunct: ConceptId, consequence: ConceptId) -> Self {
        Self {
            conjunct,
            consequence,
        }
    }

    #[inline]
    pub fn unconditional(consequence: ConceptId) -> Self {
        Self::new(ConceptId::TOP, consequence)
    }
}

/// "The owner is subsumed by `∃role.filler`."
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct RoleEntry {
    pub role: RoleId,
    pub filler: ConceptId,
}

impl RoleEntry {
    #[inline]
    pub fn new(role: RoleId, filler: ConceptId) -> Self {
        Self { role, filler }
    }
}

/// "The owner is subsumed by `feature.(op, v)`."
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct FeatureEntry {
    pub feature: FeatureId,
    pub datatype: Datatype,
}
