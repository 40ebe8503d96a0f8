//! EL+ concept expressions and input axioms.

use crate::datatype::{Datatype, Literal, Operator};
use crate::factory::{ConceptId, FeatureId, RoleId};
use std::fmt;

/// An EL+ concept expression.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Concept {
    /// A concept known by the [`Factory`](crate::Factory) (including top and bottom).
    Atom(ConceptId),
    /// `C1 ⊓ … ⊓ Cn`. The empty conjunction is the top concept.
    Conjunction(Vec<Concept>),
    /// `∃r.C`
    Existential { role: RoleId, filler: Box<Concept> },
    /// `f.(op, v)`
    Datatype { feature: FeatureId, datatype: Datatype },
}

impl Concept {
    #[inline]
    pub fn atom(id: ConceptId) -> Self {
        Self::Atom(id)
    }

    #[inline]
    pub fn top() -> Self {
        Self::Atom(ConceptId::TOP)
    }

    #[inline]
    pub fn bottom() -> Self {
        Self::Atom(ConceptId::BOTTOM)
    }

    pub fn and(conjuncts: impl IntoIterator<Item = impl Into<Self>>) -> Self {
        Self::Conjunction(conjuncts.into_iter().map(Into::into).collect())
    }

    pub fn some(role: RoleId, filler: impl Into<Self>) -> Self {
        Self::Existential {
            role,
            filler: Box::new(filler.into()),
        }
    }

    pub fn datatype(feature: FeatureId, operator: Operator, value: impl Into<Literal>) -> Self {
        Self::Datatype {
            feature,
            datatype: Datatype::new(operator, value),
        }
    }

    /// Is this expression a single concept id?
    #[inline]
    pub fn as_atom(&self) -> Option<ConceptId> {
        match self {
            Self::Atom(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<ConceptId> for Concept {
    #[inline]
    fn from(id: ConceptId) -> Self {
        Self::Atom(id)
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(id) => write!(f, "{id}"),
            Self::Conjunction(conjuncts) => {
                f.write_str("(")?;
                for (i, c) in conjuncts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
            Self::Existential { role, filler } => write!(f, "some {role}.{filler}"),
            Self::Datatype { feature, datatype } => write!(f, "{feature}.({datatype})"),
        }
    }
}

/// An input axiom.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Axiom {
    /// `sub ⊑ sup`
    ConceptInclusion { sub: Concept, sup: Concept },
    /// `left ≡ right`, understood as two inclusions.
    ConceptEquivalence { left: Concept, right: Concept },
    /// `r1 ∘ … ∘ rn ⊑ sup`.
    ///
    /// A chain of length one is a plain role inclusion and the empty chain declares `sup` reflexive.
    RoleInclusion { chain: Vec<RoleId>, sup: RoleId },
}

impl Axiom {
    pub fn subsumption(sub: impl Into<Concept>, sup: impl Into<Concept>) -> Self {
        Self::ConceptInclusion {
            sub: sub.into(),
            sup: sup.into(),
        }
    }

    pub fn equivalence(left: impl Into<Concept>, right: impl Into<Concept>) -> Self {
        Self::ConceptEquivalence {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn sub_role(sub: RoleId, sup: RoleId) -> Self {
        Self::RoleInclusion {
            chain: vec![sub],
            sup,
        }
    }

    pub fn role_chain(chain: impl Into<Vec<RoleId>>, sup: RoleId) -> Self {
        Self::RoleInclusion {
            chain: chain.into(),
            sup,
        }
    }

    pub fn reflexive(role: RoleId) -> Self {
        Self::RoleInclusion {
            chain: Vec::new(),
            sup: role,
        }
    }
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConceptInclusion { sub, sup } => write!(f, "{sub} [= {sup}"),
            Self::ConceptEquivalence { left, right } => write!(f, "{left} == {right}"),
            Self::RoleInclusion { chain, sup } => {
                if chain.is_empty() {
                    return write!(f, "reflexive {sup}");
                }
                for (i, r) in chain.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" o ")?;
                    }
                    write!(f, "{r}")?;
                }
                write!(f, " [= {sup}")
            }
        }
    }
}
