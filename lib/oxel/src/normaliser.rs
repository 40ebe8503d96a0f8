//! Rewriting of arbitrary axioms into [`NormalFormRule`]s.
//!
//! Normalisation is done in two exhaustive passes over a work list of inclusions.
//! The first pass simplifies left-hand sides and role chains, the second one right-hand sides.
//! Compound sub-expressions are named by virtual concepts. A virtual concept is reused whenever
//! the same expression shows up again in the same position, including in later incremental
//! sessions, so that virtual ids stay consistent across rounds.

use crate::error::ClassifyError;
use crate::expression::{Axiom, Concept};
use crate::factory::{ConceptId, Factory, RoleId};
use crate::normal_form::NormalFormRule;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

/// On which side of an inclusion a virtual concept replaces an expression.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
enum Polarity {
    /// `C ⊑ A`, the virtual concept is implied by the expression.
    Negative,
    /// `A ⊑ C`, the virtual concept implies the expression.
    Positive,
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum Inclusion {
    Concept { lhs: Concept, rhs: Concept },
    Role { chain: Vec<RoleId>, sup: RoleId },
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concept { lhs, rhs } => write!(f, "{lhs} [= {rhs}"),
            Self::Role { chain, sup } => {
                for r in chain {
                    write!(f, "{r} ")?;
                }
                write!(f, "[= {sup}")
            }
        }
    }
}

/// Output of a normalisation call.
#[derive(Debug, Default)]
pub struct Normalisation {
    /// The normal form rules, without duplicates, in a deterministic order.
    pub rules: Vec<NormalFormRule>,
    /// The virtual concepts allocated by this call.
    pub new_virtual_concepts: Vec<ConceptId>,
}

/// Stateful normaliser. Keep the same instance for all sessions over one [`Factory`].
#[derive(Debug, Default)]
pub struct Normaliser {
    virtual_concepts: FxHashMap<(Concept, Polarity), ConceptId>,
    virtual_roles: FxHashMap<Vec<RoleId>, RoleId>,
}

impl Normaliser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalises the given axioms.
    ///
    /// ```
    /// use oxel::{Axiom, Concept, Factory, NormalFormRule, Normaliser};
    ///
    /// let mut factory = Factory::new();
    /// let (a, b, c) = (factory.concept("A")?, factory.concept("B")?, factory.concept("C")?);
    /// let mut normaliser = Normaliser::new();
    /// let output = normaliser.normalise(&[Axiom::subsumption(a, Concept::and([b, c]))], &mut factory)?;
    /// assert_eq!(
    ///     output.rules,
    ///     [NormalFormRule::subsumption(a, b), NormalFormRule::subsumption(a, c)]
    /// );
    /// # Result::<_, oxel::ClassifyError>::Ok(())
    /// ```
    pub fn normalise<'a>(
        &mut self,
        axioms: impl IntoIterator<Item = &'a Axiom>,
        factory: &mut Factory,
    ) -> Result<Normalisation, ClassifyError> {
        let first_new_concept = factory.total_concepts();
        let mut pending = VecDeque::new();
        for axiom in axioms {
            validate_axiom(axiom, factory)?;
            match axiom {
                Axiom::ConceptInclusion { sub, sup } => pending.push_back(Inclusion::Concept {
                    lhs: sub.clone(),
                    rhs: sup.clone(),
                }),
                Axiom::ConceptEquivalence { left, right } => {
                    pending.push_back(Inclusion::Concept {
                        lhs: left.clone(),
                        rhs: right.clone(),
                    });
                    pending.push_back(Inclusion::Concept {
                        lhs: right.clone(),
                        rhs: left.clone(),
                    });
                }
                Axiom::RoleInclusion { chain, sup } => pending.push_back(Inclusion::Role {
                    chain: chain.clone(),
                    sup: *sup,
                }),
            }
        }
        let input_count = pending.len();

        let phase_one = self.exhaust(pending, factory, Self::left_step)?;
        let phase_two = self.exhaust(phase_one.into(), factory, Self::right_step)?;

        let mut output = Normalisation::default();
        let mut seen = rustc_hash::FxHashSet::default();
        for inclusion in phase_two {
            if let Some(rule) = into_rule(inclusion)? {
                if seen.insert(rule.clone()) {
                    output.rules.push(rule);
                }
            }
        }
        output.new_virtual_concepts = (first_new_concept..factory.total_concepts())
            .map(ConceptId::new)
            .filter(|c| factory.is_virtual_concept(*c))
            .collect();
        debug!(
            inclusions = input_count,
            rules = output.rules.len(),
            virtual_concepts = output.new_virtual_concepts.len(),
            "normalised axioms"
        );
        Ok(output)
    }

    /// Applies `step` until no inclusion is rewritten anymore.
    fn exhaust(
        &mut self,
        mut pending: VecDeque<Inclusion>,
        factory: &mut Factory,
        step: fn(&mut Self, &Inclusion, &mut Factory) -> Result<Option<Vec<Inclusion>>, ClassifyError>,
    ) -> Result<Vec<Inclusion>, ClassifyError> {
        let mut done = Vec::with_capacity(pending.len());
        while let Some(inclusion) = pending.pop_front() {
            match step(self, &inclusion, factory)? {
                Some(replacements) => pending.extend(replacements),
                None => done.push(inclusion),
            }
        }
        Ok(done)
    }

    /// Left-hand side and role chain rewriting.
    fn left_step(
        &mut self,
        inclusion: &Inclusion,
        factory: &mut Factory,
    ) -> Result<Option<Vec<Inclusion>>, ClassifyError> {
        let (lhs, rhs) = match inclusion {
            Inclusion::Role { chain, sup } => {
                let [prefix @ .., last] = chain.as_slice() else {
                    return Ok(None);
                };
                if prefix.len() < 2 {
                    return Ok(None);
                }
                let u = self.virtual_role(prefix, factory)?;
                return Ok(Some(vec![
                    Inclusion::Role {
                        chain: prefix.to_vec(),
                        sup: u,
                    },
                    Inclusion::Role {
                        chain: vec![u, *last],
                        sup: *sup,
                    },
                ]));
            }
            Inclusion::Concept { lhs, rhs } => (lhs, rhs),
        };
        if is_top(rhs) || *lhs == Concept::bottom() {
            return Ok(Some(Vec::new()));
        }
        match lhs {
            Concept::Atom(_) => Ok(None),
            Concept::Conjunction(conjuncts) => {
                let Some(flat) = flatten(conjuncts) else {
                    // A bottom conjunct makes the inclusion trivially true
                    return Ok(Some(Vec::new()));
                };
                if flat.len() <= 1 {
                    let lhs = flat.into_iter().next().unwrap_or_else(Concept::top);
                    return Ok(Some(vec![concept_inclusion(lhs, rhs.clone())]));
                }
                if flat != *conjuncts {
                    return Ok(Some(vec![concept_inclusion(
                        Concept::Conjunction(flat),
                        rhs.clone(),
                    )]));
                }
                if rhs.as_atom().is_none() {
                    return self.split_complex_sides(lhs, rhs, factory).map(Some);
                }
                if let Some(position) = conjuncts.iter().position(|c| c.as_atom().is_none()) {
                    let complex = &conjuncts[position];
                    let a = self.virtual_concept(complex, Polarity::Negative, factory)?;
                    let mut replaced = conjuncts.clone();
                    replaced[position] = Concept::Atom(a);
                    return Ok(Some(vec![
                        concept_inclusion(complex.clone(), Concept::Atom(a)),
                        concept_inclusion(Concept::Conjunction(replaced), rhs.clone()),
                    ]));
                }
                if conjuncts.len() > 2 {
                    let head = Concept::Conjunction(conjuncts[..2].to_vec());
                    let a = self.virtual_concept(&head, Polarity::Negative, factory)?;
                    let mut rest = Vec::with_capacity(conjuncts.len() - 1);
                    rest.push(Concept::Atom(a));
                    rest.extend_from_slice(&conjuncts[2..]);
                    return Ok(Some(vec![
                        concept_inclusion(head, Concept::Atom(a)),
                        concept_inclusion(Concept::Conjunction(rest), rhs.clone()),
                    ]));
                }
                Ok(None)
            }
            Concept::Existential { role, filler } => {
                if **filler == Concept::bottom() {
                    return Ok(Some(Vec::new()));
                }
                if rhs.as_atom().is_none() {
                    return self.split_complex_sides(lhs, rhs, factory).map(Some);
                }
                if filler.as_atom().is_some() {
                    return Ok(None);
                }
                let a = self.virtual_concept(filler, Polarity::Negative, factory)?;
                Ok(Some(vec![
                    concept_inclusion((**filler).clone(), Concept::Atom(a)),
                    concept_inclusion(Concept::some(*role, a), rhs.clone()),
                ]))
            }
            Concept::Datatype { .. } => {
                if rhs.as_atom().is_none() {
                    return self.split_complex_sides(lhs, rhs, factory).map(Some);
                }
                Ok(None)
            }
        }
    }

    /// `Ĉ ⊑ D̂` becomes `Ĉ ⊑ A` and `A ⊑ D̂`.
    fn split_complex_sides(
        &mut self,
        lhs: &Concept,
        rhs: &Concept,
        factory: &mut Factory,
    ) -> Result<Vec<Inclusion>, ClassifyError> {
        let a = self.virtual_concept(lhs, Polarity::Negative, factory)?;
        Ok(vec![
            concept_inclusion(lhs.clone(), Concept::Atom(a)),
            concept_inclusion(Concept::Atom(a), rhs.clone()),
        ])
    }

    /// Right-hand side rewriting. Left-hand sides are already normal.
    fn right_step(
        &mut self,
        inclusion: &Inclusion,
        factory: &mut Factory,
    ) -> Result<Option<Vec<Inclusion>>, ClassifyError> {
        let Inclusion::Concept { lhs, rhs } = inclusion else {
            return Ok(None);
        };
        match rhs {
            Concept::Atom(_) | Concept::Datatype { .. } => Ok(None),
            Concept::Conjunction(conjuncts) => Ok(Some(
                conjuncts
                    .iter()
                    .filter(|c| !is_top(c))
                    .map(|c| concept_inclusion(lhs.clone(), c.clone()))
                    .collect(),
            )),
            Concept::Existential { role, filler } => {
                if filler.as_atom().is_some() {
                    return Ok(None);
                }
                let a = self.virtual_concept(filler, Polarity::Positive, factory)?;
                Ok(Some(vec![
                    concept_inclusion(lhs.clone(), Concept::some(*role, a)),
                    concept_inclusion(Concept::Atom(a), (**filler).clone()),
                ]))
            }
        }
    }

    fn virtual_concept(
        &mut self,
        expression: &Concept,
        polarity: Polarity,
        factory: &mut Factory,
    ) -> Result<ConceptId, ClassifyError> {
        if let Some(id) = self.virtual_concepts.get(&(expression.clone(), polarity)) {
            return Ok(*id);
        }
        let id = factory.virtual_concept()?;
        self.virtual_concepts
            .insert((expression.clone(), polarity), id);
        Ok(id)
    }

    fn virtual_role(&mut self, chain: &[RoleId], factory: &mut Factory) -> Result<RoleId, ClassifyError> {
        if let Some(id) = self.virtual_roles.get(chain) {
            return Ok(*id);
        }
        let id = factory.virtual_role()?;
        self.virtual_roles.insert(chain.to_vec(), id);
        Ok(id)
    }
}

fn concept_inclusion(lhs: Concept, rhs: Concept) -> Inclusion {
    Inclusion::Concept { lhs, rhs }
}

fn is_top(concept: &Concept) -> bool {
    match concept {
        Concept::Atom(id) => *id == ConceptId::TOP,
        Concept::Conjunction(conjuncts) => conjuncts.iter().all(is_top),
        Concept::Existential { .. } | Concept::Datatype { .. } => false,
    }
}

/// Flattens nested conjunctions, drops top and duplicates.
///
/// Returns `None` if the conjunction contains bottom.
fn flatten(conjuncts: &[Concept]) -> Option<Vec<Concept>> {
    let mut flat: Vec<Concept> = Vec::with_capacity(conjuncts.len());
    let mut stack: Vec<&Concept> = conjuncts.iter().rev().collect();
    while let Some(c) = stack.pop() {
        match c {
            Concept::Conjunction(inner) => stack.extend(inner.iter().rev()),
            Concept::Atom(ConceptId::BOTTOM) => return None,
            Concept::Atom(ConceptId::TOP) => (),
            _ => {
                if !flat.contains(c) {
                    flat.push(c.clone());
                }
            }
        }
    }
    Some(flat)
}

fn into_rule(inclusion: Inclusion) -> Result<Option<NormalFormRule>, ClassifyError> {
    Ok(Some(match inclusion {
        Inclusion::Role { chain, sup } => match chain.as_slice() {
            [] => NormalFormRule::Nf6 { role: sup },
            [sub] if *sub == sup => return Ok(None),
            [sub] => NormalFormRule::Nf4 { sub: *sub, sup },
            [first, second] => NormalFormRule::Nf5 {
                first: *first,
                second: *second,
                sup,
            },
            _ => return Err(not_normal(&Inclusion::Role { chain, sup })),
        },
        Inclusion::Concept { lhs, rhs } => match (&lhs, &rhs) {
            (Concept::Atom(a), Concept::Atom(b)) if a == b => return Ok(None),
            (Concept::Atom(a), Concept::Atom(b)) => NormalFormRule::subsumption(*a, *b),
            (Concept::Conjunction(conjuncts), Concept::Atom(b)) => match conjuncts.as_slice() {
                [Concept::Atom(a1), Concept::Atom(a2)] => NormalFormRule::conjunction(*a1, *a2, *b),
                _ => return Err(not_normal(&Inclusion::Concept { lhs, rhs })),
            },
            (Concept::Atom(a), Concept::Existential { role, filler }) => match **filler {
                Concept::Atom(filler) => NormalFormRule::Nf2 {
                    lhs: *a,
                    role: *role,
                    filler,
                },
                _ => return Err(not_normal(&Inclusion::Concept { lhs, rhs })),
            },
            (Concept::Existential { role, filler }, Concept::Atom(b)) => match **filler {
                Concept::Atom(filler) => NormalFormRule::Nf3 {
                    role: *role,
                    filler,
                    rhs: *b,
                },
                _ => return Err(not_normal(&Inclusion::Concept { lhs, rhs })),
            },
            (Concept::Atom(a), Concept::Datatype { feature, datatype }) => NormalFormRule::Nf7 {
                lhs: *a,
                feature: *feature,
                datatype: datatype.clone(),
            },
            (Concept::Datatype { feature, datatype }, Concept::Atom(b)) => NormalFormRule::Nf8 {
                feature: *feature,
                datatype: datatype.clone(),
                rhs: *b,
            },
            _ => return Err(not_normal(&Inclusion::Concept { lhs, rhs })),
        },
    }))
}

fn not_normal(inclusion: &Inclusion) -> ClassifyError {
    ClassifyError::malformed(format!("{inclusion} cannot be put in normal form"))
}

fn validate_axiom(axiom: &Axiom, factory: &Factory) -> Result<(), ClassifyError> {
    match axiom {
        Axiom::ConceptInclusion { sub, sup } => {
            validate_concept(sub, factory)?;
            validate_concept(sup, factory)
        }
        Axiom::ConceptEquivalence { left, right } => {
            validate_concept(left, factory)?;
            validate_concept(right, factory)
        }
        Axiom::RoleInclusion { chain, sup } => {
            for role in chain {
                factory.check_role(*role)?;
            }
            factory.check_role(*sup)?;
            Ok(())
        }
    }
}

fn validate_concept(concept: &Concept, factory: &Factory) -> Result<(), ClassifyError> {
    let mut stack = vec![concept];
    while let Some(concept) = stack.pop() {
        match concept {
            Concept::Atom(id) => {
                factory.check_concept(*id)?;
            }
            Concept::Conjunction(conjuncts) => stack.extend(conjuncts),
            Concept::Existential { role, filler } => {
                factory.check_role(*role)?;
                stack.push(filler);
            }
            Concept::Datatype { feature, datatype } => {
                factory.check_feature(*feature)?;
                if datatype.operator != crate::datatype::Operator::Equals
                    && !datatype.value.is_ordered()
                {
                    return Err(ClassifyError::malformed(format!(
                        "the operator {} cannot be applied to a {} value",
                        datatype.operator,
                        datatype.value.type_name()
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{Datatype, Operator};

    fn setup() -> (Factory, Vec<ConceptId>, Vec<RoleId>) {
        let mut factory = Factory::new();
        let concepts = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|n| factory.concept(n))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let roles = ["r", "s", "t", "u"]
            .iter()
            .map(|n| factory.role(n))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        (factory, concepts, roles)
    }

    #[test]
    fn already_normal_forms() {
        let (mut factory, c, r) = setup();
        let f = factory.feature("age").unwrap();
        let axioms = [
            Axiom::subsumption(c[0], c[1]),
            Axiom::subsumption(Concept::and([c[0], c[1]]), c[2]),
            Axiom::subsumption(c[0], Concept::some(r[0], c[1])),
            Axiom::subsumption(Concept::some(r[0], c[1]), c[2]),
            Axiom::sub_role(r[0], r[1]),
            Axiom::role_chain([r[0], r[1]], r[2]),
            Axiom::reflexive(r[3]),
            Axiom::subsumption(c[0], Concept::datatype(f, Operator::Equals, 3)),
            Axiom::subsumption(Concept::datatype(f, Operator::GreaterThan, 1), c[3]),
        ];
        let output = Normaliser::new().normalise(&axioms, &mut factory).unwrap();
        assert_eq!(
            output.rules,
            [
                NormalFormRule::subsumption(c[0], c[1]),
                NormalFormRule::conjunction(c[0], c[1], c[2]),
                NormalFormRule::Nf2 {
                    lhs: c[0],
                    role: r[0],
                    filler: c[1]
                },
                NormalFormRule::Nf3 {
                    role: r[0],
                    filler: c[1],
                    rhs: c[2]
                },
                NormalFormRule::Nf4 { sub: r[0], sup: r[1] },
                NormalFormRule::Nf5 {
                    first: r[0],
                    second: r[1],
                    sup: r[2]
                },
                NormalFormRule::Nf6 { role: r[3] },
                NormalFormRule::Nf7 {
                    lhs: c[0],
                    feature: f,
                    datatype: Datatype::new(Operator::Equals, 3)
                },
                NormalFormRule::Nf8 {
                    feature: f,
                    datatype: Datatype::new(Operator::GreaterThan, 1),
                    rhs: c[3]
                },
            ]
        );
        assert!(output.new_virtual_concepts.is_empty());
    }

    #[test]
    fn long_conjunction_is_split() {
        let (mut factory, c, _) = setup();
        let axiom = Axiom::subsumption(Concept::and([c[0], c[1], c[2]]), c[3]);
        let output = Normaliser::new().normalise(&[axiom], &mut factory).unwrap();
        let [v] = output.new_virtual_concepts.as_slice() else {
            panic!("expected exactly one virtual concept")
        };
        assert_eq!(
            output.rules,
            [
                NormalFormRule::conjunction(c[0], c[1], *v),
                NormalFormRule::conjunction(*v, c[2], c[3]),
            ]
        );
    }

    #[test]
    fn nested_existential_on_the_left() {
        let (mut factory, c, r) = setup();
        let axiom = Axiom::subsumption(Concept::some(r[0], Concept::some(r[1], c[0])), c[1]);
        let output = Normaliser::new().normalise(&[axiom], &mut factory).unwrap();
        let [v] = output.new_virtual_concepts.as_slice() else {
            panic!("expected exactly one virtual concept")
        };
        assert_eq!(
            output.rules,
            [
                NormalFormRule::Nf3 {
                    role: r[1],
                    filler: c[0],
                    rhs: *v
                },
                NormalFormRule::Nf3 {
                    role: r[0],
                    filler: *v,
                    rhs: c[1]
                },
            ]
        );
    }

    #[test]
    fn nested_existential_on_the_right() {
        let (mut factory, c, r) = setup();
        let axiom = Axiom::subsumption(c[0], Concept::some(r[0], Concept::and([c[1], c[2]])));
        let output = Normaliser::new().normalise(&[axiom], &mut factory).unwrap();
        let [v] = output.new_virtual_concepts.as_slice() else {
            panic!("expected exactly one virtual concept")
        };
        assert_eq!(
            output.rules,
            [
                NormalFormRule::Nf2 {
                    lhs: c[0],
                    role: r[0],
                    filler: *v
                },
                NormalFormRule::subsumption(*v, c[1]),
                NormalFormRule::subsumption(*v, c[2]),
            ]
        );
    }

    #[test]
    fn equivalence_with_definition() {
        let (mut factory, c, r) = setup();
        let definition = Concept::and([Concept::atom(c[2]), Concept::some(r[0], c[1])]);
        let axiom = Axiom::equivalence(c[3], definition);
        let output = Normaliser::new().normalise(&[axiom], &mut factory).unwrap();
        let [v] = output.new_virtual_concepts.as_slice() else {
            panic!("expected exactly one virtual concept")
        };
        assert_eq!(
            output.rules,
            [
                NormalFormRule::Nf3 {
                    role: r[0],
                    filler: c[1],
                    rhs: *v
                },
                NormalFormRule::conjunction(c[2], *v, c[3]),
                NormalFormRule::subsumption(c[3], c[2]),
                NormalFormRule::Nf2 {
                    lhs: c[3],
                    role: r[0],
                    filler: c[1]
                },
            ]
        );
    }

    #[test]
    fn long_role_chain() {
        let (mut factory, _, r) = setup();
        let axiom = Axiom::role_chain([r[0], r[1], r[2]], r[3]);
        let roles_before = factory.total_roles();
        let output = Normaliser::new().normalise(&[axiom], &mut factory).unwrap();
        let u = RoleId::new(roles_before);
        assert!(factory.is_virtual_role(u));
        assert_eq!(
            output.rules,
            [
                NormalFormRule::Nf5 {
                    first: r[0],
                    second: r[1],
                    sup: u
                },
                NormalFormRule::Nf5 {
                    first: u,
                    second: r[2],
                    sup: r[3]
                },
            ]
        );
    }

    #[test]
    fn trivial_axioms_vanish() {
        let (mut factory, c, r) = setup();
        let axioms = [
            Axiom::subsumption(c[0], Concept::top()),
            Axiom::subsumption(Concept::bottom(), c[0]),
            Axiom::subsumption(c[1], c[1]),
            Axiom::subsumption(Concept::and([Concept::bottom(), Concept::atom(c[0])]), c[2]),
            Axiom::sub_role(r[0], r[0]),
        ];
        let output = Normaliser::new().normalise(&axioms, &mut factory).unwrap();
        assert!(output.rules.is_empty());
    }

    #[test]
    fn virtual_concepts_are_reused() {
        let (mut factory, c, r) = setup();
        let mut normaliser = Normaliser::new();
        let filler = Concept::and([c[1], c[2]]);
        let first = normaliser
            .normalise(
                &[Axiom::subsumption(c[0], Concept::some(r[0], filler.clone()))],
                &mut factory,
            )
            .unwrap();
        let second = normaliser
            .normalise(
                &[Axiom::subsumption(c[3], Concept::some(r[1], filler))],
                &mut factory,
            )
            .unwrap();
        assert_eq!(first.new_virtual_concepts.len(), 1);
        assert!(second.new_virtual_concepts.is_empty());
        assert!(second.rules.contains(&NormalFormRule::Nf2 {
            lhs: c[3],
            role: r[1],
            filler: first.new_virtual_concepts[0]
        }));
    }

    #[test]
    fn complex_on_both_sides() {
        let (mut factory, c, r) = setup();
        let axiom = Axiom::subsumption(Concept::some(r[0], c[0]), Concept::some(r[1], c[1]));
        let output = Normaliser::new().normalise(&[axiom], &mut factory).unwrap();
        let [v] = output.new_virtual_concepts.as_slice() else {
            panic!("expected exactly one virtual concept")
        };
        assert_eq!(
            output.rules,
            [
                NormalFormRule::Nf3 {
                    role: r[0],
                    filler: c[0],
                    rhs: *v
                },
                NormalFormRule::Nf2 {
                    lhs: *v,
                    role: r[1],
                    filler: c[1]
                },
            ]
        );
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let (mut factory, c, _) = setup();
        let axiom = Axiom::subsumption(c[0], Concept::some(RoleId::new(42), c[1]));
        assert!(matches!(
            Normaliser::new().normalise(&[axiom], &mut factory),
            Err(ClassifyError::UnknownRole(_))
        ));
    }

    #[test]
    fn ordering_on_booleans_is_malformed() {
        let (mut factory, c, _) = setup();
        let f = factory.feature("flag").unwrap();
        let axiom = Axiom::subsumption(c[0], Concept::datatype(f, Operator::LessThan, true));
        assert!(matches!(
            Normaliser::new().normalise(&[axiom], &mut factory),
            Err(ClassifyError::MalformedAxiom { .. })
        ));
    }
}
