#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use oxel::{Axiom, Classifier, ClassifierConfig, Concept, Factory, Operator};
use std::error::Error;

struct Ontology {
    factory: Factory,
    axioms: Vec<Axiom>,
}

/// A small anatomy with every axiom shape.
fn anatomy() -> Result<Ontology, Box<dyn Error>> {
    let mut factory = Factory::new();
    let [
        body_part,
        organ,
        heart,
        heart_part,
        ventricle,
        left_ventricle,
        heart_disease,
        disease,
        adult,
        patient,
    ] = [
        "BodyPart",
        "Organ",
        "Heart",
        "HeartPart",
        "Ventricle",
        "LeftVentricle",
        "HeartDisease",
        "Disease",
        "Adult",
        "Patient",
    ]
    .map(|name| factory.concept(name));
    let (body_part, organ, heart, heart_part, ventricle, left_ventricle) =
        (body_part?, organ?, heart?, heart_part?, ventricle?, left_ventricle?);
    let (heart_disease, disease, adult, patient) = (heart_disease?, disease?, adult?, patient?);
    let [part_of, located_in, has_location, affects] =
        ["partOf", "locatedIn", "hasLocation", "affects"].map(|name| factory.role(name));
    let (part_of, located_in, has_location, affects) =
        (part_of?, located_in?, has_location?, affects?);
    let age = factory.feature("age")?;

    let axioms = vec![
        Axiom::subsumption(organ, body_part),
        Axiom::subsumption(heart, organ),
        Axiom::reflexive(part_of),
        Axiom::role_chain([part_of, part_of], part_of),
        Axiom::sub_role(located_in, has_location),
        Axiom::role_chain([has_location, part_of], has_location),
        Axiom::equivalence(heart_part, Concept::some(part_of, heart)),
        Axiom::subsumption(ventricle, Concept::some(part_of, heart)),
        Axiom::subsumption(left_ventricle, ventricle),
        Axiom::subsumption(heart_disease, disease),
        Axiom::subsumption(heart_disease, Concept::some(located_in, left_ventricle)),
        Axiom::subsumption(
            Concept::and([Concept::atom(disease), Concept::some(has_location, heart)]),
            Concept::some(affects, heart),
        ),
        Axiom::subsumption(patient, Concept::datatype(age, Operator::Equals, 42)),
        Axiom::subsumption(Concept::datatype(age, Operator::GreaterThanOrEqual, 18), adult),
    ];
    Ok(Ontology { factory, axioms })
}

fn full(ontology: &Ontology) -> Result<Classifier, Box<dyn Error>> {
    let mut classifier =
        Classifier::with_factory(ontology.factory.clone(), ClassifierConfig::default());
    classifier.classify(&ontology.axioms)?;
    Ok(classifier)
}

#[test]
fn any_split_gives_the_full_classification() -> Result<(), Box<dyn Error>> {
    let ontology = anatomy()?;
    let expected = full(&ontology)?;
    for split in 0..=ontology.axioms.len() {
        let (first, second) = ontology.axioms.split_at(split);
        let mut classifier =
            Classifier::with_factory(ontology.factory.clone(), ClassifierConfig::default());
        classifier.classify(first)?;
        classifier.classify_incremental(second)?;
        assert_eq!(
            classifier.named_subsumptions()?,
            expected.named_subsumptions()?,
            "split at {split}"
        );
        assert_eq!(
            classifier.named_relationships()?,
            expected.named_relationships()?,
            "split at {split}"
        );
    }
    Ok(())
}

#[test]
fn earlier_facts_are_kept() -> Result<(), Box<dyn Error>> {
    let ontology = anatomy()?;
    for split in 0..=ontology.axioms.len() {
        let (first, second) = ontology.axioms.split_at(split);
        let mut classifier =
            Classifier::with_factory(ontology.factory.clone(), ClassifierConfig::default());
        classifier.classify(first)?;
        let subsumptions = classifier.subsumptions()?;
        let relationships = classifier.relationships()?.snapshot();

        classifier.classify_incremental(second)?;
        let store = classifier.subsumption_store()?;
        for (concept, supersumers) in &subsumptions {
            for supersumer in supersumers {
                assert!(
                    store.contains(*concept, *supersumer),
                    "{concept} ⊑ {supersumer} lost at split {split}"
                );
            }
        }
        let edges = classifier.relationships()?;
        for (source, targets) in &relationships {
            for (role, targets) in targets {
                for target in targets {
                    assert!(
                        edges.contains(*source, *role, *target),
                        "{source} ⊑ ∃{role}.{target} lost at split {split}"
                    );
                }
            }
        }
    }
    Ok(())
}

#[test]
fn one_axiom_at_a_time() -> Result<(), Box<dyn Error>> {
    let ontology = anatomy()?;
    let expected = full(&ontology)?;
    // reversed so that the rules arrive before the facts they apply to
    let mut classifier = Classifier::with_factory(
        ontology.factory.clone(),
        ClassifierConfig::default().with_num_threads(2),
    );
    for axiom in ontology.axioms.iter().rev() {
        classifier.classify_incremental([axiom])?;
    }
    assert_eq!(classifier.named_subsumptions()?, expected.named_subsumptions()?);
    assert_eq!(classifier.named_relationships()?, expected.named_relationships()?);
    Ok(())
}

#[test]
fn new_datatype_rule_applies_to_recorded_restrictions() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (a, b) = (factory.concept("A")?, factory.concept("B")?);
    let f = factory.feature("f")?;
    classifier.classify(&[Axiom::subsumption(a, Concept::datatype(f, Operator::Equals, 5))])?;
    assert!(!classifier.is_subsumed_by(a, b)?);

    classifier.classify_incremental(&[Axiom::subsumption(
        Concept::datatype(f, Operator::GreaterThan, 3),
        b,
    )])?;
    assert!(classifier.is_subsumed_by(a, b)?);
    assert!(classifier.affected_concepts().contains(&a));
    Ok(())
}

#[test]
fn new_role_inclusion_completes_existing_edges() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (a, b, c) = (factory.concept("A")?, factory.concept("B")?, factory.concept("C")?);
    let (r, s) = (factory.role("r")?, factory.role("s")?);
    classifier.classify(&[
        Axiom::subsumption(a, Concept::some(r, b)),
        Axiom::subsumption(Concept::some(s, b), c),
    ])?;
    assert!(!classifier.is_subsumed_by(a, c)?);

    classifier.classify_incremental(&[Axiom::sub_role(r, s)])?;
    assert!(classifier.relationships()?.contains(a, s, b));
    assert!(classifier.is_subsumed_by(a, c)?);
    assert_eq!(classifier.affected_concepts(), [a]);
    assert!(classifier.new_concepts().is_empty());
    Ok(())
}

#[test]
fn new_role_composition_joins_existing_edges() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (a, b, c, d) = (
        factory.concept("A")?,
        factory.concept("B")?,
        factory.concept("C")?,
        factory.concept("D")?,
    );
    let (r, s, t) = (factory.role("r")?, factory.role("s")?, factory.role("t")?);
    classifier.classify(&[
        Axiom::subsumption(a, Concept::some(r, b)),
        Axiom::subsumption(b, Concept::some(s, c)),
        Axiom::subsumption(Concept::some(t, c), d),
    ])?;
    assert!(!classifier.is_subsumed_by(a, d)?);

    classifier.classify_incremental(&[Axiom::role_chain([r, s], t)])?;
    assert!(classifier.relationships()?.contains(a, t, c));
    assert!(classifier.is_subsumed_by(a, d)?);
    Ok(())
}

#[test]
fn new_reflexive_role_adds_self_edges() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (heart, heart_part) = (factory.concept("Heart")?, factory.concept("HeartPart")?);
    let part_of = factory.role("partOf")?;
    classifier.classify(&[Axiom::subsumption(Concept::some(part_of, heart), heart_part)])?;
    assert!(!classifier.is_subsumed_by(heart, heart_part)?);

    classifier.classify_incremental(&[Axiom::reflexive(part_of)])?;
    assert!(classifier.relationships()?.contains(heart, part_of, heart));
    assert!(classifier.relationships()?.contains(heart_part, part_of, heart_part));
    assert!(classifier.is_subsumed_by(heart, heart_part)?);
    Ok(())
}

#[test]
fn new_existential_restriction_on_existing_edges() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (a, b, c, d) = (
        factory.concept("A")?,
        factory.concept("B")?,
        factory.concept("C")?,
        factory.concept("D")?,
    );
    let r = factory.role("r")?;
    classifier.classify(&[
        Axiom::subsumption(a, Concept::some(r, b)),
        Axiom::subsumption(b, c),
    ])?;

    // the filler is a supersumer of the edge target
    classifier.classify_incremental(&[Axiom::subsumption(Concept::some(r, c), d)])?;
    assert!(classifier.is_subsumed_by(a, d)?);
    assert!(!classifier.is_subsumed_by(b, d)?);
    assert_eq!(classifier.affected_concepts(), [a]);
    Ok(())
}

#[test]
fn new_datatype_restriction_on_existing_concept() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (patient, adult, person) = (
        factory.concept("Patient")?,
        factory.concept("Adult")?,
        factory.concept("Person")?,
    );
    let age = factory.feature("age")?;
    classifier.classify(&[
        Axiom::subsumption(patient, person),
        Axiom::subsumption(Concept::datatype(age, Operator::GreaterThanOrEqual, 18), adult),
    ])?;
    assert!(!classifier.is_subsumed_by(patient, adult)?);

    classifier.classify_incremental(&[Axiom::subsumption(
        person,
        Concept::datatype(age, Operator::Equals, 30),
    )])?;
    assert!(classifier.is_subsumed_by(person, adult)?);
    assert!(classifier.is_subsumed_by(patient, adult)?);
    Ok(())
}

#[test]
fn new_and_affected_concepts() -> Result<(), Box<dyn Error>> {
    let mut classifier = Classifier::new(ClassifierConfig::default());
    let factory = classifier.factory_mut();
    let (a, b, c) = (factory.concept("A")?, factory.concept("B")?, factory.concept("C")?);
    classifier.classify(&[Axiom::subsumption(a, b)])?;
    assert!(classifier.affected_concepts().is_empty());
    assert!(classifier.new_concepts().contains(&a));
    assert!(classifier.new_concepts().contains(&b));

    let factory = classifier.factory_mut();
    let (d, e) = (factory.concept("D")?, factory.concept("E")?);
    classifier.classify_incremental(&[Axiom::subsumption(b, c), Axiom::subsumption(d, e)])?;
    assert_eq!(classifier.new_concepts(), [d, e]);
    assert_eq!(classifier.affected_concepts(), [a, b]);
    let affected = classifier.affected_subsumptions()?;
    assert!(affected[&a].contains(&c));
    assert!(classifier.new_subsumptions()?[&d].contains(&e));
    Ok(())
}

#[test]
fn known_axioms_affect_nothing() -> Result<(), Box<dyn Error>> {
    let ontology = anatomy()?;
    let mut classifier = full(&ontology)?;
    let before = classifier.subsumptions()?;
    let stats = classifier.classify_incremental(&ontology.axioms)?;
    assert_eq!(stats.processed, 0);
    assert!(classifier.affected_concepts().is_empty());
    assert!(classifier.new_concepts().is_empty());
    assert_eq!(classifier.subsumptions()?, before);
    Ok(())
}
