#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod classifier;
mod config;
mod context;
mod datatype;
mod error;
mod expression;
mod factory;
mod incremental;
mod index;
mod normal_form;
mod normaliser;
mod role_closure;
mod saturation;
mod store;

pub use crate::classifier::Classifier;
pub use crate::config::ClassifierConfig;
pub use crate::datatype::{Datatype, Literal, Operator};
pub use crate::error::ClassifyError;
pub use crate::expression::{Axiom, Concept};
pub use crate::factory::{ConceptId, Factory, FeatureId, RoleId};
pub use crate::index::{Nf3Discipline, OntologyIndex};
pub use crate::normal_form::{
    ConjunctionEntry, FeatureEntry, NormalFormKind, NormalFormRule, RoleEntry,
};
pub use crate::normaliser::{Normalisation, Normaliser};
pub use crate::role_closure::{RoleClosure, RoleSet};
pub use crate::saturation::SaturationStats;
pub use crate::store::{ConceptSet, RelationshipStore, SubsumptionStore};
pub use oxsdatatypes::{Boolean, Date, Double, Float, Integer};
