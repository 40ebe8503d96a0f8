//! Symbol table giving dense integer ids to concepts, roles and features.
//!
//! Each kind of symbol lives in its own id space made of two tiers: a read-only base shared
//! between sessions and a growable overlay. [`Factory::extend`] freezes the overlay into the base
//! so that ids handed out by previous classification rounds never move.

use crate::error::ClassifyError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

macro_rules! id_type {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Builds an id from its raw value.
            #[inline]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            /// The raw value of the id.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            #[inline]
            pub(crate) const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Id of a concept. [`ConceptId::TOP`] and [`ConceptId::BOTTOM`] always exist.
    ConceptId,
    "c"
);
id_type!(
    /// Id of a role (object property).
    RoleId,
    "r"
);
id_type!(
    /// Id of a feature (datatype property).
    FeatureId,
    "f"
);

impl ConceptId {
    /// The most general concept.
    pub const TOP: Self = Self(0);
    /// The unsatisfiable concept.
    pub const BOTTOM: Self = Self(1);
}

#[derive(Debug, Clone, Default)]
struct Tier {
    offset: u32,
    names: Vec<Option<Box<str>>>,
    is_virtual: Vec<bool>,
    ids: FxHashMap<Box<str>, u32>,
}

impl Tier {
    fn starting_at(offset: u32) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    fn end(&self) -> u64 {
        u64::from(self.offset) + self.names.len() as u64
    }

    fn slot(&self, id: u32) -> Option<usize> {
        let slot = usize::try_from(id.checked_sub(self.offset)?).ok()?;
        (slot < self.names.len()).then_some(slot)
    }

    fn push(&mut self, name: Option<&str>, is_virtual: bool, kind: &'static str) -> Result<u32, ClassifyError> {
        let id = u32::try_from(self.end()).map_err(|_| ClassifyError::IdSpaceExhausted { kind })?;
        if id == u32::MAX {
            return Err(ClassifyError::IdSpaceExhausted { kind });
        }
        if let Some(name) = name {
            self.ids.insert(name.into(), id);
        }
        self.names.push(name.map(Into::into));
        self.is_virtual.push(is_virtual);
        Ok(id)
    }

    fn absorb(&mut self, other: Self) {
        debug_assert_eq!(self.end(), u64::from(other.offset), "tiers must be contiguous");
        self.names.extend(other.names);
        self.is_virtual.extend(other.is_virtual);
        self.ids.extend(other.ids);
    }
}

/// One id space: a frozen base tier followed by a growable overlay.
#[derive(Debug, Clone)]
struct IdSpace {
    kind: &'static str,
    base: Arc<Tier>,
    overlay: Tier,
    /// Base ids marked virtual after the base was frozen.
    virtual_in_base: FxHashSet<u32>,
    /// Ids left to another layer, never allocated here.
    reserved: Range<u32>,
}

impl IdSpace {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            base: Arc::new(Tier::default()),
            overlay: Tier::default(),
            virtual_in_base: FxHashSet::default(),
            reserved: 0..0,
        }
    }

    /// Skips the ids from the end of the base tier up to `offset`.
    fn skip_to(&mut self, offset: u32) {
        let start = self.base_len();
        if offset <= start {
            return;
        }
        let base = Arc::make_mut(&mut self.base);
        if base.names.is_empty() {
            base.offset = offset;
        } else {
            // the base tier stays contiguous
            let padding = usize::try_from(offset - start).unwrap_or(usize::MAX);
            base.names.resize(base.names.len() + padding, None);
            base.is_virtual.resize(base.is_virtual.len() + padding, false);
        }
        self.overlay = Tier::starting_at(offset);
        self.reserved = start..offset;
    }

    fn lookup(&self, name: &str) -> Option<u32> {
        self.base
            .ids
            .get(name)
            .or_else(|| self.overlay.ids.get(name))
            .copied()
    }

    fn intern(&mut self, name: &str) -> Result<u32, ClassifyError> {
        if let Some(id) = self.lookup(name) {
            return Ok(id);
        }
        self.overlay.push(Some(name), false, self.kind)
    }

    fn fresh_virtual(&mut self) -> Result<u32, ClassifyError> {
        self.overlay.push(None, true, self.kind)
    }

    fn len(&self) -> u32 {
        // Tier::push never lets the end go past u32::MAX
        u32::try_from(self.overlay.end()).unwrap_or(u32::MAX)
    }

    fn contains(&self, id: u32) -> bool {
        id < self.len() && !self.reserved.contains(&id)
    }

    fn resolve(&self, id: u32) -> Option<&str> {
        if let Some(slot) = self.base.slot(id) {
            self.base.names[slot].as_deref()
        } else {
            let slot = self.overlay.slot(id)?;
            self.overlay.names[slot].as_deref()
        }
    }

    fn is_virtual(&self, id: u32) -> bool {
        if let Some(slot) = self.base.slot(id) {
            self.base.is_virtual[slot] || self.virtual_in_base.contains(&id)
        } else {
            self.overlay
                .slot(id)
                .is_some_and(|slot| self.overlay.is_virtual[slot])
        }
    }

    fn mark_virtual(&mut self, id: u32) -> bool {
        if self.reserved.contains(&id) {
            false
        } else if self.base.slot(id).is_some() {
            self.virtual_in_base.insert(id);
            true
        } else if let Some(slot) = self.overlay.slot(id) {
            self.overlay.is_virtual[slot] = true;
            true
        } else {
            false
        }
    }

    fn freeze(&mut self) {
        let overlay = std::mem::take(&mut self.overlay);
        let base = Arc::make_mut(&mut self.base);
        base.absorb(overlay);
        for id in self.virtual_in_base.drain() {
            if let Some(slot) = base.slot(id) {
                base.is_virtual[slot] = true;
            }
        }
        // len() is bounded by u32::MAX
        self.overlay = Tier::starting_at(u32::try_from(base.end()).unwrap_or(u32::MAX));
    }

    /// Puts the given names at the start of the base tier.
    fn reserve(&mut self, names: &[&str]) {
        let base = Arc::make_mut(&mut self.base);
        for (id, name) in (0..).zip(names) {
            base.ids.insert((*name).into(), id);
            base.names.push(Some((*name).into()));
            base.is_virtual.push(false);
        }
        self.overlay = Tier::starting_at(u32::try_from(base.end()).unwrap_or(u32::MAX));
    }

    fn base_len(&self) -> u32 {
        self.overlay.offset
    }
}

/// The symbol table used by the classifier.
///
/// ```
/// use oxel::{ConceptId, Factory};
///
/// let mut factory = Factory::new();
/// let heart = factory.concept("Heart")?;
/// assert_eq!(factory.concept("Heart")?, heart);
/// assert_eq!(factory.concept_name(heart), Some("Heart"));
/// assert_eq!(factory.concept_name(ConceptId::TOP), Some(oxel::Factory::TOP_NAME));
/// # Result::<_, oxel::ClassifyError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Factory {
    concepts: IdSpace,
    roles: IdSpace,
    features: IdSpace,
}

impl Factory {
    /// Name of [`ConceptId::TOP`].
    pub const TOP_NAME: &'static str = "owl:Thing";
    /// Name of [`ConceptId::BOTTOM`].
    pub const BOTTOM_NAME: &'static str = "owl:Nothing";

    /// Creates a factory containing only the top and bottom concepts.
    pub fn new() -> Self {
        let mut concepts = IdSpace::new("concept");
        concepts.reserve(&[Self::TOP_NAME, Self::BOTTOM_NAME]);
        Self {
            concepts,
            roles: IdSpace::new("role"),
            features: IdSpace::new("feature"),
        }
    }

    /// Creates a factory whose first allocated ids are the given offsets.
    ///
    /// The ids below the offsets are left to another layer: they are unknown to this factory.
    /// Top and bottom keep the ids 0 and 1, so concept offsets below 2 have no effect.
    ///
    /// ```
    /// use oxel::{ConceptId, Factory, RoleId};
    ///
    /// let mut factory = Factory::with_offsets(100, 10, 0);
    /// assert_eq!(factory.concept("Heart")?, ConceptId::new(100));
    /// assert_eq!(factory.role("partOf")?, RoleId::new(10));
    /// assert!(factory.check_concept(ConceptId::new(50)).is_err());
    /// assert!(factory.check_concept(ConceptId::TOP).is_ok());
    /// # Result::<_, oxel::ClassifyError>::Ok(())
    /// ```
    pub fn with_offsets(concept: u32, role: u32, feature: u32) -> Self {
        let mut factory = Self::new();
        factory.concepts.skip_to(concept);
        factory.roles.skip_to(role);
        factory.features.skip_to(feature);
        factory
    }

    /// Returns the id of the named concept, allocating one if needed.
    pub fn concept(&mut self, name: &str) -> Result<ConceptId, ClassifyError> {
        self.concepts.intern(name).map(ConceptId)
    }

    /// Returns the id of the named role, allocating one if needed.
    pub fn role(&mut self, name: &str) -> Result<RoleId, ClassifyError> {
        self.roles.intern(name).map(RoleId)
    }

    /// Returns the id of the named feature, allocating one if needed.
    pub fn feature(&mut self, name: &str) -> Result<FeatureId, ClassifyError> {
        self.features.intern(name).map(FeatureId)
    }

    /// Returns the id of an already known concept.
    pub fn lookup_concept(&self, name: &str) -> Option<ConceptId> {
        self.concepts.lookup(name).map(ConceptId)
    }

    /// Returns the id of an already known role.
    pub fn lookup_role(&self, name: &str) -> Option<RoleId> {
        self.roles.lookup(name).map(RoleId)
    }

    /// Allocates an anonymous virtual concept.
    pub fn virtual_concept(&mut self) -> Result<ConceptId, ClassifyError> {
        self.concepts.fresh_virtual().map(ConceptId)
    }

    /// Allocates an anonymous virtual role.
    pub fn virtual_role(&mut self) -> Result<RoleId, ClassifyError> {
        self.roles.fresh_virtual().map(RoleId)
    }

    /// The name of a concept, `None` for virtual or unknown concepts.
    pub fn concept_name(&self, id: ConceptId) -> Option<&str> {
        self.concepts.resolve(id.0)
    }

    /// The name of a role, `None` for virtual or unknown roles.
    pub fn role_name(&self, id: RoleId) -> Option<&str> {
        self.roles.resolve(id.0)
    }

    /// The name of a feature, `None` for unknown features.
    pub fn feature_name(&self, id: FeatureId) -> Option<&str> {
        self.features.resolve(id.0)
    }

    /// The id following the last allocated concept id.
    pub fn total_concepts(&self) -> u32 {
        self.concepts.len()
    }

    /// The id following the last allocated role id.
    pub fn total_roles(&self) -> u32 {
        self.roles.len()
    }

    /// The id following the last allocated feature id.
    pub fn total_features(&self) -> u32 {
        self.features.len()
    }

    /// Is this concept introduced by normalisation (or explicitly marked as such)?
    pub fn is_virtual_concept(&self, id: ConceptId) -> bool {
        self.concepts.is_virtual(id.0)
    }

    /// Is this role introduced by normalisation of a role chain?
    pub fn is_virtual_role(&self, id: RoleId) -> bool {
        self.roles.is_virtual(id.0)
    }

    /// Marks an existing concept as virtual so that it is hidden from named results.
    pub fn mark_virtual_concept(&mut self, id: ConceptId) -> Result<(), ClassifyError> {
        if self.concepts.mark_virtual(id.0) {
            Ok(())
        } else {
            Err(ClassifyError::UnknownConcept(id))
        }
    }

    /// Fails with [`ClassifyError::UnknownConcept`] if the id is not allocated.
    pub fn check_concept(&self, id: ConceptId) -> Result<ConceptId, ClassifyError> {
        if self.concepts.contains(id.0) {
            Ok(id)
        } else {
            Err(ClassifyError::UnknownConcept(id))
        }
    }

    /// Fails with [`ClassifyError::UnknownRole`] if the id is not allocated.
    pub fn check_role(&self, id: RoleId) -> Result<RoleId, ClassifyError> {
        if self.roles.contains(id.0) {
            Ok(id)
        } else {
            Err(ClassifyError::UnknownRole(id))
        }
    }

    /// Fails with [`ClassifyError::UnknownFeature`] if the id is not allocated.
    pub fn check_feature(&self, id: FeatureId) -> Result<FeatureId, ClassifyError> {
        if self.features.contains(id.0) {
            Ok(id)
        } else {
            Err(ClassifyError::UnknownFeature(id))
        }
    }

    /// Freezes every id allocated so far into the read-only base tier.
    ///
    /// Ids allocated afterwards start right after the frozen range.
    pub fn extend(&mut self) {
        self.concepts.freeze();
        self.roles.freeze();
        self.features.freeze();
    }

    /// The first concept id of the current overlay tier.
    pub fn concept_overlay_start(&self) -> ConceptId {
        ConceptId(self.concepts.base_len())
    }

    /// Iterates over all allocated concept ids, in increasing order.
    pub fn concepts(&self) -> impl Iterator<Item = ConceptId> + use<> {
        let reserved = self.concepts.reserved.clone();
        (0..self.concepts.len())
            .filter(move |id| !reserved.contains(id))
            .map(ConceptId)
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new()
    }
}
