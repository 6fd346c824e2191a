//! Identifier generation strategies.
//!
//! Each store keeps one generator per contract in a [`GeneratorSet`],
//! created on first use from the identifiers already stored, so new
//! identifiers never collide with stored ones and every writer to the store
//! draws from the same sequence.

use std::collections::{HashMap, HashSet};
use std::fmt;

use elemental_foundation::{ElementType, Error, ErrorKind, Result};
use elemental_metadata::{ElementBuilder, GeneratorKind, Property};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Produces identifiers for new instances of one contract.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// The strategy implemented.
    fn kind(&self) -> GeneratorKind;

    /// Produces the next identifier, or `None` if this strategy never assigns.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier space is exhausted.
    fn next_id(&mut self) -> Result<Option<i64>>;

    /// Stages an identifier on the builder unless one is already staged.
    ///
    /// # Errors
    ///
    /// Returns an error if no identifier can be produced or staged.
    fn assign(&mut self, builder: &mut ElementBuilder, id: &Property) -> Result<()> {
        if builder.property_value(id).is_some() {
            return Ok(());
        }
        if let Some(next) = self.next_id()? {
            builder.set_property(id, next)?;
        }
        Ok(())
    }
}

/// Creates the generator for a strategy, seeded with the stored identifiers.
///
/// `seed` fixes the random generator's sequence; without it the random
/// generator draws its seed from the operating system.
#[must_use]
pub fn generator(
    kind: GeneratorKind,
    existing: impl IntoIterator<Item = i64>,
    seed: Option<u64>,
) -> Box<dyn IdGenerator> {
    match kind {
        GeneratorKind::Null => Box::new(NullIdGenerator),
        GeneratorKind::PassThrough => Box::new(PassThroughIdGenerator),
        GeneratorKind::Sequential => Box::new(SequentialIdGenerator::from_existing(existing)),
        GeneratorKind::Random => Box::new(match seed {
            Some(seed) => RandomIdGenerator::with_seed(seed, existing),
            None => RandomIdGenerator::new(existing),
        }),
    }
}

/// Never assigns identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullIdGenerator;

impl IdGenerator for NullIdGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Null
    }

    fn next_id(&mut self) -> Result<Option<i64>> {
        Ok(None)
    }
}

/// Leaves identifiers exactly as the caller staged them.
///
/// A missing identifier is reported by the builder's required-property
/// check, not here.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThroughIdGenerator;

impl IdGenerator for PassThroughIdGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::PassThrough
    }

    fn next_id(&mut self) -> Result<Option<i64>> {
        Ok(None)
    }

    fn assign(&mut self, _builder: &mut ElementBuilder, _id: &Property) -> Result<()> {
        Ok(())
    }
}

/// Assigns increasing identifiers above the largest stored one.
#[derive(Clone, Copy, Debug)]
pub struct SequentialIdGenerator {
    next: Option<i64>,
    last: i64,
}

impl SequentialIdGenerator {
    /// Starts after the given identifier.
    #[must_use]
    pub fn starting_after(last: i64) -> Self {
        Self {
            next: last.checked_add(1),
            last,
        }
    }

    /// Starts after the largest stored identifier, or after 0 if none is
    /// positive.
    #[must_use]
    pub fn from_existing(existing: impl IntoIterator<Item = i64>) -> Self {
        Self::starting_after(existing.into_iter().max().unwrap_or(0).max(0))
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Sequential
    }

    fn next_id(&mut self) -> Result<Option<i64>> {
        let id = self
            .next
            .ok_or_else(|| Error::new(ErrorKind::IdSpaceExhausted(self.last)))?;
        self.last = id;
        self.next = id.checked_add(1);
        Ok(Some(id))
    }
}

/// Assigns random non-negative identifiers, never one already used.
pub struct RandomIdGenerator {
    rng: ChaCha20Rng,
    used: HashSet<i64>,
}

impl RandomIdGenerator {
    /// Seeds from the operating system.
    #[must_use]
    pub fn new(existing: impl IntoIterator<Item = i64>) -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            used: existing.into_iter().collect(),
        }
    }

    /// Seeds deterministically.
    #[must_use]
    pub fn with_seed(seed: u64, existing: impl IntoIterator<Item = i64>) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            used: existing.into_iter().collect(),
        }
    }

    /// Every identifier returned so far, plus the seeded ones.
    #[must_use]
    pub fn used(&self) -> &HashSet<i64> {
        &self.used
    }
}

impl fmt::Debug for RandomIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomIdGenerator")
            .field("used", &self.used.len())
            .finish_non_exhaustive()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Random
    }

    fn next_id(&mut self) -> Result<Option<i64>> {
        loop {
            let candidate: i64 = self.rng.r#gen();
            if candidate >= 0 && self.used.insert(candidate) {
                return Ok(Some(candidate));
            }
        }
    }
}

/// The identifier generators of one store, keyed by contract.
#[derive(Debug, Default)]
pub struct GeneratorSet {
    generators: HashMap<ElementType, Box<dyn IdGenerator>>,
}

impl GeneratorSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a generator exists for the contract.
    #[must_use]
    pub fn contains(&self, element: ElementType) -> bool {
        self.generators.contains_key(&element)
    }

    /// The generator for a contract, if one has been created.
    pub fn get_mut(&mut self, element: ElementType) -> Option<&mut (dyn IdGenerator + 'static)> {
        self.generators.get_mut(&element).map(|g| &mut **g)
    }

    /// Installs the generator for a contract, replacing any previous one.
    pub fn insert(&mut self, element: ElementType, generator: Box<dyn IdGenerator>) {
        self.generators.insert(element, generator);
    }

    /// Drops every generator.
    pub fn clear(&mut self) {
        self.generators.clear();
    }

    /// Number of contracts with a generator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns true if no generator has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}
