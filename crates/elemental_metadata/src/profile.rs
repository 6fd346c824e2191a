//! Store configuration profiles.
//!
//! A [`Profile`] names a store configuration: whether the store accepts
//! writes, which implementation to use for each contract, which identifier
//! generator each contract uses, and free-form backend parameters.

use std::collections::BTreeMap;

use elemental_foundation::{ElementType, Error, ErrorKind, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier generation strategy for a contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeneratorKind {
    /// Never assigns identifiers.
    Null,
    /// Requires the caller to supply identifiers.
    PassThrough,
    /// Assigns increasing identifiers above the largest already stored.
    #[default]
    Sequential,
    /// Assigns random non-negative identifiers, never repeating one.
    Random,
}

/// Configuration for one store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Profile {
    name: String,
    mutable: bool,
    parameters: BTreeMap<String, String>,
    implementations: BTreeMap<String, String>,
    generators: BTreeMap<String, GeneratorKind>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            mutable: true,
            parameters: BTreeMap::new(),
            implementations: BTreeMap::new(),
            generators: BTreeMap::new(),
        }
    }
}

impl Profile {
    /// Starts a profile with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder::new(name)
    }

    /// A writable profile with default implementations and generators.
    #[must_use]
    pub fn writable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A profile that rejects every write.
    #[must_use]
    pub fn read_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mutable: false,
            ..Self::default()
        }
    }

    /// The profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if stores using this profile accept writes.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Looks up a backend parameter.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Every backend parameter, sorted by key.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// The implementation selected for a contract, if any.
    #[must_use]
    pub fn implementation_of(&self, element: ElementType) -> Option<&str> {
        self.implementations.get(element.name()).map(String::as_str)
    }

    /// The generator strategy for a contract; sequential unless configured.
    #[must_use]
    pub fn generator_of(&self, element: ElementType) -> GeneratorKind {
        self.generators
            .get(element.name())
            .copied()
            .unwrap_or_default()
    }

    /// Encodes the profile as `MessagePack`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Serialization`] if encoding fails.
    #[cfg(feature = "serde")]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
    }

    /// Decodes a profile from `MessagePack`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Serialization`] if the bytes are not a profile.
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
    }
}

/// Assembles a [`Profile`].
#[derive(Clone, Debug)]
pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    /// Starts a writable profile with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            profile: Profile::writable(name),
        }
    }

    /// Copies every setting from an existing profile.
    pub fn load(&mut self, profile: &Profile) -> &mut Self {
        self.profile = profile.clone();
        self
    }

    /// Resets every setting except the name.
    pub fn clear(&mut self) -> &mut Self {
        let name = std::mem::take(&mut self.profile.name);
        self.profile = Profile::writable(name);
        self
    }

    /// Renames the profile.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.profile.name = name.into();
        self
    }

    /// Sets whether stores accept writes.
    pub fn set_mutable(&mut self, mutable: bool) -> &mut Self {
        self.profile.mutable = mutable;
        self
    }

    /// Sets a backend parameter.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.profile.parameters.insert(key.into(), value.into());
        self
    }

    /// Selects the implementation for a contract.
    pub fn set_implementation(
        &mut self,
        element: ElementType,
        name: impl Into<String>,
    ) -> &mut Self {
        self.profile
            .implementations
            .insert(element.name().to_string(), name.into());
        self
    }

    /// Reverts a contract to its default implementation.
    pub fn remove_implementation(&mut self, element: ElementType) -> &mut Self {
        self.profile.implementations.remove(element.name());
        self
    }

    /// Selects the generator strategy for a contract.
    pub fn set_generator(&mut self, element: ElementType, kind: GeneratorKind) -> &mut Self {
        self.profile
            .generators
            .insert(element.name().to_string(), kind);
        self
    }

    /// Builder method to set mutability.
    #[must_use]
    pub fn with_mutable(mut self, mutable: bool) -> Self {
        self.set_mutable(mutable);
        self
    }

    /// Builder method to set a backend parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Builder method to select an implementation.
    #[must_use]
    pub fn with_implementation(mut self, element: ElementType, name: impl Into<String>) -> Self {
        self.set_implementation(element, name);
        self
    }

    /// Builder method to select a generator strategy.
    #[must_use]
    pub fn with_generator(mut self, element: ElementType, kind: GeneratorKind) -> Self {
        self.set_generator(element, kind);
        self
    }

    /// Finishes the profile.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidDefinition`] if the name is empty.
    pub fn build(&self) -> Result<Profile> {
        if self.profile.name.is_empty() {
            return Err(Error::new(ErrorKind::InvalidDefinition(
                "profile name is empty".to_string(),
            )));
        }
        Ok(self.profile.clone())
    }
}
