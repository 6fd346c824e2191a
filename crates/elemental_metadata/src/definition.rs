//! Element definitions: the properties and selectors of one contract.
//!
//! A [`Definition`] links to its parent, so lookups by name walk up the
//! chain and aggregate views are unions over the chain. Definitions are
//! immutable once registered; a [`DefinitionBuilder`] collects declarations
//! and the [`Catalog`](crate::Catalog) validates them against the parent.

use std::fmt;
use std::sync::Arc;

use elemental_foundation::{ElementType, Error, ErrorKind, Result};

use crate::property::Property;
use crate::selector::{ALL, Selector};

/// The registered shape of one element type.
pub struct Definition {
    element: ElementType,
    parent: Option<Arc<Definition>>,
    properties: Vec<Property>,
    selectors: Vec<Selector>,
}

impl Definition {
    pub(crate) fn root() -> Self {
        Self {
            element: ElementType::ROOT,
            parent: None,
            properties: Vec::new(),
            selectors: vec![Selector::all(ElementType::ROOT)],
        }
    }

    /// Returns the element type.
    #[must_use]
    pub fn element(&self) -> ElementType {
        self.element
    }

    /// Returns the parent definition; only the root has none.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Definition>> {
        self.parent.as_ref()
    }

    /// Iterates this definition and its ancestors, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &Definition> {
        std::iter::successors(Some(self), |d| d.parent.as_deref())
    }

    /// Returns true if this element type is `element` or descends from it.
    #[must_use]
    pub fn is_a(&self, element: ElementType) -> bool {
        self.ancestry().any(|d| d.element == element)
    }

    /// Properties declared directly on this element type.
    #[must_use]
    pub fn own_properties(&self) -> &[Property] {
        &self.properties
    }

    /// Selectors declared directly on this element type.
    #[must_use]
    pub fn own_selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Looks up a visible property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.ancestry()
            .find_map(|d| d.properties.iter().find(|p| p.name() == name))
    }

    /// Every visible property, inherited ones first.
    #[must_use]
    pub fn properties(&self) -> Vec<&Property> {
        let chain: Vec<&Definition> = self.ancestry().collect();
        chain
            .into_iter()
            .rev()
            .flat_map(|d| d.properties.iter())
            .collect()
    }

    /// Returns true if the property is visible on this element type.
    #[must_use]
    pub fn has_property(&self, property: &Property) -> bool {
        self.property(property.name())
            .is_some_and(|p| p.is_identical(property))
    }

    /// Looks up a visible selector by name, nearest declaration first.
    #[must_use]
    pub fn selector(&self, name: &str) -> Option<&Selector> {
        self.ancestry()
            .find_map(|d| d.selectors.iter().find(|s| s.name() == name))
    }

    /// Every visible selector, inherited ones first.
    #[must_use]
    pub fn selectors(&self) -> Vec<&Selector> {
        let chain: Vec<&Definition> = self.ancestry().collect();
        chain
            .into_iter()
            .rev()
            .flat_map(|d| d.selectors.iter())
            .collect()
    }

    /// Visible unique selectors, which every store must index.
    #[must_use]
    pub fn unique_selectors(&self) -> Vec<&Selector> {
        self.selectors()
            .into_iter()
            .filter(|s| s.is_unique())
            .collect()
    }

    /// Returns the selector over every instance of this element type.
    #[must_use]
    pub fn all(&self) -> Selector {
        Selector::all(self.element)
    }

    fn matches(&self, builder: &DefinitionBuilder, parent: ElementType) -> bool {
        let own_selectors: Vec<&Selector> =
            self.selectors.iter().filter(|s| !s.is_all()).collect();
        self.parent.as_ref().map(|p| p.element) == Some(parent)
            && self.properties.len() == builder.properties.len()
            && self
                .properties
                .iter()
                .zip(&builder.properties)
                .all(|(a, b)| a.is_identical(b))
            && own_selectors.len() == builder.selectors.len()
            && own_selectors
                .iter()
                .zip(&builder.selectors)
                .all(|(a, b)| !a.conflicts_with(b) && *a == b)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("element", &self.element)
            .field("parent", &self.parent.as_ref().map(|p| p.element))
            .field("properties", &self.properties)
            .field("selectors", &self.selectors)
            .finish()
    }
}

/// Collects the declarations for one element type before registration.
#[derive(Clone, Debug)]
pub struct DefinitionBuilder {
    element: ElementType,
    parents: Vec<ElementType>,
    properties: Vec<Property>,
    selectors: Vec<Selector>,
}

impl DefinitionBuilder {
    /// Starts a definition that descends from the root element type.
    #[must_use]
    pub fn new(element: ElementType) -> Self {
        Self {
            element,
            parents: Vec::new(),
            properties: Vec::new(),
            selectors: Vec::new(),
        }
    }

    /// Declares a parent element type.
    ///
    /// Declaring more than one distinct parent fails at registration.
    #[must_use]
    pub fn extends(mut self, parent: ElementType) -> Self {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }

    /// Returns the element type being defined.
    #[must_use]
    pub fn element(&self) -> ElementType {
        self.element
    }

    /// Declares a property.
    ///
    /// Re-adding an identical property is a no-op; re-adding a name with
    /// different attributes is a conflict.
    ///
    /// # Errors
    ///
    /// Returns an error if the property belongs to another element type,
    /// has an empty name, or conflicts with an earlier declaration.
    pub fn add_property(&mut self, property: Property) -> Result<&mut Self> {
        if property.element() != self.element {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "property {property} declared on {}",
                self.element
            ))));
        }
        if property.name().is_empty() {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "empty property name on {}",
                self.element
            ))));
        }
        match self.properties.iter().find(|p| p.name() == property.name()) {
            Some(existing) if existing.is_identical(&property) => Ok(self),
            Some(existing) => Err(Error::conflict(format!(
                "property {existing:?} redeclared as {property:?}"
            ))),
            None => {
                self.properties.push(property);
                Ok(self)
            }
        }
    }

    /// Declares a selector.
    ///
    /// Re-adding an identical selector is a no-op; re-adding a name with a
    /// different uniqueness or property list is a conflict.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector belongs to another element type,
    /// has no properties, or conflicts with an earlier declaration.
    pub fn add_selector(&mut self, selector: Selector) -> Result<&mut Self> {
        if selector.element() != self.element {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "selector {} declared on {}",
                selector.id(),
                self.element
            ))));
        }
        if selector.name() == ALL {
            return if selector.is_all() && !selector.is_unique() {
                Ok(self)
            } else {
                Err(Error::conflict(format!(
                    "selector name {ALL} is reserved on {}",
                    self.element
                )))
            };
        }
        if selector.properties().is_empty() {
            return Err(Error::new(ErrorKind::InvalidDefinition(format!(
                "selector {} has no properties",
                selector.id()
            ))));
        }
        match self.selectors.iter().find(|s| s.name() == selector.name()) {
            Some(existing) if existing.conflicts_with(&selector) => Err(Error::conflict(
                format!("selector {existing:?} redeclared as {selector:?}"),
            )),
            Some(_) => Ok(self),
            None => {
                self.selectors.push(selector);
                Ok(self)
            }
        }
    }

    /// Validates the declarations against the resolved parent and freezes them.
    ///
    /// Returns the existing definition instead when it was registered before
    /// with identical declarations.
    pub(crate) fn finish(
        self,
        lookup: impl Fn(ElementType) -> Option<Arc<Definition>>,
    ) -> Result<Arc<Definition>> {
        if self.parents.len() > 1 {
            return Err(Error::new(ErrorKind::DiamondInheritance {
                element: self.element,
                parents: self.parents,
            }));
        }
        let parent_type = self.parents.first().copied().unwrap_or(ElementType::ROOT);

        if let Some(existing) = lookup(self.element) {
            return if existing.matches(&self, parent_type) {
                Ok(existing)
            } else {
                Err(Error::conflict(format!(
                    "element type {} is already registered",
                    self.element
                )))
            };
        }

        let parent = lookup(parent_type)
            .ok_or_else(|| Error::new(ErrorKind::UnknownElementType(parent_type.to_string())))?;

        for property in &self.properties {
            if let Some(inherited) = parent.property(property.name()) {
                return Err(Error::conflict(format!(
                    "{property} shadows inherited {inherited}"
                )));
            }
        }

        for selector in &self.selectors {
            if parent.selector(selector.name()).is_some() {
                return Err(Error::conflict(format!(
                    "selector {} shadows an inherited selector",
                    selector.id()
                )));
            }
            for property in selector.properties() {
                let own = self.properties.iter().any(|p| p.is_identical(property));
                if !own && !parent.has_property(property) {
                    return Err(Error::unknown_property(self.element, property.name()));
                }
            }
        }

        let mut selectors = self.selectors;
        selectors.push(Selector::all(self.element));

        Ok(Arc::new(Definition {
            element: self.element,
            parent: Some(parent),
            properties: self.properties,
            selectors,
        }))
    }
}
