//! Course offerings.
//!
//! A course is identified by its offering: name, semester and year. Two
//! implementations are registered: [`CourseData`], the writable default,
//! and [`LegacyCourse`], a read-only view over imported records.

use std::fmt;
use std::sync::Arc;

use elemental_foundation::{Error, ElementType, ErrorKind, Result, Value, ValueType};
use elemental_metadata::{Catalog, Definition, Entity, Property, Selector};
use elemental_store::{AnyLoader, Bindings, ID_PROPERTY, Loader};

/// The `Course` contract.
pub const COURSE: ElementType = ElementType::new("Course");

/// Name of the course name property.
pub const NAME: &str = "name";
/// Name of the semester property.
pub const SEMESTER: &str = "semester";
/// Name of the year property.
pub const YEAR: &str = "year";
/// Name of the unique offering selector.
pub const OFFERING: &str = "offering";

/// The part of the year a course runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Semester {
    /// January to April.
    Winter,
    /// May to August.
    Summer,
    /// September to December.
    Fall,
}

impl Semester {
    /// The stored form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "W",
            Self::Summer => "S",
            Self::Fall => "F",
        }
    }

    /// Parses the stored form.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "W" => Some(Self::Winter),
            "S" => Some(Self::Summer),
            "F" => Some(Self::Fall),
            _ => None,
        }
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Semester> for Value {
    fn from(semester: Semester) -> Self {
        Value::from(semester.as_str())
    }
}

/// The default `Course` implementation.
#[derive(Clone, Debug, Default)]
pub struct CourseData {
    id: Option<i64>,
    name: Option<Arc<str>>,
    semester: Option<Arc<str>>,
    year: Option<i64>,
}

impl CourseData {
    /// Implementation name registered in the catalog.
    pub const IMPLEMENTATION: &'static str = "CourseData";

    /// The course's identifier.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// The course's name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The semester the course runs in.
    #[must_use]
    pub fn semester(&self) -> Option<Semester> {
        self.semester.as_deref().and_then(Semester::parse)
    }

    /// The year the course runs in.
    #[must_use]
    pub fn year(&self) -> Option<i64> {
        self.year
    }
}

/// A read-only course record imported from an older schema.
///
/// Instances are materialized with [`LegacyCourse::into_entity`]; builders
/// for this implementation cannot stage values.
#[derive(Clone, Debug, Default)]
pub struct LegacyCourse {
    id: i64,
    name: Arc<str>,
    semester: Arc<str>,
    year: i64,
}

impl LegacyCourse {
    /// Implementation name registered in the catalog.
    pub const IMPLEMENTATION: &'static str = "LegacyCourse";

    /// Creates a record.
    #[must_use]
    pub fn new(id: i64, name: &str, semester: Semester, year: i64) -> Self {
        Self {
            id,
            name: Arc::from(name),
            semester: Arc::from(semester.as_str()),
            year,
        }
    }

    /// Wraps the record in an entity handle.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`] if the catalog lacks this
    /// implementation.
    pub fn into_entity(self, catalog: &Catalog) -> Result<Entity> {
        let meta = catalog
            .implementation(COURSE, Self::IMPLEMENTATION)
            .ok_or_else(|| {
                Error::new(ErrorKind::NotRegistered(format!(
                    "{COURSE}/{}",
                    Self::IMPLEMENTATION
                )))
            })?;
        Entity::wrap(Arc::clone(meta), self)
    }
}

pub(crate) fn define(catalog: &mut Catalog) -> Result<Arc<Definition>> {
    let id = Property::new(COURSE, ID_PROPERTY, ValueType::Int).required();
    let name = Property::new(COURSE, NAME, ValueType::String).required();
    let semester = Property::new(COURSE, SEMESTER, ValueType::String).required();
    let year = Property::new(COURSE, YEAR, ValueType::Int).required();

    let mut builder = catalog.define(COURSE);
    builder
        .add_property(id.clone())?
        .add_property(name.clone())?
        .add_property(semester.clone())?
        .add_property(year.clone())?
        .add_selector(Selector::of(COURSE, &id, true))?
        .add_selector(Selector::unique(COURSE, OFFERING, [name, semester, year]))?;
    catalog.register(builder)
}

pub(crate) fn implement(catalog: &mut Catalog) -> Result<()> {
    let data = catalog
        .bind(COURSE, CourseData::IMPLEMENTATION, CourseData::default)?
        .property(ID_PROPERTY, |c| c.id.map(Value::Int), |c, v| {
            c.id = v.and_then(|v| v.as_int());
        })?
        .property(NAME, |c| c.name.clone().map(Value::String), |c, v| {
            c.name = v.and_then(|v| v.as_shared_str());
        })?
        .property(SEMESTER, |c| c.semester.clone().map(Value::String), |c, v| {
            c.semester = v
                .and_then(|v| v.as_shared_str())
                .filter(|code| Semester::parse(code).is_some());
        })?
        .property(YEAR, |c| c.year.map(Value::Int), |c, v| {
            c.year = v.and_then(|v| v.as_int());
        })?;
    catalog.implement(data)?;

    let legacy = catalog
        .bind(COURSE, LegacyCourse::IMPLEMENTATION, LegacyCourse::default)?
        .read_only(ID_PROPERTY, |c| Some(Value::Int(c.id)))?
        .read_only(NAME, |c| Some(Value::String(Arc::clone(&c.name))))?
        .read_only(SEMESTER, |c| Some(Value::String(Arc::clone(&c.semester))))?
        .read_only(YEAR, |c| Some(Value::Int(c.year)))?;
    catalog.implement(legacy)?;
    Ok(())
}

/// Typed reads of courses.
#[derive(Clone, Debug)]
pub struct CourseLoader {
    loader: Loader,
}

impl CourseLoader {
    /// Wraps a generic loader.
    #[must_use]
    pub fn new(loader: Loader) -> Self {
        Self { loader }
    }

    pub(crate) fn factory(loader: Loader) -> AnyLoader {
        Arc::new(Self::new(loader))
    }

    /// The underlying generic loader.
    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Fetches the course offered under a name in a semester and year.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_offering(
        &self,
        name: &str,
        semester: Semester,
        year: i64,
    ) -> Result<Option<Entity>> {
        let bindings = Bindings::new()
            .with(NAME, name)
            .with(SEMESTER, semester)
            .with(YEAR, year);
        self.loader.fetch_unique(OFFERING, &bindings)
    }
}
