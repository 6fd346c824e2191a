//! A user's participation in a course under a role.

use std::sync::Arc;

use elemental_foundation::{ElementType, Error, ErrorKind, Result, Value, ValueType};
use elemental_metadata::{Catalog, Definition, Entity, Property, Selector};
use elemental_store::{AnyLoader, Bindings, ID_PROPERTY, Loader};

use crate::course::COURSE;
use crate::role::ROLE;

/// The `Enrolment` contract.
pub const ENROLMENT: ElementType = ElementType::new("Enrolment");

/// Name of the course reference property.
pub const COURSE_REF: &str = "course";
/// Name of the role reference property.
pub const ROLE_REF: &str = "role";
/// Name of the final grade property.
pub const FINAL_GRADE: &str = "final_grade";
/// Name of the property recording whether the enrolment's data may be used.
pub const USABLE: &str = "usable";

/// The default `Enrolment` implementation.
#[derive(Clone, Debug, Default)]
pub struct EnrolmentData {
    id: Option<i64>,
    course: Option<i64>,
    role: Option<i64>,
    final_grade: Option<i64>,
    usable: Option<bool>,
}

impl EnrolmentData {
    /// Implementation name registered in the catalog.
    pub const IMPLEMENTATION: &'static str = "EnrolmentData";

    /// The enrolment's identifier.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Identifier of the course.
    #[must_use]
    pub fn course(&self) -> Option<i64> {
        self.course
    }

    /// Identifier of the role.
    #[must_use]
    pub fn role(&self) -> Option<i64> {
        self.role
    }

    /// The final grade, once assigned.
    #[must_use]
    pub fn final_grade(&self) -> Option<i64> {
        self.final_grade
    }

    /// Returns true if the enrolment's data may be used.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.usable.unwrap_or(false)
    }
}

pub(crate) fn define(catalog: &mut Catalog) -> Result<Arc<Definition>> {
    let id = Property::new(ENROLMENT, ID_PROPERTY, ValueType::Int).required();
    let course = Property::new(ENROLMENT, COURSE_REF, ValueType::Id(COURSE)).required();
    let role = Property::new(ENROLMENT, ROLE_REF, ValueType::Id(ROLE))
        .mutable()
        .required();
    let final_grade = Property::new(ENROLMENT, FINAL_GRADE, ValueType::Int).mutable();
    let usable = Property::new(ENROLMENT, USABLE, ValueType::Bool)
        .mutable()
        .required();

    let mut builder = catalog.define(ENROLMENT);
    builder
        .add_property(id.clone())?
        .add_property(course.clone())?
        .add_property(role.clone())?
        .add_property(final_grade)?
        .add_property(usable)?
        .add_selector(Selector::of(ENROLMENT, &id, true))?
        .add_selector(Selector::of(ENROLMENT, &course, false))?
        .add_selector(Selector::of(ENROLMENT, &role, false))?;
    catalog.register(builder)
}

pub(crate) fn implement(catalog: &mut Catalog) -> Result<()> {
    let binding = catalog
        .bind(ENROLMENT, EnrolmentData::IMPLEMENTATION, EnrolmentData::default)?
        .property(ID_PROPERTY, |e| e.id.map(Value::Int), |e, v| {
            e.id = v.and_then(|v| v.as_int());
        })?
        .property(COURSE_REF, |e| e.course.map(Value::Id), |e, v| {
            e.course = v.and_then(|v| v.as_id());
        })?
        .property(ROLE_REF, |e| e.role.map(Value::Id), |e, v| {
            e.role = v.and_then(|v| v.as_id());
        })?
        .property(FINAL_GRADE, |e| e.final_grade.map(Value::Int), |e, v| {
            e.final_grade = v.and_then(|v| v.as_int());
        })?
        .property(USABLE, |e| e.usable.map(Value::Bool), |e, v| {
            e.usable = v.and_then(|v| v.as_bool());
        })?;
    catalog.implement(binding)?;
    Ok(())
}

/// Declares the enrolment's references to its course and role.
pub(crate) fn relate(catalog: &mut Catalog) -> Result<()> {
    catalog.relate(ENROLMENT, COURSE_REF, COURSE_REF, COURSE, ID_PROPERTY)?;
    catalog.relate(ENROLMENT, ROLE_REF, ROLE_REF, ROLE, ID_PROPERTY)?;
    Ok(())
}

/// Typed reads of enrolments.
#[derive(Clone, Debug)]
pub struct EnrolmentLoader {
    loader: Loader,
}

impl EnrolmentLoader {
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

    /// Fetches every enrolment in a course.
    ///
    /// A course without an identifier has no enrolments.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::WrongElementType`] if `course` is not a course,
    /// or an error if the store cannot be queried.
    pub fn fetch_by_course(&self, course: &Entity) -> Result<Vec<Entity>> {
        if !course.is_a(COURSE) {
            return Err(Error::new(ErrorKind::WrongElementType {
                expected: COURSE,
                actual: course.element_type(),
            }));
        }
        let Some(id) = course.value(ID_PROPERTY)?.and_then(|v| v.as_int()) else {
            return Ok(Vec::new());
        };
        self.loader
            .fetch(COURSE_REF, &Bindings::new().with(COURSE_REF, Value::Id(id)))
    }

    /// Fetches every enrolment held under a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn fetch_by_role(&self, role: i64) -> Result<Vec<Entity>> {
        self.loader
            .fetch(ROLE_REF, &Bindings::new().with(ROLE_REF, Value::Id(role)))
    }
}
