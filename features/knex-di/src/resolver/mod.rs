use crate::{
    errors::KnexError,
    types::{Instance, TypeInfo},
};

pub mod arc;

/// The resolved value of one dependency slot
#[derive(Debug, Clone)]
pub enum Dependency {
    Instance(Instance),
    /// Optional slot with nothing registered for it
    Absent,
    Collection(Vec<Instance>),
}

impl Dependency {
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Dependency::Instance(_) => "single",
            Dependency::Absent => "absent",
            Dependency::Collection(_) => "collection",
        }
    }
}

/// Resolved dependencies handed to an injector, in declared slot order
pub struct Dependencies {
    resolved: std::vec::IntoIter<(TypeInfo, Dependency)>,
}

impl Dependencies {
    pub(crate) fn new(resolved: Vec<(TypeInfo, Dependency)>) -> Self {
        Self {
            resolved: resolved.into_iter(),
        }
    }

    /// Takes the next slot's value in the requested shape
    pub fn next<R: Resolve>(&mut self) -> Result<R, KnexError> {
        let (capability, dependency) = self
            .resolved
            .next()
            .ok_or(KnexError::DependencyExhausted)?;
        R::resolve(capability, dependency)
    }

    /// Number of slots not taken yet
    pub fn remaining(&self) -> usize {
        self.resolved.len()
    }
}

/// Converts a resolved slot value into what an injector wants to hold
pub trait Resolve: Sized {
    fn resolve(capability: TypeInfo, dependency: Dependency) -> Result<Self, KnexError>;
}

impl Resolve for Dependency {
    fn resolve(_: TypeInfo, dependency: Dependency) -> Result<Self, KnexError> {
        Ok(dependency)
    }
}

impl Resolve for Instance {
    fn resolve(capability: TypeInfo, dependency: Dependency) -> Result<Self, KnexError> {
        match dependency {
            Dependency::Instance(instance) => Ok(instance),
            other => Err(KnexError::DependencyMismatch {
                capability,
                declared: other.shape(),
                requested: "single",
            }),
        }
    }
}
