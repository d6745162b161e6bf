//! Validators looked up by the type they validate

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{EvaluationResult, ValidatorError, ValidatorResult};
use crate::validator::Validator;

type ErasedFactory = Arc<dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync>;

#[derive(Clone)]
enum ValidatorEntry {
    /// Shared instance
    Instance(Arc<dyn Any + Send + Sync>),
    /// Built on every lookup
    Factory(ErasedFactory),
}

impl fmt::Debug for ValidatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorEntry::Instance(_) => f.debug_tuple("Instance").field(&"<validator>").finish(),
            ValidatorEntry::Factory(_) => f.debug_tuple("Factory").field(&"<factory>").finish(),
        }
    }
}

/// One validator per validated type
///
/// Registering a second validator for the same type replaces the first.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    entries: RwLock<HashMap<TypeId, ValidatorEntry>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: Sync + 'static>(&self, validator: Validator<P>) {
        self.register_shared(Arc::new(validator));
    }

    pub fn register_shared<P: Sync + 'static>(&self, validator: Arc<Validator<P>>) {
        debug!(validator = type_name::<P>(), "registering validator");
        self.insert::<P>(ValidatorEntry::Instance(validator));
    }

    /// Build a fresh validator on every lookup
    pub fn register_factory<P, F>(&self, factory: F)
    where
        P: Sync + 'static,
        F: Fn() -> Validator<P> + Send + Sync + 'static,
    {
        debug!(validator = type_name::<P>(), "registering validator factory");
        self.insert::<P>(ValidatorEntry::Factory(Arc::new(move || -> Arc<dyn Any + Send + Sync> {
            Arc::new(factory())
        })));
    }

    fn insert<P: Sync + 'static>(&self, entry: ValidatorEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<P>(), entry);
    }

    pub fn contains<P: Sync + 'static>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<P>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry<P: Sync + 'static>(&self) -> Option<ValidatorEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<P>())
            .cloned()
    }

    /// Factories run after the lock is released, so they may use the registry
    pub fn try_get<P: Sync + 'static>(&self) -> Option<Arc<Validator<P>>> {
        let erased = match self.entry::<P>()? {
            ValidatorEntry::Instance(validator) => validator,
            ValidatorEntry::Factory(factory) => factory(),
        };
        erased.downcast::<Validator<P>>().ok()
    }

    pub fn get<P: Sync + 'static>(&self) -> ValidatorResult<Arc<Validator<P>>> {
        self.try_get::<P>()
            .ok_or(ValidatorError::NotRegistered(type_name::<P>()))
    }

    /// Validate with the registered validator for `P`
    pub fn validate<P: Sync + 'static>(&self, instance: &P) -> EvaluationResult {
        self.get::<P>()?.validate(instance)
    }

    pub async fn validate_async<P: Sync + 'static>(&self, instance: &P) -> EvaluationResult {
        let validator = self.get::<P>()?;
        validator.validate_async(instance).await
    }
}
