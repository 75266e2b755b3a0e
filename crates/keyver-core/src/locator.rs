//! Keyed service location
//!
//! Several implementations of one capability (a trait) can be bound under
//! different string keys. Bindings are collected by a
//! [`ServiceLocatorBuilder`] at startup; [`ServiceLocatorBuilder::build`]
//! runs every registered consumer probe so a missing key aborts startup
//! instead of failing the first request. The built [`ServiceLocator`] has
//! no mutating methods.
//!
//! ```rust,ignore
//! pub trait Employee: Send + Sync {
//!     fn message(&self) -> String;
//! }
//!
//! impl Capability for dyn Employee {
//!     const NAME: &'static str = "employee";
//! }
//!
//! let mut builder = ServiceLocator::builder();
//! builder.bind::<dyn Employee>("employeeRepo", Arc::new(EmployeeRepository))?;
//! let locator = builder.build()?;
//! let repo = locator.resolve::<dyn Employee>("employeeRepo")?;
//! ```

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A named service interface
///
/// Usually implemented for a trait object type, e.g. `dyn Employee`.
pub trait Capability: Send + Sync + 'static {
    /// Capability name used in lookups and error messages
    const NAME: &'static str;
}

/// A consumer that pulls its keyed dependencies out of the locator
pub trait FromLocator: Sized {
    fn from_locator(locator: &ServiceLocator) -> Result<Self, LocatorError>;
}

/// Startup-time binding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("no '{capability}' implementation is bound to key '{key}'")]
    UnregisteredCapability { capability: String, key: String },
    #[error("key '{key}' is already bound for capability '{capability}'")]
    DuplicateBinding { capability: String, key: String },
    #[error("capability name '{0}' is used by two different interface types")]
    CapabilityNameConflict(String),
}

type Probe = Box<dyn Fn(&ServiceLocator) -> Result<(), LocatorError> + Send + Sync>;

struct Binding {
    type_id: TypeId,
    service: Arc<dyn Any + Send + Sync>,
}

/// Collects bindings and consumer probes during startup
#[derive(Default)]
pub struct ServiceLocatorBuilder {
    bindings: HashMap<&'static str, HashMap<String, Binding>>,
    capability_types: HashMap<&'static str, TypeId>,
    probes: Vec<(&'static str, Probe)>,
}

impl ServiceLocatorBuilder {
    /// Bind an implementation of `T` under `key`
    pub fn bind<T>(&mut self, key: impl Into<String>, service: Arc<T>) -> Result<(), LocatorError>
    where
        T: Capability + ?Sized,
    {
        let key = key.into();
        let type_id = TypeId::of::<Arc<T>>();

        match self.capability_types.get(T::NAME) {
            Some(existing) if *existing != type_id => {
                return Err(LocatorError::CapabilityNameConflict(T::NAME.to_string()));
            }
            Some(_) => {}
            None => {
                self.capability_types.insert(T::NAME, type_id);
            }
        }

        let by_key = self.bindings.entry(T::NAME).or_default();
        if by_key.contains_key(&key) {
            return Err(LocatorError::DuplicateBinding {
                capability: T::NAME.to_string(),
                key,
            });
        }

        tracing::debug!(capability = T::NAME, key = %key, "Bound keyed service");
        by_key.insert(
            key,
            Binding {
                type_id,
                service: Arc::new(service),
            },
        );
        Ok(())
    }

    /// Register a consumer whose construction is attempted during `build`
    pub fn validate_consumer<C: FromLocator + 'static>(&mut self) {
        self.probes.push((
            std::any::type_name::<C>(),
            Box::new(|locator| C::from_locator(locator).map(|_| ())),
        ));
    }

    /// Register an arbitrary validation probe
    pub fn validate_with<F>(&mut self, consumer: &'static str, probe: F)
    where
        F: Fn(&ServiceLocator) -> Result<(), LocatorError> + Send + Sync + 'static,
    {
        self.probes.push((consumer, Box::new(probe)));
    }

    /// Freeze the bindings and run every consumer probe
    pub fn build(self) -> Result<ServiceLocator, LocatorError> {
        let locator = ServiceLocator {
            bindings: self.bindings,
        };

        for (consumer, probe) in &self.probes {
            if let Err(err) = probe(&locator) {
                tracing::error!(consumer = %consumer, error = %err, "Keyed service validation failed");
                return Err(err);
            }
            tracing::debug!(consumer = %consumer, "Keyed service consumer validated");
        }

        Ok(locator)
    }
}

/// Immutable keyed service bindings
#[derive(Default)]
pub struct ServiceLocator {
    bindings: HashMap<&'static str, HashMap<String, Binding>>,
}

impl ServiceLocator {
    /// Start collecting bindings
    pub fn builder() -> ServiceLocatorBuilder {
        ServiceLocatorBuilder::default()
    }

    /// Resolve the implementation of `T` bound to `key`
    pub fn resolve<T>(&self, key: &str) -> Result<Arc<T>, LocatorError>
    where
        T: Capability + ?Sized,
    {
        let binding = self.binding(T::NAME, key)?;

        if binding.type_id != TypeId::of::<Arc<T>>() {
            return Err(unregistered(T::NAME, key));
        }

        binding
            .service
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| unregistered(T::NAME, key))
    }

    /// Untyped lookup by capability name and key
    ///
    /// The returned value holds an `Arc<T>` for the capability's interface type.
    pub fn resolve_named(
        &self,
        capability: &str,
        key: &str,
    ) -> Result<Arc<dyn Any + Send + Sync>, LocatorError> {
        self.binding(capability, key)
            .map(|binding| binding.service.clone())
    }

    /// Check if a key is bound for a capability
    pub fn contains(&self, capability: &str, key: &str) -> bool {
        self.binding(capability, key).is_ok()
    }

    /// Bound keys for every capability, sorted
    pub fn describe(&self) -> BTreeMap<&'static str, Vec<&str>> {
        self.bindings
            .iter()
            .map(|(capability, by_key)| {
                let mut keys: Vec<&str> = by_key.keys().map(String::as_str).collect();
                keys.sort_unstable();
                (*capability, keys)
            })
            .collect()
    }

    fn binding(&self, capability: &str, key: &str) -> Result<&Binding, LocatorError> {
        self.bindings
            .get(capability)
            .and_then(|by_key| by_key.get(key))
            .ok_or_else(|| unregistered(capability, key))
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("bindings", &self.describe())
            .finish()
    }
}

fn unregistered(capability: &str, key: &str) -> LocatorError {
    LocatorError::UnregisteredCapability {
        capability: capability.to_string(),
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    impl Capability for dyn Greeter {
        const NAME: &'static str = "greeter";
    }

    trait Impostor: Send + Sync {}

    impl Capability for dyn Impostor {
        const NAME: &'static str = "greeter";
    }

    struct Impostor1;
    impl Impostor for Impostor1 {}

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct French;
    impl Greeter for French {
        fn greet(&self) -> String {
            "bonjour".to_string()
        }
    }

    struct NeedsBoth {
        english: Arc<dyn Greeter>,
        french: Arc<dyn Greeter>,
    }

    impl FromLocator for NeedsBoth {
        fn from_locator(locator: &ServiceLocator) -> Result<Self, LocatorError> {
            Ok(Self {
                english: locator.resolve::<dyn Greeter>("en")?,
                french: locator.resolve::<dyn Greeter>("fr")?,
            })
        }
    }

    fn builder_with_english() -> ServiceLocatorBuilder {
        let mut builder = ServiceLocator::builder();
        builder
            .bind::<dyn Greeter>("en", Arc::new(English))
            .unwrap();
        builder
    }

    #[test]
    fn test_resolve_by_key() {
        let mut builder = builder_with_english();
        builder.bind::<dyn Greeter>("fr", Arc::new(French)).unwrap();
        let locator = builder.build().unwrap();

        assert_eq!(locator.resolve::<dyn Greeter>("en").unwrap().greet(), "hello");
        assert_eq!(locator.resolve::<dyn Greeter>("fr").unwrap().greet(), "bonjour");
        assert!(locator.contains("greeter", "fr"));
        assert_eq!(locator.describe()["greeter"], vec!["en", "fr"]);
    }

    #[test]
    fn test_missing_key_is_unregistered() {
        let locator = builder_with_english().build().unwrap();

        assert_eq!(
            locator.resolve::<dyn Greeter>("de").err(),
            Some(LocatorError::UnregisteredCapability {
                capability: "greeter".to_string(),
                key: "de".to_string(),
            })
        );
        assert!(locator.resolve_named("greeter", "de").is_err());
        assert!(locator.resolve_named("greeter", "en").is_ok());
    }

    #[test]
    fn test_named_lookup_holds_typed_arc() {
        let locator = builder_with_english().build().unwrap();
        let any = locator.resolve_named("greeter", "en").unwrap();

        let greeter = any.downcast_ref::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut builder = builder_with_english();

        assert_eq!(
            builder.bind::<dyn Greeter>("en", Arc::new(French)),
            Err(LocatorError::DuplicateBinding {
                capability: "greeter".to_string(),
                key: "en".to_string(),
            })
        );
    }

    #[test]
    fn test_capability_name_conflict() {
        let mut builder = builder_with_english();

        assert_eq!(
            builder.bind::<dyn Impostor>("x", Arc::new(Impostor1)),
            Err(LocatorError::CapabilityNameConflict("greeter".to_string()))
        );
    }

    #[test]
    fn test_build_fails_fast_for_missing_consumer_key() {
        let mut builder = builder_with_english();
        builder.validate_consumer::<NeedsBoth>();

        assert_eq!(
            builder.build().err(),
            Some(LocatorError::UnregisteredCapability {
                capability: "greeter".to_string(),
                key: "fr".to_string(),
            })
        );
    }

    #[test]
    fn test_build_succeeds_when_consumers_satisfied() {
        let mut builder = builder_with_english();
        builder.bind::<dyn Greeter>("fr", Arc::new(French)).unwrap();
        builder.validate_consumer::<NeedsBoth>();
        builder.validate_with("probe", |l| l.resolve::<dyn Greeter>("en").map(|_| ()));

        let locator = builder.build().unwrap();
        let consumer = NeedsBoth::from_locator(&locator).unwrap();
        assert_eq!(consumer.english.greet(), "hello");
        assert_eq!(consumer.french.greet(), "bonjour");
    }
}
