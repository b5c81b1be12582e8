//! Named lookup of circuit breakers with bulk inspection and force operations.

use super::breaker::CircuitBreaker;
use super::types::CircuitSnapshot;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use resiliens_core::{CircuitStatus, UnknownCircuit};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased view of a circuit breaker, as held by the registry
pub trait ManagedCircuit: Send + Sync {
    fn name(&self) -> &str;

    /// Status derived at the time of the call
    fn status(&self) -> CircuitStatus;

    fn is_open(&self) -> bool {
        self.status() == CircuitStatus::Open
    }

    fn is_closed(&self) -> bool {
        self.status() == CircuitStatus::Closed
    }

    fn failure_threshold(&self) -> u32;

    fn failure_count(&self) -> usize;

    fn open_until(&self) -> DateTime<Utc>;

    fn open_seconds_remaining(&self) -> i64;

    fn snapshot(&self) -> CircuitSnapshot;

    fn force_open(&self);

    fn force_reset(&self);

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Registry of circuit breakers keyed by name.
///
/// Registering a second breaker under an existing name replaces the first.
/// Entries are never removed; a registry lives as long as the breakers it tracks.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    circuits: DashMap<String, Arc<dyn ManagedCircuit>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new registry ready to hand to [`CircuitBreaker::builder`]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register `circuit` under its name, returning the breaker it replaced
    pub fn register(&self, circuit: Arc<dyn ManagedCircuit>) -> Option<Arc<dyn ManagedCircuit>> {
        let name = circuit.name().to_string();
        let incoming = Arc::as_ptr(&circuit) as *const ();
        let previous = self.circuits.insert(name.clone(), circuit);

        if let Some(previous) = &previous {
            if Arc::as_ptr(previous) as *const () != incoming {
                tracing::debug!(circuit = %name, "replacing circuit breaker registered under the same name");
            }
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ManagedCircuit>> {
        self.circuits.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a breaker and recover its concrete type
    pub fn get_as<E>(&self, name: &str) -> Option<Arc<CircuitBreaker<E>>>
    where
        E: Clone + fmt::Debug + Send + Sync + 'static,
    {
        self.get(name)?.as_any().downcast::<CircuitBreaker<E>>().ok()
    }

    /// All registered breakers
    pub fn circuits(&self) -> Vec<Arc<dyn ManagedCircuit>> {
        self.circuits
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.circuits.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Breakers whose derived status is currently `Open`
    pub fn open(&self) -> Vec<Arc<dyn ManagedCircuit>> {
        self.with_status(CircuitStatus::Open)
    }

    /// Breakers whose derived status is currently `Closed`
    pub fn closed(&self) -> Vec<Arc<dyn ManagedCircuit>> {
        self.with_status(CircuitStatus::Closed)
    }

    /// True if every registered breaker currently reads as `Closed`
    pub fn all_closed(&self) -> bool {
        self.circuits.iter().all(|entry| entry.value().is_closed())
    }

    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        self.circuits().iter().map(|circuit| circuit.snapshot()).collect()
    }

    pub fn force_open(&self, name: &str) -> Result<(), UnknownCircuit> {
        self.get(name)
            .ok_or_else(|| UnknownCircuit::new(name))?
            .force_open();
        Ok(())
    }

    pub fn force_reset(&self, name: &str) -> Result<(), UnknownCircuit> {
        self.get(name)
            .ok_or_else(|| UnknownCircuit::new(name))?
            .force_reset();
        Ok(())
    }

    pub fn force_all_open(&self) {
        for circuit in self.circuits() {
            circuit.force_open();
        }
    }

    pub fn force_all_reset(&self) {
        for circuit in self.circuits() {
            circuit.force_reset();
        }
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    fn with_status(&self, status: CircuitStatus) -> Vec<Arc<dyn ManagedCircuit>> {
        self.circuits()
            .into_iter()
            .filter(|circuit| circuit.status() == status)
            .collect()
    }
}

impl fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("circuits", &self.names())
            .finish()
    }
}
