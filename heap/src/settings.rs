use crate::DEFAULT_ROOT_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorSettings {
    /// Maximum number of roots. Must be > 0.
    pub root_capacity: usize,
    /// Simulated memory size in bytes. Allocations that would push live bytes
    /// past it fail; `None` never fails.
    pub heap_limit: Option<usize>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            root_capacity: DEFAULT_ROOT_CAPACITY,
            heap_limit: None,
        }
    }
}

impl SimulatorSettings {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.root_capacity == 0 {
            return Err("root_capacity must be > 0");
        }
        if self.heap_limit == Some(0) {
            return Err("heap_limit must be > 0 when set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = SimulatorSettings::default();
        assert_eq!(settings.root_capacity, 50);
        assert_eq!(settings.heap_limit, None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_zero_sizes() {
        let no_roots = SimulatorSettings {
            root_capacity: 0,
            ..Default::default()
        };
        assert!(no_roots.validate().is_err());

        let no_memory = SimulatorSettings {
            heap_limit: Some(0),
            ..Default::default()
        };
        assert!(no_memory.validate().is_err());
    }
}
