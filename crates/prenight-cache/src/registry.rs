use std::sync::Arc;

use prenight_core::PlotName;
use prenight_plots::PlotBuilder;

use crate::error::{CacheError, Result};

/// Plot names and their builders, in registration order.
#[derive(Default)]
pub struct PlotRegistry {
    builders: Vec<(PlotName, Arc<dyn PlotBuilder>)>,
}

impl PlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `builder` under `name`. Each name has exactly one builder.
    pub fn register(&mut self, name: PlotName, builder: Arc<dyn PlotBuilder>) -> Result<()> {
        if self.contains(&name) {
            return Err(CacheError::DuplicatePlot { name });
        }
        self.builders.push((name, builder));
        Ok(())
    }

    pub fn get(&self, name: &PlotName) -> Option<&Arc<dyn PlotBuilder>> {
        self.builders.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn contains(&self, name: &PlotName) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &PlotName> {
        self.builders.iter().map(|(n, _)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlotName, &Arc<dyn PlotBuilder>)> {
        self.builders.iter().map(|(n, b)| (n, b))
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prenight_plots::{Figure, PlotError};

    struct Nothing;

    impl PlotBuilder for Nothing {
        fn build(&self, _name: &PlotName) -> std::result::Result<Figure, PlotError> {
            Err(PlotError::Empty("nothing".to_string()))
        }
    }

    #[test]
    fn names_keep_registration_order() {
        let mut registry = PlotRegistry::new();
        for name in PlotName::dashboard() {
            registry.register(name, Arc::new(Nothing)).unwrap();
        }
        let names: Vec<_> = registry.names().map(|n| n.as_str()).collect();
        assert_eq!(names, ["night_reward", "footprint", "visit"]);
        assert!(registry.contains(&PlotName::visit()));
        assert!(registry.get(&PlotName::new("airmass")).is_none());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = PlotRegistry::new();
        registry.register(PlotName::footprint(), Arc::new(Nothing)).unwrap();
        let err = registry
            .register(PlotName::footprint(), Arc::new(Nothing))
            .unwrap_err();
        assert!(matches!(err, CacheError::DuplicatePlot { name } if name == PlotName::footprint()));
        assert_eq!(registry.len(), 1);
    }
}
