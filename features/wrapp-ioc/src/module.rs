use crate::provider::Provider;

/// A declarative set of providers
///
/// Modules compose: an included module contributes all of its providers,
/// after the providers registered directly on the including module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    providers: Vec<Provider>,
    includes: Vec<Module>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn provide(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn include(mut self, module: Module) -> Self {
        self.includes.push(module);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All providers of this module and its includes, in declaration order
    pub fn providers(&self) -> Vec<&Provider> {
        let mut providers: Vec<&Provider> = self.providers.iter().collect();
        for module in &self.includes {
            providers.extend(module.providers());
        }
        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_are_flattened_in_order() {
        let inner = Module::new("inner").provide(Provider::constant(2_u8));
        let outer = Module::new("outer")
            .provide(Provider::constant(1_u8))
            .include(inner)
            .provide(Provider::constant(3_u8));

        let values: Vec<_> = outer
            .providers()
            .into_iter()
            .map(|p| *p.invoke(&crate::value::Args::new(vec![])).unwrap()[0].downcast::<u8>().unwrap())
            .collect();
        assert_eq!(values, vec![1, 3, 2]);
        assert_eq!(outer.name(), "outer");
    }
}
