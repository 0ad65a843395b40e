use crate::{container::Container, errors::BuildError, module::Module};

/// Configuration errors a container tolerates
///
/// A tolerated error is logged when the container is created and surfaces again when a
/// request actually runs into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Required dependencies nothing matches
    pub ignore_missing: bool,
    /// Single dependencies several components match
    pub ignore_uncertain: bool,
    /// Components which (transitively) need themselves
    pub ignore_cycle: bool,
}

/// Builds a [Container] from a [Module]
///
/// ```rust
/// use wrapp_ioc::{Container, Module, Provider};
///
/// let container = Container::builder(Module::new("app").provide(Provider::constant(8080_u16)))
///     .ignore_uncertain()
///     .build()
///     .unwrap();
/// assert_eq!(*container.value_of::<u16>().execute().unwrap(), 8080);
/// ```
#[derive(Debug)]
pub struct ContainerBuilder {
    module: Module,
    options: ContainerOptions,
}

impl ContainerBuilder {
    pub fn new(module: Module) -> Self {
        ContainerBuilder {
            module,
            options: ContainerOptions::default(),
        }
    }

    pub fn ignore_missing(mut self) -> Self {
        self.options.ignore_missing = true;
        self
    }

    pub fn ignore_uncertain(mut self) -> Self {
        self.options.ignore_uncertain = true;
        self
    }

    pub fn ignore_cycle(mut self) -> Self {
        self.options.ignore_cycle = true;
        self
    }

    pub fn options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Container, BuildError> {
        Container::new(&self.module, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_chain() {
        let builder = ContainerBuilder::new(Module::new("test"))
            .ignore_missing()
            .ignore_cycle();

        assert_eq!(
            builder.options,
            ContainerOptions {
                ignore_missing: true,
                ignore_uncertain: false,
                ignore_cycle: true,
            }
        );
        assert_eq!(
            builder.options(ContainerOptions::default()).options,
            ContainerOptions::default()
        );
    }
}
