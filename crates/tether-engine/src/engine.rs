//! Engine: owns the remap table, resolver, generator and binding cache

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::binding::{Binding, BindingCache, BuildMode, Implementation};
use crate::codegen::{AccessorGenerator, ClosureGenerator, GenerationRequest};
use crate::config::{EngineConfig, GenerationMode};
use crate::convert::{Assignability, BasicConverter, Converter, StandardAssignability};
use crate::error::{BindError, BindResult};
use crate::fallback::FallbackInvoker;
use crate::remap::{self, ClassRemap, RemapEntry, RemapResult, RemapSourceError, RemapTable, RemapTableBuilder};
use crate::resolver::{ResolvedMember, Resolver};
use crate::runtime::{ClassLoader, RuntimeClass};
use crate::template::{self, TemplateDescriptor, TemplateSyntaxError};

/// Builder for [`Engine`]
pub struct EngineBuilder {
    config: EngineConfig,
    remaps: RemapTableBuilder,
    converter: Option<Arc<dyn Converter>>,
    assignability: Option<Arc<dyn Assignability>>,
    generator: Option<Arc<dyn AccessorGenerator>>,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            remaps: RemapTableBuilder::new(),
            converter: None,
            assignability: None,
            generator: None,
        }
    }

    /// Use the given configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register one remap entry
    pub fn remap(mut self, entry: RemapEntry) -> RemapResult<Self> {
        self.remaps.register(entry)?;
        Ok(self)
    }

    /// Register several remap entries
    pub fn remap_entries(mut self, entries: impl IntoIterator<Item = RemapEntry>) -> RemapResult<Self> {
        self.remaps.register_all(entries)?;
        Ok(self)
    }

    /// Register a class path rename
    pub fn class_remap(mut self, entry: ClassRemap) -> RemapResult<Self> {
        self.remaps.register_class(entry)?;
        Ok(self)
    }

    /// Register every entry of a TOML remap file
    pub fn remap_file(mut self, path: &Path) -> Result<Self, RemapSourceError> {
        let document = remap::load_file(path)?;
        self.remaps.register_all(document.entries)?;
        self.remaps.register_classes(document.classes)?;
        Ok(self)
    }

    /// Replace the conversion boundary
    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Replace the assignability predicate (overrides the configured mode)
    pub fn assignability(mut self, assignability: Arc<dyn Assignability>) -> Self {
        self.assignability = Some(assignability);
        self
    }

    /// Replace the accessor generator
    pub fn generator(mut self, generator: Arc<dyn AccessorGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        let converter = self
            .converter
            .unwrap_or_else(|| Arc::new(BasicConverter::new()));
        let assignability = self.assignability.unwrap_or_else(|| {
            Arc::new(StandardAssignability::new(
                self.config.binding.assignability,
                converter.clone(),
            ))
        });
        let generator = self.generator.unwrap_or_else(|| Arc::new(ClosureGenerator::new()));
        let remaps = Arc::new(self.remaps.build());

        tracing::debug!(
            remaps = remaps.len(),
            generation = %self.config.binding.generation,
            assignability = %self.config.binding.assignability,
            "engine created"
        );

        Engine {
            resolver: Resolver::new(remaps.clone(), assignability),
            remaps,
            converter,
            generator,
            cache: BindingCache::new(),
            config: self.config,
        }
    }
}

/// Parses templates and binds them to loaded classes
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new();
/// let point = engine.parse_template("template Point { int getX(); }")?;
/// let binding = engine.bind(&point, &class)?;
/// let x = binding.invoke(0, &instance, &[])?;
/// ```
pub struct Engine {
    config: EngineConfig,
    remaps: Arc<RemapTable>,
    resolver: Resolver,
    converter: Arc<dyn Converter>,
    generator: Arc<dyn AccessorGenerator>,
    cache: BindingCache,
}

impl Engine {
    /// Engine with default configuration and no remaps
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with the given configuration and no remaps
    pub fn with_config(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Remap table
    pub fn remaps(&self) -> &RemapTable {
        &self.remaps
    }

    /// Binding cache
    pub fn cache(&self) -> &BindingCache {
        &self.cache
    }

    /// Parse template text into a shareable descriptor
    pub fn parse_template(&self, text: &str) -> Result<Arc<TemplateDescriptor>, TemplateSyntaxError> {
        template::parse_template(text).map(Arc::new)
    }

    /// Bind a template to a class, reusing the memoized binding when one
    /// exists
    pub fn bind(&self, descriptor: &Arc<TemplateDescriptor>, class: &Arc<RuntimeClass>) -> BindResult<Arc<Binding>> {
        if class.loader().is_some_and(|loader| loader.is_unloaded()) {
            return Err(BindError::TargetUnloaded {
                target: class.name().to_string(),
            });
        }
        self.cache
            .get_or_create(descriptor, class, |mode| self.build_binding(descriptor, class, mode))
    }

    /// Bind a template to the class its name denotes in `loader`
    ///
    /// The template name is the class path at the template's `@since`
    /// release; class renames carry it to the loader's release first.
    pub fn bind_named(&self, descriptor: &Arc<TemplateDescriptor>, loader: &ClassLoader) -> BindResult<Arc<Binding>> {
        let path: Arc<str> = self
            .remaps
            .lookup_class(descriptor.name(), descriptor.since(), loader.version())
            .map_err(|source| BindError::Remap {
                template: descriptor.name().to_string(),
                member: descriptor.name().to_string(),
                source,
            })?
            .unwrap_or_else(|| Arc::from(descriptor.name()));
        if &*path != descriptor.name() {
            tracing::debug!(template = descriptor.name(), path = &*path, "class path remapped");
        }

        let class = loader.find_class(&path).ok_or_else(|| BindError::TypeNotFound {
            template: descriptor.name().to_string(),
            name: path.to_string(),
            loader: loader.name().to_string(),
        })?;
        self.bind(descriptor, &class)
    }

    fn build_binding(
        &self,
        descriptor: &Arc<TemplateDescriptor>,
        class: &Arc<RuntimeClass>,
        mode: BuildMode,
    ) -> BindResult<Binding> {
        let members: Arc<[ResolvedMember]> = self.resolver.resolve(descriptor, class)?.into();
        let binding = &self.config.binding;

        let generate = mode == BuildMode::Memoized && binding.generation == GenerationMode::Enabled;
        let implementation = if generate {
            let request = GenerationRequest {
                descriptor: descriptor.as_ref(),
                target: class,
                members: &members[..],
                converter: &self.converter,
                max_arity: binding.max_generated_arity,
            };
            match self.generator.generate(&request) {
                Ok(generated) => Implementation::Generated(generated),
                Err(failure) if binding.fallback => {
                    if binding.log_fallbacks {
                        tracing::warn!(
                            template = descriptor.name(),
                            target = class.name(),
                            error = %failure,
                            "accessor generation failed, using reflective fallback"
                        );
                    }
                    self.fallback(class)
                }
                Err(failure) => {
                    return Err(BindError::BindingUnavailable {
                        template: descriptor.name().to_string(),
                        target: class.name().to_string(),
                        source: failure,
                    })
                }
            }
        } else {
            self.fallback(class)
        };

        Ok(Binding::new(descriptor.clone(), class, members, implementation))
    }

    fn fallback(&self, class: &Arc<RuntimeClass>) -> Implementation {
        Implementation::Fallback(FallbackInvoker::new(class, self.converter.clone()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("remaps", &self.remaps.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}
