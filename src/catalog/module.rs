use super::Catalog;
use crate::composable::Export;
use crate::descriptor::ClassDescriptor;
use crate::error::Result;

/// A named group of classes, listed explicitly by its author.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    classes: Vec<ClassDescriptor>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
        }
    }

    /// Append `T` to the module's class list.
    pub fn with<T: Export>(mut self) -> Self {
        self.classes.push(ClassDescriptor::of::<T>());
        self
    }

    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(class);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }
}

/// Catalog over the classes of one [`Module`], in listing order.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    module: Module,
}

impl ModuleCatalog {
    pub fn new(module: Module) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }
}

impl Catalog for ModuleCatalog {
    fn list_classes_sync(&self) -> Result<Vec<ClassDescriptor>> {
        Ok(self.module.classes.clone())
    }

    fn describe(&self) -> String {
        format!("module:{}", self.module.name)
    }
}

impl From<Module> for ModuleCatalog {
    fn from(module: Module) -> Self {
        Self::new(module)
    }
}
