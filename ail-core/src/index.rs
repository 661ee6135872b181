#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::types::Type;

/// A resolved type declaration. Field and payload types may mention the
/// declaration's own parameters as `Type::Param`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDef {
    pub module: String,
    pub name: String,
    pub params: Vec<String>,
    pub shape: TypeShape,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeShape {
    Product(Vec<FieldSig>),
    Sum(Vec<VariantSig>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSig {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariantSig {
    pub name: String,
    pub payload: Vec<Type>,
}

impl TypeDef {
    pub fn is_sum(&self) -> bool {
        matches!(self.shape, TypeShape::Sum(_))
    }

    pub fn variants(&self) -> &[VariantSig] {
        match &self.shape {
            TypeShape::Sum(v) => v,
            TypeShape::Product(_) => &[],
        }
    }

    pub fn fields(&self) -> &[FieldSig] {
        match &self.shape {
            TypeShape::Product(f) => f,
            TypeShape::Sum(_) => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSig> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// The declared type applied to `args`.
    pub fn instance(&self, args: Vec<Type>) -> Type {
        Type::named(self.module.clone(), self.name.clone(), args)
    }

    /// True when `ty` is an instance of this declaration.
    pub fn describes(&self, ty: &Type) -> bool {
        matches!(ty, Type::Named { module, name, .. } if *module == self.module && *name == self.name)
    }

    /// Parameter substitution for an instance of this declaration.
    pub fn substitution(&self, ty: &Type) -> HashMap<String, Type> {
        let Type::Named { args, .. } = ty else {
            return HashMap::new();
        };
        self.params.iter().cloned().zip(args.iter().cloned()).collect()
    }

    /// Payload types of variant `index` for the instance `ty`.
    pub fn payload_of(&self, index: usize, ty: &Type) -> Vec<Type> {
        let subst = self.substitution(ty);
        self.variants()
            .get(index)
            .map(|v| v.payload.iter().map(|t| t.substitute(&subst)).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FnSig {
    pub module: String,
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub ret: Type,
}

/// An item another unit can import.
#[derive(Clone, Debug, PartialEq)]
pub enum Export {
    Type(Arc<TypeDef>),
    Function(Arc<FnSig>),
}

/// The public surface of one module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModuleExports {
    pub module: String,
    pub types: BTreeMap<String, Arc<TypeDef>>,
    pub functions: BTreeMap<String, Arc<FnSig>>,
}

impl ModuleExports {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    pub fn lookup(&self, item: &str) -> Option<Export> {
        if let Some(def) = self.types.get(item) {
            return Some(Export::Type(def.clone()));
        }
        self.functions.get(item).cloned().map(Export::Function)
    }
}

/// Read-only view of every module checked so far.
#[derive(Clone, Debug, Default)]
pub struct ModuleIndex {
    modules: HashMap<String, Arc<ModuleExports>>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module. The first registration of a name wins.
    pub fn insert(&mut self, exports: ModuleExports) {
        self.modules
            .entry(exports.module.clone())
            .or_insert_with(|| Arc::new(exports));
    }

    pub fn get(&self, module: &str) -> Option<&ModuleExports> {
        self.modules.get(module).map(Arc::as_ref)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn type_def(&self, module: &str, name: &str) -> Option<Arc<TypeDef>> {
        self.get(module)?.types.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
