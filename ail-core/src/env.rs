#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ail_ast::{Decl, Ident, Program, Shape, Span, TypeDecl, TypeRef, UseDecl};

use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::index::{
    Export, FieldSig, FnSig, ModuleExports, ModuleIndex, TypeDef, TypeShape, VariantSig,
};
use crate::types::{Prim, Type};

/// A unit-level name: something declared at top level or imported.
#[derive(Clone, Debug)]
pub enum Item {
    Type(Arc<TypeDef>),
    Function(Arc<FnSig>),
    Variant { def: Arc<TypeDef>, index: usize },
    Test,
}

#[derive(Clone, Debug)]
struct ImportEntry {
    path: String,
    item: Item,
}

/// Module name, imports and top-level items of one unit.
pub struct UnitEnv<'a> {
    index: &'a ModuleIndex,
    /// Declared module name, empty for a unit without `module`.
    pub module: String,
    pub declared_module: Option<String>,
    items: HashMap<String, Item>,
    imports: HashMap<String, ImportEntry>,
    /// Variants of imported types, keyed by variant name. Two imported types
    /// may share a variant name; the name is then ambiguous at use.
    variants: HashMap<String, Vec<ImportEntry>>,
    /// Name to (module, arity) for every type visible in the unit.
    type_heads: HashMap<String, (String, usize)>,
    local_types: BTreeMap<String, Arc<TypeDef>>,
    local_fns: BTreeMap<String, Arc<FnSig>>,
}

impl<'a> UnitEnv<'a> {
    pub fn collect(program: &Program, index: &'a ModuleIndex, diags: &mut Diagnostics) -> Self {
        let mut env = Self {
            index,
            module: String::new(),
            declared_module: None,
            items: HashMap::new(),
            imports: HashMap::new(),
            variants: HashMap::new(),
            type_heads: HashMap::new(),
            local_types: BTreeMap::new(),
            local_fns: BTreeMap::new(),
        };

        env.collect_module(program, diags);
        for decl in &program.decls {
            if let Decl::Use(u) = decl {
                env.collect_import(u, diags);
            }
        }

        let owned = env.claim_names(program, diags);
        env.collect_types(program, &owned, diags);
        env.collect_functions(program, &owned, diags);
        env
    }

    fn collect_module(&mut self, program: &Program, diags: &mut Diagnostics) {
        for decl in &program.decls {
            let Decl::Module(m) = decl else { continue };
            if let Some(first) = &self.declared_module {
                diags.push(Diagnostic::new(
                    ErrorKind::DuplicateModule,
                    format!("module already declared as `{first}`"),
                    m.span,
                ));
                continue;
            }
            self.module = m.name();
            self.declared_module = Some(m.name());
        }
    }

    fn collect_import(&mut self, u: &UseDecl, diags: &mut Diagnostics) {
        let full = u.full_path();
        let module = u.module_path();
        let Some(item_name) = u.item().filter(|_| !module.is_empty()) else {
            diags.push(Diagnostic::new(
                ErrorKind::UnresolvedImport,
                format!("`use {full}` must name an item of a module"),
                u.span,
            ));
            return;
        };

        if self.declared_module.as_deref() == Some(module.as_str()) {
            diags.push(Diagnostic::new(
                ErrorKind::CyclicImport,
                format!("module `{module}` imports from itself"),
                u.span,
            ));
            return;
        }

        let Some(exports) = self.index.get(&module) else {
            diags.push(Diagnostic::new(
                ErrorKind::UnresolvedImport,
                format!("unknown module `{module}`"),
                u.span,
            ));
            return;
        };
        let Some(export) = exports.lookup(&item_name.node) else {
            diags.push(Diagnostic::new(
                ErrorKind::UnresolvedImport,
                format!("module `{module}` has no item `{}`", item_name.node),
                u.span,
            ));
            return;
        };

        match export {
            Export::Function(sig) => {
                self.insert_import(&item_name.node, &full, Item::Function(sig), u.span, diags);
            }
            Export::Type(def) => {
                for (index, v) in def.variants().iter().enumerate() {
                    let entries = self.variants.entry(v.name.clone()).or_default();
                    if entries.iter().all(|e| e.path != full) {
                        entries.push(ImportEntry {
                            path: full.clone(),
                            item: Item::Variant {
                                def: def.clone(),
                                index,
                            },
                        });
                    }
                }
                self.insert_import(&item_name.node, &full, Item::Type(def), u.span, diags);
            }
        }
    }

    fn insert_import(
        &mut self,
        name: &str,
        path: &str,
        item: Item,
        span: Span,
        diags: &mut Diagnostics,
    ) {
        if let Some(existing) = self.imports.get(name) {
            if existing.path != path {
                diags.push(Diagnostic::new(
                    ErrorKind::ImportNameCollision,
                    format!(
                        "`{name}` is imported from both `{}` and `{path}`",
                        existing.path
                    ),
                    span,
                ));
            }
            return;
        }
        if let Item::Type(def) = &item {
            self.type_heads
                .insert(name.to_string(), (def.module.clone(), def.params.len()));
        }
        self.imports.insert(
            name.to_string(),
            ImportEntry {
                path: path.to_string(),
                item,
            },
        );
    }

    /// Reserves every top-level name; returns the indices of declarations
    /// that own their name. Repeats are `DuplicateBinding`.
    fn claim_names(&mut self, program: &Program, diags: &mut Diagnostics) -> Vec<bool> {
        let mut seen: HashMap<&str, Span> = HashMap::new();
        let mut owned = Vec::with_capacity(program.decls.len());
        for decl in &program.decls {
            let ok = match decl {
                Decl::Type(t) => {
                    let mut ok = claim(&mut seen, &t.name, diags);
                    if let Shape::Sum(variants) = &t.shape {
                        for v in variants {
                            ok &= claim(&mut seen, &v.name, diags);
                        }
                    }
                    if ok {
                        self.type_heads
                            .insert(t.name.node.clone(), (self.module.clone(), t.params.len()));
                    }
                    ok
                }
                Decl::Fn(f) => claim(&mut seen, &f.name, diags),
                Decl::Test(t) => {
                    let ok = claim(&mut seen, &t.name, diags);
                    if ok {
                        self.items.insert(t.name.node.clone(), Item::Test);
                    }
                    ok
                }
                Decl::Module(_) | Decl::Use(_) => true,
            };
            owned.push(ok);
        }
        owned
    }

    fn collect_types(&mut self, program: &Program, owned: &[bool], diags: &mut Diagnostics) {
        for (decl, &ok) in program.decls.iter().zip(owned) {
            let Decl::Type(t) = decl else { continue };
            if !ok {
                continue;
            }
            let def = Arc::new(self.lower_type_decl(t, diags));
            for (index, v) in def.variants().iter().enumerate() {
                self.items.insert(
                    v.name.clone(),
                    Item::Variant {
                        def: def.clone(),
                        index,
                    },
                );
            }
            self.items.insert(def.name.clone(), Item::Type(def.clone()));
            self.local_types.insert(def.name.clone(), def);
        }
    }

    fn lower_type_decl(&self, t: &TypeDecl, diags: &mut Diagnostics) -> TypeDef {
        let decl = Some(t.name.node.as_str());
        let mut params: Vec<String> = Vec::new();
        for p in &t.params {
            if params.contains(&p.node) {
                diags.push(
                    Diagnostic::new(
                        ErrorKind::DuplicateBinding,
                        format!("duplicate type parameter `{}`", p.node),
                        p.span,
                    )
                    .in_decl(decl),
                );
                continue;
            }
            params.push(p.node.clone());
        }

        let lower = |tr: &TypeRef, diags: &mut Diagnostics| {
            self.resolve_type_ref(tr, &params).unwrap_or_else(|d| {
                diags.push(d.in_decl(decl));
                Type::Error
            })
        };

        let shape = match &t.shape {
            Shape::Product(fields) => {
                let mut out: Vec<FieldSig> = Vec::new();
                for f in fields {
                    let ty = lower(&f.ty, diags);
                    if out.iter().any(|o| o.name == f.name.node) {
                        diags.push(
                            Diagnostic::new(
                                ErrorKind::DuplicateBinding,
                                format!("duplicate field `{}`", f.name.node),
                                f.name.span,
                            )
                            .in_decl(decl),
                        );
                        continue;
                    }
                    out.push(FieldSig {
                        name: f.name.node.clone(),
                        ty,
                    });
                }
                TypeShape::Product(out)
            }
            Shape::Sum(variants) => TypeShape::Sum(
                variants
                    .iter()
                    .map(|v| VariantSig {
                        name: v.name.node.clone(),
                        payload: v.payload.iter().map(|tr| lower(tr, diags)).collect(),
                    })
                    .collect(),
            ),
        };

        TypeDef {
            module: self.module.clone(),
            name: t.name.node.clone(),
            params,
            shape,
        }
    }

    fn collect_functions(&mut self, program: &Program, owned: &[bool], diags: &mut Diagnostics) {
        for (decl, &ok) in program.decls.iter().zip(owned) {
            let Decl::Fn(f) = decl else { continue };
            if !ok {
                continue;
            }
            let decl_name = Some(f.name.node.as_str());
            let lower = |tr: &TypeRef, diags: &mut Diagnostics| {
                self.resolve_type_ref(tr, &[]).unwrap_or_else(|d| {
                    diags.push(d.in_decl(decl_name));
                    Type::Error
                })
            };
            let params = f
                .params
                .iter()
                .map(|p| (p.name.node.clone(), lower(&p.ty, diags)))
                .collect();
            let ret = lower(&f.ret, diags);
            let sig = Arc::new(FnSig {
                module: self.module.clone(),
                name: f.name.node.clone(),
                params,
                ret,
            });
            self.items
                .insert(sig.name.clone(), Item::Function(sig.clone()));
            self.local_fns.insert(sig.name.clone(), sig);
        }
    }

    /// Local items shadow imports. An imported variant name shared by two
    /// imported types resolves to nothing.
    pub fn lookup(&self, name: &str) -> Option<&Item> {
        self.items
            .get(name)
            .or_else(|| self.imports.get(name).map(|e| &e.item))
            .or_else(|| match self.variants.get(name).map(Vec::as_slice) {
                Some([only]) => Some(&only.item),
                _ => None,
            })
    }

    /// Paths of the imported types that all provide variant `name`, when
    /// there is more than one and nothing shadows them.
    pub fn ambiguous_variant(&self, name: &str) -> Option<Vec<&str>> {
        if self.items.contains_key(name) || self.imports.contains_key(name) {
            return None;
        }
        let entries = self.variants.get(name).filter(|e| e.len() > 1)?;
        Some(entries.iter().map(|e| e.path.as_str()).collect())
    }

    pub fn function(&self, name: &str) -> Option<Arc<FnSig>> {
        match self.items.get(name) {
            Some(Item::Function(sig)) => Some(sig.clone()),
            _ => None,
        }
    }

    /// Finds the declaration behind a `Named` type, local or imported.
    pub fn type_def(&self, ty: &Type) -> Option<Arc<TypeDef>> {
        let Type::Named { module, name, .. } = ty else {
            return None;
        };
        if *module == self.module {
            return self.local_types.get(name).cloned();
        }
        self.index.type_def(module, name)
    }

    /// Resolves a written type; `params` are the type parameters in scope.
    pub fn resolve_type_ref(&self, tr: &TypeRef, params: &[String]) -> Result<Type, Diagnostic> {
        let name = tr.name.node.as_str();
        let leaf = Prim::from_name(name)
            .map(Type::Primitive)
            .or_else(|| params.contains(&tr.name.node).then(|| Type::Param(name.to_string())));
        if let Some(ty) = leaf {
            if !tr.args.is_empty() {
                return Err(Diagnostic::new(
                    ErrorKind::ArityMismatch,
                    format!("`{name}` takes no type arguments"),
                    tr.span,
                ));
            }
            return Ok(ty);
        }

        let Some((module, arity)) = self.type_heads.get(name) else {
            let message = match self.lookup(name) {
                Some(_) => format!("`{name}` is not a type"),
                None => format!("unknown type `{name}`"),
            };
            return Err(Diagnostic::new(ErrorKind::UnknownType, message, tr.name.span));
        };

        if tr.args.len() != *arity {
            return Err(Diagnostic::new(
                ErrorKind::ArityMismatch,
                format!(
                    "`{name}` expects {arity} type argument(s), found {}",
                    tr.args.len()
                ),
                tr.span,
            ));
        }

        let args = tr
            .args
            .iter()
            .map(|a| self.resolve_type_ref(a, params))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Type::named(module.clone(), name, args))
    }

    /// Best-effort public surface; available even when the unit has errors.
    pub fn exports(&self) -> Option<ModuleExports> {
        let module = self.declared_module.clone()?;
        Some(ModuleExports {
            module,
            types: self.local_types.clone(),
            functions: self.local_fns.clone(),
        })
    }
}

fn claim<'p>(seen: &mut HashMap<&'p str, Span>, name: &'p Ident, diags: &mut Diagnostics) -> bool {
    if seen.contains_key(name.node.as_str()) {
        diags.push(
            Diagnostic::new(
                ErrorKind::DuplicateBinding,
                format!("`{}` is already declared in this unit", name.node),
                name.span,
            )
            .in_decl(Some(&name.node)),
        );
        return false;
    }
    seen.insert(name.node.as_str(), name.span);
    true
}
