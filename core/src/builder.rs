//! RegistryBuilder for declaring value-object classes.

use crate::attr::{parse_alias_path, AttrDef, AttrSpec};
use crate::call::Call;
use crate::class::{ClassDef, PostInit, ANY_ATTR};
use crate::error::{MutationResult, SchemaError, SchemaResult};
use crate::methods::{MethodTable, UserMethod};
use crate::naming;
use crate::object::Object;
use crate::options::{ClassOptions, KeyOption};
use crate::registry::Registry;
use crate::types::{CollectionKind, TypeExpr};
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Builder for constructing an immutable Registry.
///
/// Classes must be declared after their parents; attribute types may refer
/// to classes declared later.
#[derive(Default)]
pub struct RegistryBuilder {
    /// Classes in declaration order.
    decls: Vec<ClassDecl>,
    /// Class name to declaration index.
    names: HashMap<String, usize>,
}

/// A class as declared, before resolution.
struct ClassDecl {
    name: String,
    parents: Vec<String>,
    attrs: Vec<AttrDef>,
    options: ClassOptions,
    methods: HashMap<String, UserMethod>,
    post_init: Option<PostInit>,
}

/// A class with inheritance applied but derived attribute fields still empty.
struct Resolved {
    name: String,
    parents: Vec<String>,
    mro: Vec<String>,
    attrs: Vec<AttrSpec>,
    key: Option<String>,
    frozen: bool,
    do_not_copy: bool,
    init_overflow_attr: Option<String>,
    methods: HashMap<String, UserMethod>,
    post_init: Option<PostInit>,
}

impl RegistryBuilder {
    /// Create a new registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a class.
    pub fn add_class(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder {
            builder: self,
            decl: ClassDecl {
                name: name.into(),
                parents: Vec::new(),
                attrs: Vec::new(),
                options: ClassOptions::default(),
                methods: HashMap::new(),
                post_init: None,
            },
        }
    }

    /// Build the immutable Registry.
    pub fn build(self) -> SchemaResult<Rc<Registry>> {
        // Pass 1: inheritance and options
        let mut resolved: Vec<Resolved> = Vec::with_capacity(self.decls.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for decl in self.decls {
            let class = resolve_inheritance(decl, &resolved, &index)?;
            index.insert(class.name.clone(), resolved.len());
            resolved.push(class);
        }

        // Pass 2: attribute derivations that may look at other classes
        let mut classes = HashMap::new();
        let mut order = Vec::with_capacity(resolved.len());
        for declared in &resolved {
            let class = finish_class(declared, &resolved, &index)?;
            debug!(
                class = %class.name,
                attrs = class.attrs.len(),
                methods = class.methods.len(),
                user_methods = class.methods.user_count(),
                "registered value-object class"
            );
            order.push(class.name.clone());
            classes.insert(class.name.clone(), Rc::new(class));
        }

        Ok(Rc::new(Registry::new(classes, order)))
    }
}

/// Builder for a class definition.
pub struct ClassBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    decl: ClassDecl,
}

impl<'a> ClassBuilder<'a> {
    /// Add a parent class (must already be declared).
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.decl.parents.push(parent.into());
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, attr: AttrDef) -> Self {
        self.decl.attrs.push(attr);
        self
    }

    /// Replace all class options.
    pub fn options(mut self, options: ClassOptions) -> Self {
        self.decl.options = options;
        self
    }

    /// Designate the key attribute.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.decl.options.key = KeyOption::Key(key.into());
        self
    }

    pub fn frozen(mut self) -> Self {
        self.decl.options.frozen = Some(true);
        self
    }

    pub fn init_overflow_attr(mut self, name: impl Into<String>) -> Self {
        self.decl.options.init_overflow_attr = Some(name.into());
        self
    }

    /// Register a hand-written method; a generated method of the same name is skipped.
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Object, Call) -> MutationResult<Value> + 'static,
    ) -> Self {
        self.decl.methods.insert(name.into(), Rc::new(f));
        self
    }

    /// Hook run at the end of construction.
    pub fn post_init(mut self, f: impl Fn(&Object) -> MutationResult<()> + 'static) -> Self {
        self.decl.post_init = Some(Rc::new(f));
        self
    }

    /// Finish the class definition.
    pub fn done(self) -> SchemaResult<()> {
        let decl = self.decl;

        // Check for duplicate name
        if self.builder.names.contains_key(&decl.name) {
            return Err(SchemaError::DuplicateClass(decl.name));
        }

        for parent in &decl.parents {
            if !self.builder.names.contains_key(parent) {
                return Err(SchemaError::UnknownParent(parent.clone()));
            }
        }

        for attr in &decl.attrs {
            if attr.default.is_some() && attr.default_factory.is_some() {
                return Err(SchemaError::ConflictingDefaults {
                    attr: format!("{}.{}", decl.name, attr.name),
                });
            }
            if attr.alias.is_some() && attr.property.is_some() {
                return Err(SchemaError::ConflictingAlias {
                    attr: format!("{}.{}", decl.name, attr.name),
                });
            }
        }

        let private = decl
            .options
            .attrs
            .iter()
            .flatten()
            .chain(decl.options.attrs_typed.iter().map(|(name, _)| name))
            .find(|name| name.starts_with('_'));
        if let Some(name) = private {
            return Err(SchemaError::PrivateAttribute {
                attr: format!("{}.{}", decl.name, name),
            });
        }

        self.builder
            .names
            .insert(decl.name.clone(), self.builder.decls.len());
        self.builder.decls.push(decl);
        Ok(())
    }
}

// ==================== Resolution ====================

fn resolve_inheritance(
    decl: ClassDecl,
    resolved: &[Resolved],
    index: &HashMap<String, usize>,
) -> SchemaResult<Resolved> {
    let parents: Vec<&Resolved> = decl
        .parents
        .iter()
        .map(|p| {
            index
                .get(p)
                .map(|&i| &resolved[i])
                .ok_or_else(|| SchemaError::UnknownParent(p.clone()))
        })
        .collect::<SchemaResult<_>>()?;

    let mut mro = vec![decl.name.clone()];
    for parent in &parents {
        for ancestor in &parent.mro {
            if !mro.contains(ancestor) {
                mro.push(ancestor.clone());
            }
        }
    }

    // Inherited attributes keep their position; redeclaration changes the owner
    let mut attrs: Vec<AttrSpec> = Vec::new();
    for parent in &parents {
        for attr in &parent.attrs {
            if !attrs.iter().any(|a| a.name == attr.name) {
                attrs.push(attr.clone());
            }
        }
    }
    for def in decl.attrs {
        let mut spec = AttrSpec::from_def(def, &decl.name);
        spec.managed = !spec.name.starts_with('_');
        upsert_attr(&mut attrs, spec);
    }

    let options = decl.options;
    for (name, ty) in options.attrs_typed {
        match attrs.iter_mut().find(|a| a.name == name) {
            Some(spec) => retype(spec, ty),
            None => attrs.push(AttrSpec::from_def(AttrDef::new(name, ty), &decl.name)),
        }
    }

    if let Some(managed) = &options.attrs {
        for name in managed {
            if !attrs.iter().any(|a| &a.name == name) {
                return Err(SchemaError::UnknownManagedAttribute {
                    class: decl.name.clone(),
                    attr: name.clone(),
                });
            }
        }
        for attr in attrs.iter_mut() {
            attr.managed = managed.contains(&attr.name);
        }
    }
    for name in &options.attrs_skip {
        match attrs.iter_mut().find(|a| &a.name == name) {
            Some(attr) => attr.managed = false,
            None => {
                return Err(SchemaError::UnknownManagedAttribute {
                    class: decl.name.clone(),
                    attr: name.clone(),
                })
            }
        }
    }

    let do_not_copy = options
        .do_not_copy
        .unwrap_or_else(|| parents.iter().any(|p| p.do_not_copy));
    for attr in attrs.iter_mut() {
        if do_not_copy || options.do_not_copy_attrs.contains(&attr.name) {
            attr.do_not_copy = true;
        }
    }

    let key = match options.key {
        KeyOption::Key(key) => Some(key),
        KeyOption::NoKey => None,
        KeyOption::Inherit => parents.iter().find_map(|p| p.key.clone()),
    };
    let frozen = options
        .frozen
        .unwrap_or_else(|| parents.iter().any(|p| p.frozen));
    let init_overflow_attr = options
        .init_overflow_attr
        .or_else(|| parents.iter().find_map(|p| p.init_overflow_attr.clone()));

    let mut methods: HashMap<String, UserMethod> = HashMap::new();
    for parent in parents.iter().rev() {
        methods.extend(parent.methods.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    methods.extend(decl.methods);

    let post_init = decl
        .post_init
        .or_else(|| parents.iter().find_map(|p| p.post_init.clone()));

    Ok(Resolved {
        name: decl.name,
        parents: decl.parents,
        mro,
        attrs,
        key,
        frozen,
        do_not_copy,
        init_overflow_attr,
        methods,
        post_init,
    })
}

fn upsert_attr(attrs: &mut Vec<AttrSpec>, spec: AttrSpec) {
    match attrs.iter_mut().find(|a| a.name == spec.name) {
        Some(existing) => *existing = spec,
        None => attrs.push(spec),
    }
}

fn retype(spec: &mut AttrSpec, ty: TypeExpr) {
    spec.collection = ty.collection_kind();
    spec.item_type = spec.collection.map(|_| ty.item_type());
    spec.ty = ty;
}

fn finish_class(
    class: &Resolved,
    resolved: &[Resolved],
    index: &HashMap<String, usize>,
) -> SchemaResult<ClassDef> {
    let mut attrs = class.attrs.clone();

    if let Some(overflow) = &class.init_overflow_attr {
        match attrs.iter().find(|a| &a.name == overflow) {
            Some(attr) if attr.collection != Some(CollectionKind::Mapping) => {
                return Err(SchemaError::InvalidOverflowAttribute {
                    class: class.name.clone(),
                    attr: overflow.clone(),
                });
            }
            Some(_) => {}
            None => {
                let def = AttrDef::new(overflow.clone(), TypeExpr::map(TypeExpr::Str, TypeExpr::Any))
                    .default_factory(|| Value::Map(Default::default()))
                    .no_init();
                attrs.push(AttrSpec::from_def(def, &class.name));
            }
        }
    }

    let names: Vec<String> = attrs.iter().map(|a| a.name.clone()).collect();
    let taken: Vec<&str> = names.iter().map(String::as_str).collect();
    let lookup = |name: &str| index.get(name).map(|&i| &resolved[i]);

    for attr in attrs.iter_mut() {
        let qualified = attr.qualified(&class.name);

        for referenced in attr.ty.referenced_classes() {
            if lookup(referenced).is_none() {
                return Err(SchemaError::UnknownClassReference {
                    attr: qualified,
                    class: referenced.to_string(),
                });
            }
        }

        attr.spec_type = attr.ty.value_object_class(true).map(str::to_string);
        if let Some(item_type) = &attr.item_type {
            attr.item_spec_type = item_type.value_object_class(true).map(str::to_string);
        }
        if let Some(item_class) = attr.item_spec_type.as_deref().and_then(lookup) {
            if let Some(key) = &item_class.key {
                attr.key_type = item_class
                    .attrs
                    .iter()
                    .find(|a| &a.name == key)
                    .map(|a| a.ty.clone());
                attr.item_key_attr = Some(key.clone());
            }
        }

        check_collection_shape(attr, &qualified, &lookup)?;

        if attr.collection.is_some() && attr.item_name.is_none() {
            attr.item_name = Some(naming::item_name(&attr.name, &taken));
        }

        for trigger in &attr.invalidated_by {
            if trigger != ANY_ATTR && !taken.contains(&trigger.as_str()) {
                return Err(SchemaError::UnknownInvalidator {
                    attr: qualified.clone(),
                    trigger: trigger.clone(),
                });
            }
        }

        if let Some(alias) = attr.alias.as_mut() {
            alias.steps = parse_alias_path(&alias.path).ok_or_else(|| SchemaError::InvalidAliasPath {
                attr: qualified.clone(),
                path: alias.path.clone(),
            })?;
            if let Some(root) = alias.root().filter(|root| !taken.contains(root)) {
                return Err(SchemaError::UnknownAliasTarget {
                    attr: qualified,
                    target: root.to_string(),
                });
            }
        }
    }
    check_alias_cycles(&class.name, &attrs)?;

    if let Some(key) = &class.key {
        match attrs.iter().find(|a| &a.name == key) {
            None => {
                return Err(SchemaError::UnknownKeyAttribute {
                    class: class.name.clone(),
                    key: key.clone(),
                })
            }
            Some(attr) if !attr.init => {
                return Err(SchemaError::KeyNotInitializable {
                    class: class.name.clone(),
                    key: key.clone(),
                })
            }
            Some(_) => {}
        }
    }

    let mut invalidation: HashMap<String, Vec<String>> = HashMap::new();
    for attr in &attrs {
        for trigger in &attr.invalidated_by {
            invalidation
                .entry(trigger.clone())
                .or_default()
                .push(attr.name.clone());
        }
    }

    let methods = MethodTable::synthesize(&attrs, &class.methods);
    let attr_index = attrs
        .iter()
        .enumerate()
        .map(|(i, a)| (a.name.clone(), i))
        .collect();

    Ok(ClassDef {
        name: class.name.clone(),
        parents: class.parents.clone(),
        mro: class.mro.clone(),
        key: class.key.clone(),
        frozen: class.frozen,
        init_overflow_attr: class.init_overflow_attr.clone(),
        attrs,
        attr_index,
        invalidation,
        methods,
        post_init: class.post_init.clone(),
    })
}

/// Reject aliases whose chain of root attributes leads back to themselves.
fn check_alias_cycles(class_name: &str, attrs: &[AttrSpec]) -> SchemaResult<()> {
    for attr in attrs.iter().filter(|a| a.is_alias()) {
        let mut current = attr.name.as_str();
        for _ in 0..attrs.len() {
            match alias_root(attrs, current) {
                Some(next) if next == attr.name => {
                    return Err(SchemaError::CyclicAlias {
                        attr: attr.qualified(class_name),
                    });
                }
                Some(next) => current = next,
                None => break,
            }
        }
    }
    Ok(())
}

fn alias_root<'a>(attrs: &'a [AttrSpec], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name == name)
        .and_then(|a| a.alias.as_ref())
        .and_then(|alias| alias.root())
}

/// Reject collection declarations whose items cannot be located unambiguously.
fn check_collection_shape<'r>(
    attr: &AttrSpec,
    qualified: &str,
    lookup: &dyn Fn(&str) -> Option<&'r Resolved>,
) -> SchemaResult<()> {
    match (attr.collection, &attr.item_type) {
        (Some(CollectionKind::Sequence), _) => {
            if attr.key_type.as_ref().is_some_and(TypeExpr::is_integral) {
                return Err(SchemaError::IntegralSequenceKey {
                    attr: qualified.to_string(),
                });
            }
        }
        (Some(CollectionKind::Set), Some(item)) => {
            let keyed_class = attr
                .item_spec_type
                .as_deref()
                .and_then(lookup)
                .is_some_and(|c| c.key.is_some());
            if !(matches!(item, TypeExpr::Any) || item.is_hashable_scalar() || keyed_class) {
                return Err(SchemaError::UnhashableSetItem {
                    attr: qualified.to_string(),
                    item: item.label(),
                });
            }
        }
        (Some(CollectionKind::Mapping), _) => {
            let key = attr.ty.mapping_key_type();
            if !(matches!(key, TypeExpr::Any) || key.is_hashable_scalar()) {
                return Err(SchemaError::UnhashableMapKey {
                    attr: qualified.to_string(),
                    key: key.label(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}
