//! Collection mutators.
//!
//! A mutator wraps the working copy of one collection attribute and knows
//! how to locate, insert, and remove items for its collection family. Item
//! values themselves are built with `mutate_value`, using the item type as
//! constructor and the attribute's item preparer.
//!
//! # Module Structure
//!
//! - `sequence` - ordered lists, located by index, value, or key
//! - `mapping` - maps, located by key
//! - `set` - sets, located by value or key

mod mapping;
mod sequence;
mod set;

use crate::lifecycle;
use crate::mutate::{mutate_value, Constructor, ValueMutation};
use std::rc::Rc;
use valobj_core::{
    AttrSpec, Attrs, Call, ClassDef, CollectionKind, Key, Maybe, Missing, MutationError,
    MutationResult, Object, Present, Registry, Transform, TypeExpr, Value,
};

pub(crate) use mapping::MappingMutator;
pub(crate) use sequence::SequenceMutator;
pub(crate) use set::SetMutator;

/// Item-level operations on one collection.
pub(crate) trait CollectionMutator {
    /// `get_<s>`: the located item.
    fn get_item(&self, call: &Call) -> MutationResult<Value>;

    /// `with_<s>`: add an item, or patch the one it locates.
    fn with_item(&mut self, call: Call) -> MutationResult<()>;

    /// `update_<s>`: patch an item that must already exist.
    fn update_item(&mut self, call: Call) -> MutationResult<()>;

    /// `transform_<s>`: replace an existing item with a function of itself.
    fn transform_item(&mut self, call: Call) -> MutationResult<()>;

    /// `without_<s>`: remove an existing item.
    fn without_item(&mut self, call: Call) -> MutationResult<()>;

    /// Add every element of `items`, rejecting key collisions.
    fn add_items(&mut self, items: Value) -> MutationResult<()>;

    fn into_value(self: Box<Self>) -> Value;
}

/// A mutator over `collection` (an unset collection starts out empty).
pub(crate) fn mutator_for<'a>(
    ctx: ItemContext<'a>,
    kind: CollectionKind,
    collection: Maybe<Value>,
) -> MutationResult<Box<dyn CollectionMutator + 'a>> {
    Ok(match kind {
        CollectionKind::Sequence => Box::new(SequenceMutator::new(ctx, collection)?),
        CollectionKind::Mapping => Box::new(MappingMutator::new(ctx, collection)?),
        CollectionKind::Set => Box::new(SetMutator::new(ctx, collection)?),
    })
}

/// The items of a collection value, in iteration order (mapping values for maps).
pub(crate) fn items_of(collection: &Maybe<Value>) -> Vec<Value> {
    match collection {
        Present(Value::List(items)) => items.clone(),
        Present(Value::Map(map)) => map.values().cloned().collect(),
        Present(Value::Set(set)) => set.iter().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Normalize a newly assigned collection value.
///
/// Values that already have the declared type, and need no item preparation,
/// are kept as they are. Anything else is rebuilt item by item, which also
/// converts between collection families (a list assigned to a set attribute).
/// Values that are not collections at all are returned unchanged and fail
/// the type check later.
pub(crate) fn prepare_collection(
    instance: &Object,
    class: &ClassDef,
    attr: &AttrSpec,
    raw: Value,
) -> MutationResult<Value> {
    let Some(kind) = attr.collection else {
        return Ok(raw);
    };
    let ctx = ItemContext::new(instance, class, attr);
    if attr.item_preparer.is_none() && attr.ty.check(&raw) && !ctx.has_duplicate_keys(&raw) {
        return Ok(raw);
    }
    if !matches!(raw, Value::List(_) | Value::Map(_) | Value::Set(_)) {
        return Ok(raw);
    }
    let mut mutator = mutator_for(ctx, kind, Missing)?;
    mutator.add_items(raw)?;
    Ok(mutator.into_value())
}

// ==================== Item context ====================

/// Everything an item operation needs to know about its collection.
pub(crate) struct ItemContext<'a> {
    /// Instance owning the collection, passed to item preparers.
    pub instance: &'a Object,
    pub class: &'a ClassDef,
    pub attr: &'a AttrSpec,
    pub registry: Rc<Registry>,
    qualified: String,
}

impl<'a> ItemContext<'a> {
    pub fn new(instance: &'a Object, class: &'a ClassDef, attr: &'a AttrSpec) -> Self {
        Self {
            instance,
            class,
            attr,
            registry: instance.registry(),
            qualified: attr.qualified(&class.name),
        }
    }

    /// `Class.attr`, for error messages.
    pub fn qualified(&self) -> &str {
        &self.qualified
    }

    /// Name of a generated item method, e.g. `update_item`.
    pub fn method(&self, prefix: &str) -> String {
        let item = self.attr.item_name.as_deref().unwrap_or(&self.attr.name);
        format!("{}{}", prefix, item)
    }

    pub fn item_type(&self) -> TypeExpr {
        self.attr.item_type()
    }

    pub fn is_keyed(&self) -> bool {
        self.attr.item_key_attr.is_some()
    }

    pub fn key_attr(&self) -> Option<&str> {
        self.attr.item_key_attr.as_deref()
    }

    /// Key of a keyed item.
    pub fn key_of(&self, item: &Value) -> Option<Value> {
        if !self.is_keyed() {
            return None;
        }
        item.as_object().and_then(Object::key_value)
    }

    /// Interpret a locator as a key: a keyed item stands for its key, and a
    /// value of the key type is the key itself.
    pub fn lookup_key(&self, needle: &Value) -> Option<Value> {
        if !self.is_keyed() {
            return None;
        }
        if needle.is_object() && self.item_type().check(needle) {
            return self.key_of(needle);
        }
        match &self.attr.key_type {
            Some(key_type) if key_type.check(needle) => Some(needle.clone()),
            _ => None,
        }
    }

    /// Key implied by a new item or by the key attribute among `attrs`.
    pub fn derive_key(&self, value: &Maybe<Value>, attrs: &Attrs) -> Option<Value> {
        if let Present(value) = value {
            if let Some(key) = self.lookup_key(value) {
                return Some(key);
            }
        }
        let key_attr = self.key_attr()?;
        attrs
            .iter()
            .find(|(name, _)| name == key_attr)
            .map(|(_, value)| value.clone())
    }

    /// Hashable identity of an item: its key if keyed, else the value itself.
    pub fn identity(&self, item: &Value) -> MutationResult<Key> {
        let identity = match self.key_of(item) {
            Some(key) => Key::from_value(&key),
            None => item.identity_key(),
        };
        identity.ok_or_else(|| MutationError::unhashable(self.qualified(), item.to_string()))
    }

    pub fn check_item(&self, item: &Value) -> MutationResult<()> {
        let item_type = self.item_type();
        if item_type.check(item) {
            return Ok(());
        }
        Err(MutationError::invalid_item(
            self.qualified(),
            item.to_string(),
            item_type.label(),
        ))
    }

    /// Apply the item preparer, then cast a bare key into a keyed item.
    pub fn prepare_item(&self, item: Value) -> MutationResult<Value> {
        let item = match &self.attr.item_preparer {
            Some(prepare) => prepare(self.instance, item)?,
            None => item,
        };
        if self.item_type().check(&item) {
            return Ok(item);
        }
        match (&self.attr.item_spec_type, self.key_attr(), &self.attr.key_type) {
            (Some(class), Some(key_attr), Some(key_type)) if key_type.check(&item) => {
                let obj = lifecycle::instantiate(&self.registry, class, vec![(key_attr.to_string(), item)])?;
                Ok(Value::Object(obj))
            }
            _ => Ok(item),
        }
    }

    /// Build an item value from `old` and a request.
    ///
    /// With neither an old item nor a new one, a keyed item is constructed
    /// around `seed_key`, so locating a missing key yields a placeholder
    /// carrying that key.
    pub fn mutate_item(&self, old: Maybe<Value>, request: ItemRequest) -> MutationResult<Value> {
        let ItemRequest {
            value,
            attrs: mut item_attrs,
            replace,
            transform,
            attr_transforms,
            seed_key,
        } = request;

        if old.is_missing() && value.is_missing() {
            if let (Some(seed), Some(key_attr)) = (seed_key, self.key_attr()) {
                if !item_attrs.iter().any(|(name, _)| name == key_attr) {
                    item_attrs.insert(0, (key_attr.to_string(), seed));
                }
            }
        }

        let prepare = |item: Value| self.prepare_item(item);
        let mutation = ValueMutation {
            new: value,
            replace,
            prepare: Some(&prepare),
            constructor: Constructor::for_type(&self.registry, &self.item_type()),
            attrs: item_attrs,
            transform,
            attr_transforms,
            context: self.qualified(),
        };
        match mutate_value(old, mutation)? {
            Present(item) => Ok(item),
            Missing => Err(MutationError::missing_value(self.qualified())),
        }
    }

    /// True if `raw` is a sequence holding two keyed items with the same key.
    fn has_duplicate_keys(&self, raw: &Value) -> bool {
        let Value::List(items) = raw else {
            return false;
        };
        if !self.is_keyed() {
            return false;
        }
        let mut seen = Vec::new();
        for item in items {
            if let Some(key) = self.key_of(item) {
                if seen.contains(&key) {
                    return true;
                }
                seen.push(key);
            }
        }
        false
    }
}

/// The value-level part of an item call.
#[derive(Default)]
pub(crate) struct ItemRequest {
    pub value: Maybe<Value>,
    pub attrs: Attrs,
    pub replace: bool,
    pub transform: Option<Transform>,
    pub attr_transforms: Vec<(String, Transform)>,
    /// Key for a placeholder item built from nothing.
    pub seed_key: Option<Value>,
}

impl ItemRequest {
    /// A request carrying only a new item.
    pub fn value(value: Value) -> Self {
        Self {
            value: Present(value),
            ..Self::default()
        }
    }

    /// Split the value-level arguments off a call; the locator fields stay behind.
    pub fn from_call(call: &mut Call) -> Self {
        Self {
            value: call.value.take(),
            attrs: std::mem::take(&mut call.attrs),
            replace: call.replace,
            transform: call.transform.take(),
            attr_transforms: std::mem::take(&mut call.attr_transforms),
            seed_key: None,
        }
    }

    pub fn seeded(mut self, seed_key: Option<Value>) -> Self {
        self.seed_key = seed_key;
        self
    }
}
