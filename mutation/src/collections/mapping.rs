//! Mapping mutator.
//!
//! Entries are located by key. For a mapping of keyed value-objects the
//! entry key is the item's own key: it may be given as the item, the bare
//! key, or the key attribute among the nested attrs, and an item whose key
//! changes moves to its new entry.

use super::{CollectionMutator, ItemContext, ItemRequest};
use valobj_core::{Call, Key, Maybe, Missing, MutationError, MutationResult, Present, Value, ValueMap};

pub(crate) struct MappingMutator<'a> {
    ctx: ItemContext<'a>,
    items: ValueMap,
}

impl<'a> MappingMutator<'a> {
    pub fn new(ctx: ItemContext<'a>, collection: Maybe<Value>) -> MutationResult<Self> {
        let items = match collection {
            Missing | Present(Value::Null) => ValueMap::new(),
            Present(Value::Map(items)) => items,
            Present(other) => {
                return Err(MutationError::type_mismatch(
                    ctx.qualified(),
                    other.to_string(),
                    ctx.attr.ty.label(),
                ))
            }
        };
        Ok(Self { ctx, items })
    }

    fn to_key(&self, needle: &Value) -> MutationResult<Key> {
        let raw = self.ctx.lookup_key(needle).unwrap_or_else(|| needle.clone());
        Key::from_value(&raw)
            .ok_or_else(|| MutationError::unhashable(self.ctx.qualified(), raw.to_string()))
    }

    /// Entry key named by a call, if any.
    fn lookup(&self, call: &Call) -> MutationResult<Option<Key>> {
        if let Present(target) = &call.target {
            return self.to_key(target).map(Some);
        }
        match self.ctx.derive_key(&call.value, &call.attrs) {
            Some(key) => self.to_key(&key).map(Some),
            None => Ok(None),
        }
    }

    fn require_lookup(&self, call: &Call, prefix: &str) -> MutationResult<Key> {
        let key = self
            .lookup(call)?
            .ok_or_else(|| MutationError::missing_argument(self.ctx.method(prefix), "key"))?;
        if !self.items.contains_key(&key) {
            return Err(MutationError::key_not_found(self.ctx.qualified(), key.to_string()));
        }
        Ok(key)
    }

    fn check_key(&self, key: &Key) -> MutationResult<()> {
        let key_type = self.ctx.attr.ty.mapping_key_type();
        if key_type.check(&key.to_value()) {
            return Ok(());
        }
        Err(MutationError::type_mismatch(
            self.ctx.qualified(),
            key.to_string(),
            key_type.label(),
        ))
    }

    /// Store `item`, replacing the entry at `located` (if any).
    ///
    /// Keyed items are stored under their own key; when that differs from
    /// `located` the old entry is removed, and an existing entry at the new
    /// key is a collision.
    fn put(&mut self, located: Option<Key>, item: Value) -> MutationResult<()> {
        self.ctx.check_item(&item)?;
        let key = if self.ctx.is_keyed() {
            self.ctx.identity(&item)?
        } else {
            located
                .clone()
                .ok_or_else(|| MutationError::missing_argument(self.ctx.method("with_"), "key"))?
        };
        self.check_key(&key)?;

        if located.as_ref() != Some(&key) && self.items.contains_key(&key) {
            return Err(MutationError::key_collision(self.ctx.qualified(), key.to_string()));
        }
        if let Some(located) = located.filter(|l| l != &key) {
            self.items.remove(&located);
        }
        self.items.insert(key, item);
        Ok(())
    }
}

impl CollectionMutator for MappingMutator<'_> {
    fn get_item(&self, call: &Call) -> MutationResult<Value> {
        let key = self.require_lookup(call, "get_")?;
        self.items
            .get(&key)
            .cloned()
            .ok_or_else(|| MutationError::key_not_found(self.ctx.qualified(), key.to_string()))
    }

    fn with_item(&mut self, mut call: Call) -> MutationResult<()> {
        let located = self.lookup(&call)?;
        let old: Maybe<Value> = located
            .as_ref()
            .and_then(|key| self.items.get(key).cloned())
            .into();
        let seed = match (&old, &located) {
            (Missing, Some(key)) if self.ctx.is_keyed() => Some(key.to_value()),
            _ => None,
        };
        let existing = located.filter(|key| self.items.contains_key(key));
        let item = self
            .ctx
            .mutate_item(old, ItemRequest::from_call(&mut call).seeded(seed))?;
        match existing {
            Some(key) => self.put(Some(key), item),
            None if self.ctx.is_keyed() => self.put(None, item),
            None => {
                let key = match &call.target {
                    Present(target) => self.to_key(target)?,
                    Missing => {
                        return Err(MutationError::missing_argument(self.ctx.method("with_"), "key"))
                    }
                };
                self.put(Some(key), item)
            }
        }
    }

    fn update_item(&mut self, mut call: Call) -> MutationResult<()> {
        let key = self.require_lookup(&call, "update_")?;
        let old: Maybe<Value> = self.items.get(&key).cloned().into();
        let item = self.ctx.mutate_item(old, ItemRequest::from_call(&mut call))?;
        self.put(Some(key), item)
    }

    fn transform_item(&mut self, mut call: Call) -> MutationResult<()> {
        let key = self.require_lookup(&call, "transform_")?;
        let old: Maybe<Value> = self.items.get(&key).cloned().into();
        let item = self.ctx.mutate_item(old, ItemRequest::from_call(&mut call))?;
        self.put(Some(key), item)
    }

    fn without_item(&mut self, call: Call) -> MutationResult<()> {
        let key = self.require_lookup(&call, "without_")?;
        self.items.remove(&key);
        Ok(())
    }

    fn add_items(&mut self, items: Value) -> MutationResult<()> {
        let entries: Vec<(Option<Key>, Value)> = match items {
            Value::Map(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            Value::List(items) if self.ctx.is_keyed() => {
                items.into_iter().map(|v| (None, v)).collect()
            }
            Value::Set(set) if self.ctx.is_keyed() => set.into_iter().map(|v| (None, v)).collect(),
            other => {
                return Err(MutationError::type_mismatch(
                    self.ctx.qualified(),
                    other.to_string(),
                    self.ctx.attr.ty.label(),
                ))
            }
        };
        for (key, value) in entries {
            let item = self.ctx.mutate_item(Missing, ItemRequest::value(value))?;
            let key = match key {
                Some(_) if self.ctx.is_keyed() => self.ctx.identity(&item)?,
                Some(key) => key,
                None => self.ctx.identity(&item)?,
            };
            if self.items.contains_key(&key) {
                return Err(MutationError::key_collision(self.ctx.qualified(), key.to_string()));
            }
            self.ctx.check_item(&item)?;
            self.check_key(&key)?;
            self.items.insert(key, item);
        }
        Ok(())
    }

    fn into_value(self: Box<Self>) -> Value {
        Value::Map(self.items)
    }
}
