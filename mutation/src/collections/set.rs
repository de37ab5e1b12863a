//! Set mutator.
//!
//! Members are located by identity: a scalar is its own identity and a keyed
//! value-object is identified by its key, so a bare key also locates it.
//! Adding a member equal to an existing one is a no-op; adding a different
//! member with the same identity is a collision unless it replaces the
//! member that was located.

use super::{CollectionMutator, ItemContext, ItemRequest};
use valobj_core::{
    Call, Key, Maybe, Missing, MutationError, MutationResult, Present, Value, ValueSet,
};

pub(crate) struct SetMutator<'a> {
    ctx: ItemContext<'a>,
    items: ValueSet,
}

impl<'a> SetMutator<'a> {
    pub fn new(ctx: ItemContext<'a>, collection: Maybe<Value>) -> MutationResult<Self> {
        let items = match collection {
            Missing | Present(Value::Null) => ValueSet::new(),
            Present(Value::Set(items)) => items,
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
        match self.ctx.lookup_key(needle) {
            Some(key) => Key::from_value(&key)
                .ok_or_else(|| MutationError::unhashable(self.ctx.qualified(), key.to_string())),
            None => self.ctx.identity(needle),
        }
    }

    /// Identity named by a call: the target, else the new member or key attrs.
    fn lookup(&self, call: &Call) -> MutationResult<Option<Key>> {
        if let Present(target) = &call.target {
            return self.to_key(target).map(Some);
        }
        if let Present(value) = &call.value {
            return self.to_key(value).map(Some);
        }
        match self.ctx.derive_key(&call.value, &call.attrs) {
            Some(key) => self.to_key(&key).map(Some),
            None => Ok(None),
        }
    }

    fn require_lookup(&self, call: &Call, prefix: &str) -> MutationResult<Key> {
        let key = self
            .lookup(call)?
            .ok_or_else(|| MutationError::missing_argument(self.ctx.method(prefix), "target"))?;
        if self.items.contains_key(&key) {
            return Ok(key);
        }
        Err(if self.ctx.is_keyed() {
            MutationError::key_not_found(self.ctx.qualified(), key.to_string())
        } else {
            MutationError::item_not_found(self.ctx.qualified(), key.to_string())
        })
    }

    /// Store `item`, replacing the member at `located` (if any).
    fn put(&mut self, located: Option<Key>, item: Value) -> MutationResult<()> {
        self.ctx.check_item(&item)?;
        let key = self.ctx.identity(&item)?;
        if located.as_ref() != Some(&key) {
            if let Some(existing) = self.items.get(&key) {
                if existing != &item {
                    return Err(MutationError::key_collision(self.ctx.qualified(), key.to_string()));
                }
            }
        }
        if let Some(located) = located {
            self.items.remove(&located);
        }
        self.items
            .insert(item)
            .map_err(|item| MutationError::unhashable(self.ctx.qualified(), item.to_string()))?;
        Ok(())
    }
}

impl CollectionMutator for SetMutator<'_> {
    fn get_item(&self, call: &Call) -> MutationResult<Value> {
        let key = self.require_lookup(call, "get_")?;
        self.items
            .get(&key)
            .cloned()
            .ok_or_else(|| MutationError::item_not_found(self.ctx.qualified(), key.to_string()))
    }

    fn with_item(&mut self, mut call: Call) -> MutationResult<()> {
        let located = self.lookup(&call)?.filter(|key| self.items.contains_key(key));
        let old: Maybe<Value> = located
            .as_ref()
            .and_then(|key| self.items.get(key).cloned())
            .into();
        let seed = match (&old, &call.target) {
            (Missing, Present(target)) => self.ctx.lookup_key(target),
            _ => None,
        };
        let item = self
            .ctx
            .mutate_item(old, ItemRequest::from_call(&mut call).seeded(seed))?;
        self.put(located, item)
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
        let items: Vec<Value> = match items {
            Value::Set(set) => set.into_iter().collect(),
            Value::List(items) => items,
            other => {
                return Err(MutationError::type_mismatch(
                    self.ctx.qualified(),
                    other.to_string(),
                    self.ctx.attr.ty.label(),
                ))
            }
        };
        for item in items {
            let item = self.ctx.mutate_item(Missing, ItemRequest::value(item))?;
            self.put(None, item)?;
        }
        Ok(())
    }

    fn into_value(self: Box<Self>) -> Value {
        Value::Set(self.items)
    }
}
