//! Sequence mutator.
//!
//! Items are located by position, by an equal value, or (for keyed items)
//! by key. When `by_index` is not given, a target that is itself a valid
//! item is looked up by value and anything else is treated as an index or
//! key. Keyed sequences never hold two items with the same key.

use super::{CollectionMutator, ItemContext, ItemRequest};
use valobj_core::{Call, Maybe, Missing, MutationError, MutationResult, Present, Value};

/// Result of locating a target.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Found(usize),
    /// An index past either end (the raw index is kept for messages).
    OutOfRange(i64),
    KeyMissing,
    ValueMissing,
}

/// Where an item is written.
#[derive(Debug, Clone, Copy)]
enum Placement {
    Append,
    Before(usize),
    At(usize),
}

pub(crate) struct SequenceMutator<'a> {
    ctx: ItemContext<'a>,
    items: Vec<Value>,
}

impl<'a> SequenceMutator<'a> {
    pub fn new(ctx: ItemContext<'a>, collection: Maybe<Value>) -> MutationResult<Self> {
        let items = match collection {
            Missing | Present(Value::Null) => Vec::new(),
            Present(Value::List(items)) => items,
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

    fn locate(&self, target: &Value, by_index: Option<bool>) -> MutationResult<Slot> {
        let by_index = by_index.unwrap_or_else(|| !self.ctx.item_type().check(target));
        if by_index {
            if let Value::Int(index) = target {
                return Ok(self.resolve_index(*index));
            }
            if let Some(key) = self.ctx.lookup_key(target) {
                return Ok(self.find_key(&key));
            }
            return Err(MutationError::invalid_index(self.ctx.qualified(), target.to_string()));
        }

        if let Some(key) = self.ctx.key_of(target) {
            return Ok(match self.find_key(&key) {
                Slot::Found(i) => Slot::Found(i),
                _ => Slot::ValueMissing,
            });
        }
        Ok(match self.items.iter().position(|item| item == target) {
            Some(i) => Slot::Found(i),
            None => Slot::ValueMissing,
        })
    }

    fn resolve_index(&self, index: i64) -> Slot {
        let len = self.items.len() as i64;
        let resolved = if index < 0 { len + index } else { index };
        if (0..len).contains(&resolved) {
            Slot::Found(resolved as usize)
        } else {
            Slot::OutOfRange(index)
        }
    }

    fn find_key(&self, key: &Value) -> Slot {
        match self
            .items
            .iter()
            .position(|item| self.ctx.key_of(item).as_ref() == Some(key))
        {
            Some(i) => Slot::Found(i),
            None => Slot::KeyMissing,
        }
    }

    /// Position of an item that must exist.
    fn require(&self, target: &Value, by_index: Option<bool>) -> MutationResult<usize> {
        let qualified = self.ctx.qualified();
        match self.locate(target, by_index)? {
            Slot::Found(i) => Ok(i),
            Slot::OutOfRange(index) => {
                Err(MutationError::index_out_of_range(qualified, index.to_string()))
            }
            Slot::KeyMissing => Err(MutationError::key_not_found(qualified, target.to_string())),
            Slot::ValueMissing => Err(MutationError::item_not_found(qualified, target.to_string())),
        }
    }

    /// The locator of an item-level call: the explicit target, else (for keyed
    /// items) the key implied by the new value or attrs.
    fn required_target(&self, call: &Call, method: &str) -> MutationResult<Value> {
        match &call.target {
            Present(target) => Ok(target.clone()),
            Missing => self
                .ctx
                .derive_key(&call.value, &call.attrs)
                .ok_or_else(|| MutationError::missing_argument(self.ctx.method(method), "target")),
        }
    }

    fn place(&mut self, placement: Placement, item: Value) -> MutationResult<()> {
        self.ctx.check_item(&item)?;
        if self.ctx.is_keyed() {
            let key = self
                .ctx
                .key_of(&item)
                .ok_or_else(|| MutationError::unhashable(self.ctx.qualified(), item.to_string()))?;
            let replaced = match placement {
                Placement::At(i) => Some(i),
                _ => None,
            };
            let collides = self
                .items
                .iter()
                .enumerate()
                .any(|(j, other)| Some(j) != replaced && self.ctx.key_of(other).as_ref() == Some(&key));
            if collides {
                return Err(MutationError::key_collision(self.ctx.qualified(), key.to_string()));
            }
        }
        match placement {
            Placement::Append => self.items.push(item),
            Placement::Before(i) => self.items.insert(i, item),
            Placement::At(i) => self.items[i] = item,
        }
        Ok(())
    }
}

impl CollectionMutator for SequenceMutator<'_> {
    fn get_item(&self, call: &Call) -> MutationResult<Value> {
        let target = self.required_target(call, "get_")?;
        let i = self.require(&target, call.by_index)?;
        Ok(self.items[i].clone())
    }

    fn with_item(&mut self, mut call: Call) -> MutationResult<()> {
        let needle = match &call.target {
            Present(target) => Some(target.clone()),
            Missing => self.ctx.derive_key(&call.value, &call.attrs),
        };
        let slot = match &needle {
            Some(needle) => self.locate(needle, call.by_index)?,
            None => Slot::ValueMissing,
        };

        let old = match slot {
            Slot::Found(i) if !call.insert => Present(self.items[i].clone()),
            _ => Missing,
        };
        let seed = match old {
            Missing => needle.as_ref().and_then(|p| self.ctx.lookup_key(p)),
            Present(_) => None,
        };
        let request = ItemRequest::from_call(&mut call).seeded(seed);
        let item = self.ctx.mutate_item(old, request)?;

        let placement = match (slot, call.insert) {
            (Slot::Found(i), true) => Placement::Before(i),
            (Slot::Found(i), false) => Placement::At(i),
            (Slot::OutOfRange(index), true) if index < 0 => Placement::Before(0),
            (Slot::OutOfRange(_), true) => Placement::Append,
            (Slot::OutOfRange(index), false) => {
                return Err(MutationError::index_out_of_range(
                    self.ctx.qualified(),
                    index.to_string(),
                ))
            }
            _ => Placement::Append,
        };
        self.place(placement, item)
    }

    fn update_item(&mut self, mut call: Call) -> MutationResult<()> {
        let target = self.required_target(&call, "update_")?;
        let i = self.require(&target, call.by_index)?;
        let old = Present(self.items[i].clone());
        let item = self.ctx.mutate_item(old, ItemRequest::from_call(&mut call))?;
        self.place(Placement::At(i), item)
    }

    fn transform_item(&mut self, mut call: Call) -> MutationResult<()> {
        let target = self.required_target(&call, "transform_")?;
        let i = self.require(&target, call.by_index)?;
        let old = Present(self.items[i].clone());
        let item = self.ctx.mutate_item(old, ItemRequest::from_call(&mut call))?;
        self.place(Placement::At(i), item)
    }

    fn without_item(&mut self, call: Call) -> MutationResult<()> {
        let target = self.required_target(&call, "without_")?;
        let i = self.require(&target, call.by_index)?;
        self.items.remove(i);
        Ok(())
    }

    fn add_items(&mut self, items: Value) -> MutationResult<()> {
        let items: Vec<Value> = match items {
            Value::List(items) => items,
            Value::Set(set) => set.into_iter().collect(),
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
            self.place(Placement::Append, item)?;
        }
        Ok(())
    }

    fn into_value(self: Box<Self>) -> Value {
        Value::List(self.items)
    }
}
