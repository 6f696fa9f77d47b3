use crate::{
    Comparison, Entity, Executor, FieldRef, JoinKind, QueryBuilder, QueryError, Result, Value,
};
use std::{any, borrow::Cow, marker::PhantomData};

/// Slot of a model holding an eager loaded relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    NotLoaded,
    Loaded(T),
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Loaded::NotLoaded
    }
}

impl<T> Loaded<T> {
    /// The loaded value, an error when the relation was not requested with `with`.
    pub fn get(&self) -> Result<&T> {
        match self {
            Loaded::Loaded(v) => Ok(v),
            Loaded::NotLoaded => Err(QueryError::NotLoaded {
                relation: any::type_name::<T>(),
            }
            .into()),
        }
    }
    pub fn is_loaded(&self) -> bool {
        matches!(self, Loaded::Loaded(..))
    }
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Loaded::Loaded(v) => Some(v),
            Loaded::NotLoaded => None,
        }
    }
    pub fn into_option(self) -> Option<T> {
        match self {
            Loaded::Loaded(v) => Some(v),
            Loaded::NotLoaded => None,
        }
    }
}

impl<T> From<T> for Loaded<T> {
    fn from(value: T) -> Self {
        Loaded::Loaded(value)
    }
}

fn id_of<M: Entity>(model: &M) -> Result<Value> {
    let id = model.id();
    if id.is_null() {
        return Err(QueryError::MissingId {
            entity: M::entity().name.clone(),
        }
        .into());
    }
    Ok(id)
}

/// `M` belongs to `P`: `M` holds the foreign key `field`.
pub struct Parent<M, P> {
    pub field: FieldRef,
    pub slot: fn(&mut M) -> &mut Loaded<Option<P>>,
}

impl<M: Entity, P: Entity> Parent<M, P> {
    pub fn new(field: FieldRef, slot: fn(&mut M) -> &mut Loaded<Option<P>>) -> Self {
        Self { field, slot }
    }

    /// The parent of `model`, `None` when the foreign key is null or dangling.
    pub async fn get<E: Executor>(&self, model: &M, executor: &mut E) -> Result<Option<P>> {
        let Some(key) = model.get(&self.field.name).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        P::query(executor)
            .filter(P::entity().id_ref(), Comparison::Equals, key)
            .first()
            .await
    }
}

/// `M` has many `C`: every `C` holds the foreign key `field`.
pub struct Children<M, C> {
    pub field: FieldRef,
    pub slot: fn(&mut M) -> &mut Loaded<Vec<C>>,
}

impl<M: Entity, C: Entity> Children<M, C> {
    pub fn new(field: FieldRef, slot: fn(&mut M) -> &mut Loaded<Vec<C>>) -> Self {
        Self { field, slot }
    }

    /// Query over the children of `model`, open to further filters.
    pub fn query<'e, E: Executor>(
        &self,
        model: &M,
        executor: &'e mut E,
    ) -> Result<QueryBuilder<'e, C, E>> {
        let id = id_of(model)?;
        Ok(C::query(executor).filter(self.field.clone(), Comparison::Equals, id))
    }
}

/// Many to many relation between two entities, stored in a pivot entity.
///
/// The pivot holds one foreign key per participant. Its name does not depend
/// on the order of the participants, see [`pivot_name`].
pub trait Pivot: Entity {
    type Left: Entity;
    type Right: Entity;

    /// Foreign key referencing `Left`.
    fn left_key() -> FieldRef;
    /// Foreign key referencing `Right`.
    fn right_key() -> FieldRef;
    /// New pivot row connecting the two identifiers.
    fn from_keys(left: Value, right: Value) -> Result<Self>;
}

/// Name of the pivot entity between `a` and `b`: `"a+b"` with `a <= b`.
pub fn pivot_name(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}+{}", a, b)
    } else {
        format!("{}+{}", b, a)
    }
}

/// Side of the pivot that the owner of a [`Siblings`] relation sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// `M` is related to many `R` through the pivot `P`.
///
/// With the same entity on both sides the relation is asymmetric: `Left`
/// reads the rows where the model is the left participant.
pub struct Siblings<M, R, P> {
    pub side: Side,
    pub slot: fn(&mut M) -> &mut Loaded<Vec<R>>,
    _pivot: PhantomData<fn() -> P>,
}

impl<M: Entity, R: Entity, P: Pivot> Siblings<M, R, P> {
    pub fn new(side: Side, slot: fn(&mut M) -> &mut Loaded<Vec<R>>) -> Self {
        Self {
            side,
            slot,
            _pivot: PhantomData,
        }
    }

    /// Pivot field referencing the owner.
    pub fn local_key(&self) -> FieldRef {
        match self.side {
            Side::Left => P::left_key(),
            Side::Right => P::right_key(),
        }
    }

    /// Pivot field referencing the related model.
    pub fn foreign_key(&self) -> FieldRef {
        match self.side {
            Side::Left => P::right_key(),
            Side::Right => P::left_key(),
        }
    }

    /// Checks that the pivot connects exactly `M` and `R`.
    pub fn validate(&self) -> Result<()> {
        let (left, right) = (P::Left::entity(), P::Right::entity());
        let (local, foreign) = match self.side {
            Side::Left => (left, right),
            Side::Right => (right, left),
        };
        let pivot = P::entity();
        let references = |key: FieldRef, target: &Cow<'static, str>| {
            pivot
                .field(&key.name)
                .is_some_and(|v| v.references.as_ref().is_none_or(|r| r.entity == *target))
        };
        let connected = local.name == M::entity().name
            && foreign.name == R::entity().name
            && references(P::left_key(), &left.name)
            && references(P::right_key(), &right.name);
        if !connected {
            return Err(QueryError::InvalidPivot {
                pivot: pivot.name.clone(),
                left: M::entity().name.clone(),
                right: R::entity().name.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Query over the models related to `model`, open to further filters.
    pub fn query<'e, E: Executor>(
        &self,
        model: &M,
        executor: &'e mut E,
    ) -> Result<QueryBuilder<'e, R, E>> {
        self.validate()?;
        let id = id_of(model)?;
        Ok(R::query(executor)
            .join_on::<P>(JoinKind::Inner, R::entity().id_ref(), self.foreign_key())
            .filter(self.local_key(), Comparison::Equals, id))
    }

    /// Insert the pivot row connecting `model` with `related`.
    pub async fn attach<E: Executor>(&self, model: &M, related: &R, executor: &mut E) -> Result<()> {
        self.validate()?;
        let (local, foreign) = (id_of(model)?, id_of(related)?);
        let mut pivot = match self.side {
            Side::Left => P::from_keys(local, foreign)?,
            Side::Right => P::from_keys(foreign, local)?,
        };
        pivot.save(executor).await
    }

    /// Delete the pivot rows connecting `model` with `related`, returns how many.
    pub async fn detach<E: Executor>(
        &self,
        model: &M,
        related: &R,
        executor: &mut E,
    ) -> Result<u64> {
        self.validate()?;
        let (local, foreign) = (id_of(model)?, id_of(related)?);
        let result = P::query(executor)
            .filter(self.local_key(), Comparison::Equals, local)
            .filter(self.foreign_key(), Comparison::Equals, foreign)
            .force_delete()
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn is_attached<E: Executor>(
        &self,
        model: &M,
        related: &R,
        executor: &mut E,
    ) -> Result<bool> {
        self.validate()?;
        let (local, foreign) = (id_of(model)?, id_of(related)?);
        let count = P::query(executor)
            .filter(self.local_key(), Comparison::Equals, local)
            .filter(self.foreign_key(), Comparison::Equals, foreign)
            .count()
            .await?;
        Ok(count.unwrap_or_default() > 0)
    }
}
