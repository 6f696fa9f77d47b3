use crate::{
    Children, Entity, Executor, Loaded, Parent, Pivot, Result, Siblings, ValueKey, distinct_keys,
    future::{BoxFuture, FutureExt},
};
use std::collections::HashMap;

/// Pending request to load a relation for a batch of models.
///
/// The builder runs every request once per terminal call, after the primary
/// rows are decoded. Each one issues at most a fixed number of queries,
/// whatever the size of the batch.
pub trait EagerLoad<M: Entity, E: Executor>: Send + Sync {
    fn load<'a>(&'a self, executor: &'a mut E, models: &'a mut [M]) -> BoxFuture<'a, Result<()>>;
}

impl<M: Entity, P: Entity + Clone, E: Executor> EagerLoad<M, E> for Parent<M, P> {
    fn load<'a>(&'a self, executor: &'a mut E, models: &'a mut [M]) -> BoxFuture<'a, Result<()>> {
        async move {
            let name = &self.field.name;
            let keys = distinct_keys(models.iter().filter_map(|v| v.get(name)));
            let mut index = HashMap::<ValueKey, P>::new();
            if !keys.is_empty() {
                let parents = P::query(executor)
                    .filter_in(P::entity().id_ref(), keys)
                    .all()
                    .await?;
                index.extend(parents.into_iter().map(|v| (v.id().key(), v)));
            }
            for model in models.iter_mut() {
                let parent = model
                    .get(name)
                    .filter(|v| !v.is_null())
                    .and_then(|v| index.get(&v.key()).cloned());
                *(self.slot)(model) = Loaded::Loaded(parent);
            }
            Ok(())
        }
        .boxed()
    }
}

impl<M: Entity, C: Entity + Clone, E: Executor> EagerLoad<M, E> for Children<M, C> {
    fn load<'a>(&'a self, executor: &'a mut E, models: &'a mut [M]) -> BoxFuture<'a, Result<()>> {
        async move {
            let keys = distinct_keys(models.iter().map(|v| v.id()));
            let mut index = HashMap::<ValueKey, Vec<C>>::new();
            if !keys.is_empty() {
                let children = C::query(executor)
                    .filter_in(self.field.clone(), keys)
                    .all()
                    .await?;
                for child in children {
                    if let Some(key) = child.get(&self.field.name) {
                        index.entry(key.key()).or_default().push(child);
                    }
                }
            }
            for model in models.iter_mut() {
                let children = index.get(&model.id().key()).cloned().unwrap_or_default();
                *(self.slot)(model) = Loaded::Loaded(children);
            }
            Ok(())
        }
        .boxed()
    }
}

impl<M, R, P, E> EagerLoad<M, E> for Siblings<M, R, P>
where
    M: Entity,
    R: Entity + Clone,
    P: Pivot,
    E: Executor,
{
    fn load<'a>(&'a self, executor: &'a mut E, models: &'a mut [M]) -> BoxFuture<'a, Result<()>> {
        async move {
            self.validate()?;
            let (local, foreign) = (self.local_key(), self.foreign_key());
            let keys = distinct_keys(models.iter().map(|v| v.id()));
            let mut pairs = Vec::new();
            let mut index = HashMap::<ValueKey, R>::new();
            if !keys.is_empty() {
                let pivots = P::query(&mut *executor)
                    .filter_in(local.clone(), keys)
                    .all()
                    .await?;
                pairs = pivots
                    .iter()
                    .filter_map(|v| Some((v.get(&local.name)?, v.get(&foreign.name)?)))
                    .collect::<Vec<_>>();
                let related = distinct_keys(pairs.iter().map(|(_, v)| v.clone()));
                if !related.is_empty() {
                    let related = R::query(&mut *executor)
                        .filter_in(R::entity().id_ref(), related)
                        .all()
                        .await?;
                    index.extend(related.into_iter().map(|v| (v.id().key(), v)));
                }
            }
            let mut grouped = HashMap::<ValueKey, Vec<R>>::new();
            for (local, foreign) in pairs {
                if let Some(related) = index.get(&foreign.key()) {
                    grouped
                        .entry(local.key())
                        .or_default()
                        .push(related.clone());
                }
            }
            for model in models.iter_mut() {
                let related = grouped.get(&model.id().key()).cloned().unwrap_or_default();
                *(self.slot)(model) = Loaded::Loaded(related);
            }
            Ok(())
        }
        .boxed()
    }
}
