use crate::{Galaxy, Planet, PlanetTag, Recorder, Star, Tag, seed, silent_logs};
use weir::{
    Action, Children, Comparison, Direction, Entity, Executor, FieldRef, Filter, Loaded,
    QueryError, Scope, Side, Siblings,
};

/// Number of values in the first `IN` filter of a recorded query.
fn subset_len(filter: &Filter) -> Option<usize> {
    match filter {
        Filter::Subset {
            scope: Scope::In,
            values,
            ..
        } => Some(values.len()),
        Filter::Group { filters, .. } => filters.iter().find_map(subset_len),
        _ => None,
    }
}

pub async fn eager_loading<E: Executor>(executor: &mut Recorder<E>) {
    let universe = seed(executor).await;
    executor.take();

    // Parent: five planets with two distinct stars
    let planets = Planet::query(executor)
        .with(Planet::star())
        .sort(Planet::id, Direction::Ascending)
        .all()
        .await
        .expect("Failed to load the planets with their star");
    let queries = executor.take();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].0.entity, "stars");
    assert_eq!(subset_len(&queries[1].0.filter), Some(2));
    for planet in &planets {
        let star = planet
            .star
            .get()
            .expect("The star should be loaded")
            .as_ref()
            .expect("Every planet has a star");
        assert_eq!(star.id, planet.star_id);
    }
    assert_eq!(
        planets[4]
            .star
            .get()
            .ok()
            .and_then(Option::as_ref)
            .map(|v| v.name.as_str()),
        Some("Proxima Centauri")
    );

    // Children, stars without planets get an empty list
    let stars = Star::query(executor)
        .with(Star::planets())
        .with(Star::galaxy())
        .sort(Star::id, Direction::Ascending)
        .all()
        .await
        .expect("Failed to load the stars with their planets");
    let queries = executor.take();
    assert_eq!(queries.len(), 3);
    assert_eq!(subset_len(&queries[1].0.filter), Some(4));
    assert_eq!(subset_len(&queries[2].0.filter), Some(2));
    let counts: Vec<_> = stars
        .iter()
        .map(|v| v.planets.get().map(Vec::len).unwrap_or_default())
        .collect();
    assert_eq!(counts, [4, 0, 1, 0]);
    assert_eq!(
        stars[3].galaxy.as_option().cloned().flatten().map(|v| v.name),
        Some("Andromeda".to_string())
    );

    // Nothing to load, no follow up query
    let stars = Star::query(executor)
        .filter(Star::name, Comparison::Equals, "Betelgeuse")
        .with(Star::planets())
        .all()
        .await
        .expect("Failed to load no star");
    assert!(stars.is_empty());
    assert_eq!(executor.take().len(), 1);

    // Not requested
    let star = Star::find(executor, universe.stars[0].id)
        .await
        .expect("Failed to find the sun")
        .expect("The sun should exist");
    assert_eq!(star.planets, Loaded::NotLoaded);
    let error = star.planets.get().expect_err("Planets were not requested");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::NotLoaded { .. })
    ));

    // Lazy access
    let galaxy = Star::galaxy()
        .get(&star, executor)
        .await
        .expect("Failed to read the galaxy of the sun");
    assert_eq!(galaxy.map(|v| v.name), Some("Milky Way".to_string()));
    let planets = Star::planets()
        .query(&star, executor)
        .expect("The sun has an id")
        .filter(Planet::radius, Comparison::GreaterThan, 6000)
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query the large planets of the sun");
    assert_eq!(
        planets.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Earth", "Venus"]
    );
    let stars = Galaxy::stars()
        .query(&universe.galaxies[1], executor)
        .expect("Andromeda has an id")
        .all()
        .await
        .expect("Failed to query the stars of Andromeda");
    assert_eq!(stars.len(), 1);
    let error = Galaxy::stars()
        .query(&Galaxy::new("Triangulum"), executor)
        .err()
        .expect("A galaxy that was never saved has no stars to query");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::MissingId { .. })
    ));

    // A relation that fails to load fails the whole call
    silent_logs! {
        let result = Star::query(executor)
            .with(Star::galaxy())
            .with(Children::<Star, Planet>::new(
                FieldRef::new("planets", "orbit_id"),
                |v| &mut v.planets,
            ))
            .all()
            .await;
        assert!(result.is_err(), "Planets have no orbit_id to load them by");
    }
    let error = Planet::query(executor)
        .with(Siblings::<Planet, Tag, PlanetTag>::new(Side::Right, |v| {
            &mut v.tags
        }))
        .all()
        .await
        .expect_err("Planets are on the left of their pivot with tags");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::InvalidPivot { .. })
    ));
}

pub async fn siblings<E: Executor>(executor: &mut Recorder<E>) {
    let universe = seed(executor).await;
    let (mercury, earth, mars) = (
        &universe.planets[0],
        &universe.planets[2],
        &universe.planets[3],
    );
    let mut rocky = Tag::new("rocky");
    let mut blue = Tag::new("blue");
    let mut cold = Tag::new("cold");
    for tag in [&mut rocky, &mut blue, &mut cold] {
        tag.save(executor).await.expect("Failed to save a tag");
    }
    let tags = Planet::tags();
    for (planet, tag) in [
        (mercury, &rocky),
        (earth, &rocky),
        (earth, &blue),
        (mars, &rocky),
        (mars, &cold),
    ] {
        tags.attach(planet, tag, executor)
            .await
            .expect("Failed to attach a tag");
    }
    assert!(
        tags.is_attached(earth, &blue, executor)
            .await
            .expect("Failed to check an attached tag")
    );
    assert!(
        !tags
            .is_attached(mercury, &blue, executor)
            .await
            .expect("Failed to check a detached tag")
    );
    assert!(
        Tag::planets()
            .is_attached(&cold, mars, executor)
            .await
            .expect("Failed to check from the other side")
    );

    // Eager: one pivot query and one tag query
    executor.take();
    let planets = Planet::query(executor)
        .with(Planet::tags())
        .sort(Planet::id, Direction::Ascending)
        .all()
        .await
        .expect("Failed to load the planets with their tags");
    let queries = executor.take();
    assert_eq!(queries.len(), 3);
    assert_eq!(queries[1].0.entity, "planet+tag");
    assert_eq!(queries[2].0.entity, "tags");
    assert_eq!(subset_len(&queries[2].0.filter), Some(3));
    let mut names: Vec<Vec<String>> = planets
        .iter()
        .map(|v| {
            v.tags
                .get()
                .expect("Tags should be loaded")
                .iter()
                .map(|v| v.name.clone())
                .collect()
        })
        .collect();
    names.iter_mut().for_each(|v| v.sort());
    assert_eq!(
        names,
        [
            vec!["rocky"],
            vec![],
            vec!["blue", "rocky"],
            vec!["cold", "rocky"],
            vec![],
        ]
    );
    let tags_of_rocky = Tag::query(executor)
        .filter(Tag::name, Comparison::Equals, "rocky")
        .with(Tag::planets())
        .first()
        .await
        .expect("Failed to load the rocky tag")
        .expect("The rocky tag exists");
    assert_eq!(tags_of_rocky.planets.get().map(Vec::len).ok(), Some(3));

    // Related query
    let planets = Tag::planets()
        .query(&rocky, executor)
        .expect("The rocky tag has an id")
        .sort(Planet::name, Direction::Descending)
        .all()
        .await
        .expect("Failed to query the rocky planets");
    assert_eq!(
        planets.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Mercury", "Mars", "Earth"]
    );
    let recorded = executor.last().expect("The query was recorded");
    assert_eq!(recorded.0.action, Action::Select);
    assert_eq!(recorded.0.joins.len(), 1);

    // Detach
    assert_eq!(
        tags.detach(mars, &cold, executor)
            .await
            .expect("Failed to detach a tag"),
        1
    );
    assert_eq!(
        tags.detach(mars, &cold, executor)
            .await
            .expect("Failed to detach a missing tag"),
        0
    );
    assert!(
        !tags
            .is_attached(mars, &cold, executor)
            .await
            .expect("Failed to check a detached tag")
    );
    let error = tags
        .attach(mars, &Tag::new("unsaved"), executor)
        .await
        .expect_err("An unsaved tag cannot be attached");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::MissingId { .. })
    ));
}
