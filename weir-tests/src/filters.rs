use crate::{Planet, Star, seed};
use weir::{Comparison, Direction, Entity, Executor, Filter, QueryError, Relation, Value};

fn names(planets: &[Planet]) -> Vec<&str> {
    planets.iter().map(|v| v.name.as_str()).collect()
}

pub async fn filters<E: Executor>(executor: &mut E) {
    let universe = seed(executor).await;
    let sun = &universe.stars[0];

    // Comparisons
    let planets = Planet::query(executor)
        .filter(Planet::radius, Comparison::GreaterThan, 3000.0)
        .sort(Planet::radius, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query the large planets");
    assert_eq!(names(&planets), ["Mars", "Venus", "Earth"]);
    let planets = Planet::query(executor)
        .filter(Planet::radius, Comparison::LessOrEqual, 3389.5)
        .filter(Planet::star_id, Comparison::Equals, sun.id)
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query the small planets");
    assert_eq!(names(&planets), ["Mars", "Mercury"]);
    let planets = Planet::query(executor)
        .filter(Planet::habitable, Comparison::NotEquals, true)
        .filter(Planet::radius, Comparison::GreaterOrEqual, 0)
        .sort(Planet::name, Direction::Descending)
        .all()
        .await
        .expect("Failed to query the uninhabitable planets");
    assert_eq!(names(&planets), ["Venus", "Mercury", "Mars"]);

    // Null comparisons
    let planets = Planet::query(executor)
        .filter(Planet::radius, Comparison::Equals, Value::Null)
        .all()
        .await
        .expect("Failed to query the planets without radius");
    assert_eq!(names(&planets), ["Proxima b"]);
    assert_eq!(
        Planet::query(executor)
            .filter(Planet::radius, Comparison::NotEquals, None::<f64>)
            .count()
            .await
            .expect("Failed to count the planets with radius"),
        Some(4)
    );
    let error = Planet::query(executor)
        .filter(Planet::radius, Comparison::LessThan, Value::Null)
        .all()
        .await
        .expect_err("Ordering against null must be rejected");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::NullComparison { .. })
    ));

    // Patterns
    let planets = Planet::query(executor)
        .filter(Planet::name, Comparison::HasPrefix, "M")
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query by prefix");
    assert_eq!(names(&planets), ["Mars", "Mercury"]);
    let planets = Planet::query(executor)
        .filter(Planet::name, Comparison::HasSuffix, "s")
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query by suffix");
    assert_eq!(names(&planets), ["Mars", "Venus"]);
    let stars = Star::query(executor)
        .filter(Star::name, Comparison::Contains, "ri")
        .sort(Star::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query by content");
    assert_eq!(
        stars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Proxima Centauri", "Sirius"]
    );
    for name in ["100%", "1000", "a_c", "abc"] {
        Star::new(name, 1.0, &universe.galaxies[1])
            .save(executor)
            .await
            .expect("Failed to save a star");
    }
    let stars = Star::query(executor)
        .filter(Star::name, Comparison::HasPrefix, "100%")
        .all()
        .await
        .expect("Failed to query by a prefix with a wildcard");
    assert_eq!(
        stars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["100%"]
    );
    let stars = Star::query(executor)
        .filter(Star::name, Comparison::Contains, "_")
        .all()
        .await
        .expect("Failed to query by a content with a wildcard");
    assert_eq!(
        stars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["a_c"]
    );

    // Subsets
    let planets = Planet::query(executor)
        .filter_in(Planet::name, ["Earth", "Mars", "Pluto"])
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query a subset");
    assert_eq!(names(&planets), ["Earth", "Mars"]);
    let planets = Planet::query(executor)
        .filter_not_in(Planet::name, ["Earth", "Mars"])
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query the complement of a subset");
    assert_eq!(names(&planets), ["Mercury", "Proxima b", "Venus"]);
    assert!(
        Planet::query(executor)
            .filter_in(Planet::name, Vec::<String>::new())
            .all()
            .await
            .expect("Failed to query an empty subset")
            .is_empty()
    );
    assert_eq!(
        Planet::query(executor)
            .filter_not_in(Planet::name, Vec::<String>::new())
            .count()
            .await
            .expect("Failed to count the complement of an empty subset"),
        Some(5)
    );

    // Groups
    let planets = Planet::query(executor)
        .filter(Planet::star_id, Comparison::Equals, sun.id)
        .group(Relation::Or, |group| {
            group
                .filter(Planet::name, Comparison::Equals, "Venus")
                .filter(Planet::habitable, Comparison::Equals, true)
        })
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query a group");
    assert_eq!(names(&planets), ["Earth", "Venus"]);
    let planets = Planet::query(executor)
        .filter_by(Filter::or([
            Filter::and([
                Filter::compare(Planet::radius, Comparison::LessThan, 3000),
                Filter::compare(Planet::habitable, Comparison::Equals, false),
            ]),
            Filter::compare(Planet::radius, Comparison::Equals, Value::Null),
        ]))
        .group(Relation::Or, |group| group)
        .sort(Planet::id, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query nested groups");
    assert_eq!(names(&planets), ["Mercury", "Proxima b"]);

    // Sorts and limits
    let planets = Planet::query(executor)
        .sort(Planet::star_id, Direction::Descending)
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to sort by two fields");
    assert_eq!(
        names(&planets),
        ["Proxima b", "Earth", "Mars", "Mercury", "Venus"]
    );
    let planets = Planet::query(executor)
        .sort(Planet::name, Direction::Ascending)
        .limit_offset(2, 1)
        .all()
        .await
        .expect("Failed to query a window");
    assert_eq!(names(&planets), ["Mars", "Mercury"]);
    let first = Planet::query(executor)
        .sort(Planet::name, Direction::Ascending)
        .first()
        .await
        .expect("Failed to query the first planet")
        .expect("There should be a first planet");
    let limited = Planet::query(executor)
        .sort(Planet::name, Direction::Ascending)
        .limit(1)
        .all()
        .await
        .expect("Failed to query one planet");
    assert_eq!(vec![first], limited);
    assert_eq!(
        Planet::query(executor)
            .filter(Planet::name, Comparison::Equals, "Pluto")
            .first()
            .await
            .expect("Failed to look for Pluto"),
        None
    );

    // Distinct
    let planets = Planet::query(executor)
        .filter(Planet::star_id, Comparison::Equals, sun.id)
        .distinct()
        .all()
        .await
        .expect("Failed to query distinct rows");
    assert_eq!(planets.len(), 4);
}

pub async fn pagination<E: Executor>(executor: &mut E) {
    seed(executor).await;
    let page = Planet::query(executor)
        .sort(Planet::name, Direction::Ascending)
        .paginate(2, 2)
        .await
        .expect("Failed to read the second page");
    assert_eq!(names(&page.items), ["Mercury", "Proxima b"]);
    assert_eq!(page.metadata.page, 2);
    assert_eq!(page.metadata.per, 2);
    assert_eq!(page.metadata.total, 5);
    assert_eq!(page.metadata.pages(), 3);
    let page = Planet::query(executor)
        .sort(Planet::name, Direction::Ascending)
        .paginate(3, 2)
        .await
        .expect("Failed to read the last page");
    assert_eq!(names(&page.items), ["Venus"]);
    let page = Planet::query(executor)
        .filter(Planet::habitable, Comparison::Equals, true)
        .paginate(2, 10)
        .await
        .expect("Failed to read a page past the end");
    assert!(page.items.is_empty());
    assert_eq!(page.metadata.total, 1);
    let error = Planet::query(executor)
        .paginate(0, 10)
        .await
        .expect_err("Page zero does not exist");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::InvalidPage { page: 0, per: 10 })
    ));
}
