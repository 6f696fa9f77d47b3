use crate::{Galaxy, Planet, Star, seed};
use weir::{Comparison, Direction, Entity, Executor, JoinKind, QueryError, Value};

pub async fn joins<E: Executor>(executor: &mut E) {
    seed(executor).await;

    // The planet holds the key
    let pairs = Planet::query(executor)
        .join::<Star>()
        .sort(Planet::id, Direction::Ascending)
        .all_joined::<Star>()
        .await
        .expect("Failed to join the planets with their star");
    assert_eq!(
        pairs
            .iter()
            .map(|(planet, star)| (planet.name.as_str(), star.name.as_str()))
            .collect::<Vec<_>>(),
        [
            ("Mercury", "Sun"),
            ("Venus", "Sun"),
            ("Earth", "Sun"),
            ("Mars", "Sun"),
            ("Proxima b", "Proxima Centauri"),
        ]
    );
    assert!(pairs.iter().all(|(planet, star)| planet.star_id == star.id));

    // Filter and sort on the joined entity
    let planets = Planet::query(executor)
        .join::<Star>()
        .filter(Star::mass, Comparison::LessThan, 0.5)
        .all()
        .await
        .expect("Failed to filter on the star");
    assert_eq!(
        planets.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Proxima b"]
    );
    let stars = Star::query(executor)
        .join::<Galaxy>()
        .filter(Galaxy::name, Comparison::Equals, "Andromeda")
        .all()
        .await
        .expect("Failed to filter on the galaxy");
    assert_eq!(
        stars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Alpheratz"]
    );
    assert_eq!(
        Planet::query(executor)
            .join::<Star>()
            .filter(Star::name, Comparison::Equals, "Sun")
            .count()
            .await
            .expect("Failed to count the planets of the sun"),
        Some(4)
    );

    // The other entity holds the key
    let stars = Star::query(executor)
        .join::<Planet>()
        .group_by(Star::id)
        .sort(Star::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to group the stars with planets");
    assert_eq!(
        stars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Proxima Centauri", "Sun"]
    );

    // Left join keeps the stars without planets
    let stars = Star::query(executor)
        .join_on::<Planet>(JoinKind::Left, Star::id, Planet::star_id)
        .filter(Planet::id, Comparison::Equals, Value::Null)
        .sort(Star::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query the stars without planets");
    assert_eq!(
        stars.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Alpheratz", "Sirius"]
    );

    // Fields of an entity that was never joined
    let error = Planet::query(executor)
        .filter(Galaxy::name, Comparison::Equals, "Milky Way")
        .all()
        .await
        .expect_err("A galaxy field cannot filter the planets alone");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::UnresolvedField { .. })
    ));
}
