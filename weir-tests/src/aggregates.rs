use crate::{Planet, Star, seed};
use weir::{AggregateFunction, Comparison, Entity, Executor};

pub async fn aggregates<E: Executor>(executor: &mut E) {
    let universe = seed(executor).await;
    let sun = &universe.stars[0];

    assert_eq!(
        Planet::query(executor)
            .count()
            .await
            .expect("Failed to count the planets"),
        Some(5)
    );
    assert_eq!(
        Planet::query(executor)
            .filter(Planet::star_id, Comparison::Equals, sun.id)
            .count()
            .await
            .expect("Failed to count the planets of the sun"),
        Some(4)
    );
    assert_eq!(
        Planet::query(executor)
            .aggregate::<i64>(AggregateFunction::Count, Some(Planet::radius))
            .await
            .expect("Failed to count the radii"),
        Some(4)
    );

    let mass = Star::query(executor)
        .sum::<f64>(Star::mass)
        .await
        .expect("Failed to sum the masses")
        .expect("The stars have a total mass");
    assert!((mass - 6.98).abs() < 1e-9);
    let average = Star::query(executor)
        .filter(Star::galaxy_id, Comparison::Equals, universe.galaxies[0].id)
        .avg::<f64>(Star::mass)
        .await
        .expect("Failed to average the masses")
        .expect("The milky way has stars");
    assert!((average - 3.18 / 3.0).abs() < 1e-9);
    assert_eq!(
        Star::query(executor)
            .min::<f64>(Star::mass)
            .await
            .expect("Failed to read the lightest star"),
        Some(0.12)
    );
    assert_eq!(
        Star::query(executor)
            .max::<String>(Star::name)
            .await
            .expect("Failed to read the last name"),
        Some("Sun".to_string())
    );
    assert_eq!(
        Star::query(executor)
            .sum::<i64>(Star::id)
            .await
            .expect("Failed to sum the identifiers"),
        Some(universe.stars.iter().filter_map(|v| v.id).sum())
    );

    // Nothing to aggregate
    assert_eq!(
        Planet::query(executor)
            .filter(Planet::name, Comparison::Equals, "Pluto")
            .sum::<f64>(Planet::radius)
            .await
            .expect("Failed to sum an empty selection"),
        None
    );
    assert_eq!(
        Planet::query(executor)
            .filter(Planet::name, Comparison::Equals, "Pluto")
            .count()
            .await
            .expect("Failed to count an empty selection"),
        Some(0)
    );

    // Results that do not fit the requested type are discarded
    assert_eq!(
        Planet::query(executor)
            .avg::<i8>(Planet::radius)
            .await
            .expect("Failed to average the radii"),
        None
    );
}
