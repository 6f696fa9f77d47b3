use crate::{Galaxy, Planet, seed};
use weir::{Comparison, Direction, Entity, Executor, QueryError};

pub async fn soft_delete<E: Executor>(executor: &mut E) {
    let universe = seed(executor).await;
    let mut venus = universe.planets[1].clone();

    // Delete only marks the row
    venus.delete(executor).await.expect("Failed to delete venus");
    assert!(venus.deleted_at.is_some());
    assert_eq!(
        Planet::find(executor, venus.id)
            .await
            .expect("Failed to look for venus"),
        None
    );
    assert_eq!(
        Planet::query(executor)
            .count()
            .await
            .expect("Failed to count the planets"),
        Some(4)
    );
    let stored = Planet::query(executor)
        .with_soft_deleted()
        .filter(Planet::name, Comparison::Equals, "Venus")
        .first()
        .await
        .expect("Failed to read the deleted venus")
        .expect("Venus should still be stored");
    assert_eq!(stored.deleted_at, venus.deleted_at);
    assert_eq!(
        Planet::query(executor)
            .with_soft_deleted()
            .count()
            .await
            .expect("Failed to count every planet"),
        Some(5)
    );

    // Restore
    venus.restore(executor).await.expect("Failed to restore venus");
    assert_eq!(venus.deleted_at, None);
    let stored = Planet::find(executor, venus.id)
        .await
        .expect("Failed to find venus")
        .expect("Venus should be visible again");
    assert_eq!(stored.deleted_at, None);

    // Builder delete marks every matching row
    let result = Planet::query(executor)
        .filter(Planet::radius, Comparison::LessThan, 4000)
        .delete()
        .await
        .expect("Failed to delete the small planets");
    assert_eq!(result.rows_affected, 2);
    let planets = Planet::query(executor)
        .sort(Planet::name, Direction::Ascending)
        .all()
        .await
        .expect("Failed to query the remaining planets");
    assert_eq!(
        planets.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        ["Earth", "Proxima b", "Venus"]
    );
    let deleted = Planet::query(executor)
        .with_soft_deleted()
        .filter(Planet::deleted_at, Comparison::NotEquals, None::<time::PrimitiveDateTime>)
        .count()
        .await
        .expect("Failed to count the deleted planets");
    assert_eq!(deleted, Some(2));

    // Force delete removes the row
    let mut earth = universe.planets[2].clone();
    earth
        .force_delete(executor)
        .await
        .expect("Failed to remove the earth");
    assert_eq!(
        Planet::query(executor)
            .with_soft_deleted()
            .filter(Planet::name, Comparison::Equals, "Earth")
            .first()
            .await
            .expect("Failed to look for the earth"),
        None
    );
    assert!(
        earth.restore(executor).await.is_err(),
        "A removed row cannot be restored"
    );

    // Without a soft delete field delete removes the row
    let mut triangulum = Galaxy::new("Triangulum");
    triangulum
        .save(executor)
        .await
        .expect("Failed to save the galaxy");
    triangulum
        .delete(executor)
        .await
        .expect("Failed to delete the galaxy");
    assert_eq!(
        Galaxy::find(executor, triangulum.id)
            .await
            .expect("Failed to look for the galaxy"),
        None
    );
    let error = triangulum
        .restore(executor)
        .await
        .expect_err("A galaxy cannot be restored");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::InvalidEntity { .. })
    ));
}
