use crate::{Galaxy, Observation, Planet, Star, Tag, create_tables, silent_logs};
use weir::{Comparison, Entity, Executor, QueryError, Value};

pub async fn crud<E: Executor>(executor: &mut E) {
    create_tables(executor).await;

    // Insert
    let mut galaxy = Galaxy::new("Milky Way");
    galaxy.save(executor).await.expect("Failed to save the galaxy");
    let galaxy_id = galaxy.id.expect("The galaxy should have an id after saving");
    let mut sun = Star::new("Sun", 1.0, &galaxy);
    sun.save(executor).await.expect("Failed to save the sun");
    assert_ne!(sun.id, None);
    assert_eq!(sun.galaxy_id, Some(galaxy_id));

    // Find
    let found = Galaxy::find(executor, galaxy_id)
        .await
        .expect("Failed to find the galaxy")
        .expect("The galaxy should exist");
    assert_eq!(found, galaxy);
    assert_eq!(
        Galaxy::find(executor, galaxy_id + 100)
            .await
            .expect("Failed to look for a missing galaxy"),
        None
    );

    // Timestamps
    let mut earth = Planet::new("Earth", Some(6371.0), &sun);
    earth.save(executor).await.expect("Failed to save the earth");
    let created_at = earth.created_at.expect("created_at should be stamped");
    assert_eq!(earth.updated_at, Some(created_at));
    let stored = Planet::find(executor, earth.id)
        .await
        .expect("Failed to find the earth")
        .expect("The earth should exist");
    assert_eq!(stored, earth);
    assert!(!stored.habitable);

    // Update
    earth.habitable = true;
    earth.radius = Some(6371.1);
    earth.save(executor).await.expect("Failed to update the earth");
    assert_eq!(earth.created_at, Some(created_at));
    assert!(earth.updated_at >= Some(created_at));
    let stored = Planet::find(executor, earth.id)
        .await
        .expect("Failed to find the earth")
        .expect("The earth should exist");
    assert!(stored.habitable);
    assert_eq!(stored.radius, Some(6371.1));
    assert_eq!(stored.created_at, Some(created_at));
    assert_eq!(
        Planet::query(executor)
            .count()
            .await
            .expect("Failed to count the planets"),
        Some(1)
    );

    // Generated identifiers
    let mut rocky = Tag::new("rocky");
    rocky.save(executor).await.expect("Failed to save a tag");
    let id = rocky.id.expect("The tag id should be generated");
    let stored = Tag::find(executor, id)
        .await
        .expect("Failed to find the tag")
        .expect("The tag should exist");
    assert_eq!(stored.name, "rocky");

    // Binary values
    Observation::drop_table(executor)
        .await
        .expect("Failed to drop the observations");
    Observation::create_table(executor)
        .await
        .expect("Failed to create the observations");
    let mut observation = Observation {
        id: None,
        star_id: sun.id,
        spectrum: vec![0, 159, 146, 150, 255, 0],
    };
    observation
        .save(executor)
        .await
        .expect("Failed to save an observation");
    let stored = Observation::find(executor, observation.id)
        .await
        .expect("Failed to find the observation")
        .expect("The observation should exist");
    assert_eq!(stored, observation);

    // Unique fields
    silent_logs! {
        assert!(
            Tag::new("rocky").save(executor).await.is_err(),
            "A second tag named rocky should be rejected"
        );
    }

    // Builder create and update
    Galaxy::query(executor)
        .create([("name", Value::from("Andromeda"))])
        .await
        .expect("Failed to create a galaxy");
    let result = Galaxy::query(executor)
        .filter(Galaxy::name, Comparison::Equals, "Andromeda")
        .update([("name", Value::from("Messier 31"))])
        .await
        .expect("Failed to rename the galaxy");
    assert_eq!(result.rows_affected, 1);
    let renamed = Galaxy::query(executor)
        .filter(Galaxy::name, Comparison::Equals, "Messier 31")
        .first()
        .await
        .expect("Failed to query the renamed galaxy");
    assert!(renamed.is_some());
    silent_logs! {
        assert!(
            Galaxy::query(executor)
                .update([("name", Value::from("Same"))])
                .await
                .is_err(),
            "Two galaxies cannot share the same name"
        );
    }
    let mut names = Galaxy::query(executor)
        .all()
        .await
        .expect("Failed to query the galaxies")
        .into_iter()
        .map(|v| v.name)
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, ["Messier 31", "Milky Way"]);
    let error = Galaxy::query(executor)
        .update(Vec::<(&'static str, Value)>::new())
        .await
        .expect_err("An update without fields must fail");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::EmptyPayload { .. })
    ));

    // Delete
    earth
        .force_delete(executor)
        .await
        .expect("Failed to delete the earth");
    assert_eq!(
        Planet::query(executor)
            .with_soft_deleted()
            .count()
            .await
            .expect("Failed to count the planets"),
        Some(0)
    );
    silent_logs! {
        assert!(
            earth.force_delete(executor).await.is_err(),
            "Deleting twice should report that nothing was deleted"
        );
    }
    let error = Planet::new("Mars", None, &sun)
        .force_delete(executor)
        .await
        .expect_err("A model without id cannot be deleted");
    assert!(matches!(
        error.downcast_ref::<QueryError>(),
        Some(QueryError::MissingId { .. })
    ));
}
