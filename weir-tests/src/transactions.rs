use crate::{Galaxy, Recorder, seed, silent_logs};
use weir::{Comparison, Connection, Entity, Error, Executor, Transaction};

async fn galaxies<E: Executor>(executor: &mut E) -> Option<i64> {
    Galaxy::query(executor)
        .count()
        .await
        .expect("Failed to count the galaxies")
}

pub async fn transactions<C: Connection>(recorder: &mut Recorder<C>) {
    seed(recorder).await;
    let connection = &mut recorder.inner;
    assert_eq!(galaxies(connection).await, Some(2));

    // Failing closure, everything it saved is rolled back
    let result = connection
        .transaction(|transaction| {
            Box::pin(async move {
                for name in ["Triangulum", "Whirlpool"] {
                    Galaxy::new(name).save(transaction).await?;
                }
                assert_eq!(galaxies(transaction).await, Some(4));
                Err::<(), _>(Error::msg("Undo the new galaxies"))
            })
        })
        .await;
    assert!(result.is_err());
    assert_eq!(galaxies(connection).await, Some(2));

    // Failing statement
    silent_logs! {
        let result = connection
            .transaction(|transaction| {
                Box::pin(async move {
                    Galaxy::new("Sombrero").save(transaction).await?;
                    Galaxy::new("Milky Way").save(transaction).await
                })
            })
            .await;
        assert!(result.is_err(), "The second Milky Way breaks the unique name");
    }
    assert_eq!(galaxies(connection).await, Some(2));

    // Commit
    let triangulum = connection
        .transaction(|transaction| {
            Box::pin(async move {
                let mut galaxy = Galaxy::new("Triangulum");
                galaxy.save(transaction).await?;
                Ok::<_, Error>(galaxy)
            })
        })
        .await
        .expect("Failed to commit the transaction");
    assert_eq!(galaxies(connection).await, Some(3));
    let stored = Galaxy::find(connection, triangulum.id)
        .await
        .expect("Failed to find the committed galaxy")
        .expect("The committed galaxy should exist");
    assert_eq!(stored, triangulum);

    // Explicit rollback
    let mut transaction = connection
        .begin()
        .await
        .expect("Failed to begin a transaction");
    Galaxy::query(&mut transaction)
        .filter(Galaxy::name, Comparison::Equals, "Triangulum")
        .force_delete()
        .await
        .expect("Failed to delete the galaxy");
    assert_eq!(galaxies(&mut transaction).await, Some(2));
    transaction
        .rollback()
        .await
        .expect("Failed to roll back the transaction");
    assert_eq!(galaxies(connection).await, Some(3));

    // Dropped without commit
    let mut transaction = connection
        .begin()
        .await
        .expect("Failed to begin a transaction");
    Galaxy::new("Whirlpool")
        .save(&mut transaction)
        .await
        .expect("Failed to save the galaxy");
    drop(transaction);
    assert_eq!(galaxies(connection).await, Some(3));

    // Explicit commit
    let mut transaction = connection
        .begin()
        .await
        .expect("Failed to begin a transaction");
    Galaxy::new("Whirlpool")
        .save(&mut transaction)
        .await
        .expect("Failed to save the galaxy");
    transaction
        .commit()
        .await
        .expect("Failed to commit the transaction");
    assert_eq!(galaxies(connection).await, Some(4));
}
