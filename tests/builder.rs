#[cfg(test)]
mod tests {
    use time::PrimitiveDateTime;
    use weir::{
        Comparison, DatabaseQuery, Direction, Entity, FieldRef, Filter, Join, JoinKind, Limit,
        Loaded, QueryError, QueryField, Relation, Scope, Side, Siblings, Sort, Value,
    };
    use weir_memory::{MemoryConnection, MemoryDriver};

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[weir(entity = "captains")]
    struct Captain {
        id: Option<i64>,
        name: String,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[weir(entity = "ships")]
    struct Ship {
        id: Option<i64>,
        name: String,
        #[weir(references = Captain)]
        captain_id: Option<i64>,
        crew: i32,
        #[weir(deleted_at)]
        deleted_at: Option<PrimitiveDateTime>,
        ports: Loaded<Vec<Port>>,
    }

    impl Ship {
        fn new(name: &str, crew: i32) -> Self {
            Self {
                id: None,
                name: name.into(),
                captain_id: None,
                crew,
                deleted_at: None,
                ports: Loaded::NotLoaded,
            }
        }
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[weir(entity = "ports")]
    struct Port {
        id: Option<i64>,
        name: String,
        ships: Loaded<Vec<Ship>>,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[weir(pivot(Ship, Port))]
    struct ShipPort {
        id: Option<i64>,
        ship_id: Option<i64>,
        port_id: Option<i64>,
    }

    async fn connection() -> MemoryConnection {
        let mut connection = MemoryDriver::new().connection();
        Captain::create_table(&mut connection)
            .await
            .expect("Failed to create the captains");
        Ship::create_table(&mut connection)
            .await
            .expect("Failed to create the ships");
        connection
    }

    #[test]
    fn filters_are_qualified() {
        let mut connection = MemoryDriver::new().connection();
        let builder = Ship::query(&mut connection)
            .filter("name", Comparison::Equals, "Argo")
            .filter(Ship::crew, Comparison::GreaterThan, 10)
            .group(Relation::Or, |v| {
                v.filter("crew", Comparison::LessThan, 3)
                    .filter_in(Ship::captain_id, [1i64, 2])
            })
            .sort("name", Direction::Ascending)
            .limit_offset(5, 10);
        let query = builder.query();
        assert_eq!(query.entity, "ships");
        assert_eq!(
            query.filter,
            Filter::and([
                Filter::compare(FieldRef::new("ships", "name"), Comparison::Equals, "Argo"),
                Filter::compare(
                    FieldRef::new("ships", "crew"),
                    Comparison::GreaterThan,
                    10
                ),
                Filter::or([
                    Filter::compare(FieldRef::new("ships", "crew"), Comparison::LessThan, 3),
                    Filter::subset(
                        FieldRef::new("ships", "captain_id"),
                        Scope::In,
                        [1i64, 2]
                    ),
                ]),
            ])
        );
        assert_eq!(
            query.sorts,
            [Sort::new(FieldRef::new("ships", "name"), Direction::Ascending)]
        );
        assert_eq!(
            query.limit,
            Some(Limit {
                count: 5,
                offset: 10
            })
        );
        assert!(query.fields.is_empty());
    }

    #[test]
    fn joins_follow_the_key() {
        let mut connection = MemoryDriver::new().connection();
        let builder = Ship::query(&mut connection).join::<Captain>();
        let query: &DatabaseQuery = builder.query();
        assert_eq!(
            query.joins,
            [Join {
                kind: JoinKind::Inner,
                entity: "captains".into(),
                local: Ship::captain_id,
                foreign: Captain::id,
            }]
        );
        assert_eq!(
            query.fields.iter().map(QueryField::label).collect::<Vec<_>>(),
            [
                "id",
                "name",
                "captain_id",
                "crew",
                "deleted_at",
                "captains_id",
                "captains_name"
            ]
        );
        drop(builder);

        let builder = Captain::query(&mut connection)
            .join::<Ship>()
            .group_by(Captain::id);
        let query = builder.query();
        assert_eq!(query.joins[0].local, Captain::id);
        assert_eq!(query.joins[0].foreign, Ship::captain_id);
        assert_eq!(query.group_by, [FieldRef::new("captains", "id")]);
    }

    #[test]
    fn pivot_sides() {
        Siblings::<Ship, Port, ShipPort>::new(Side::Left, |v| &mut v.ports)
            .validate()
            .expect("Ships are on the left of the pivot");
        Siblings::<Port, Ship, ShipPort>::new(Side::Right, |v| &mut v.ships)
            .validate()
            .expect("Ports are on the right of the pivot");
        let relation = Siblings::<Ship, Port, ShipPort>::new(Side::Right, |v| &mut v.ports);
        let error = relation
            .validate()
            .expect_err("Ships are not on the right of the pivot");
        assert_eq!(
            error.downcast_ref::<QueryError>(),
            Some(&QueryError::InvalidPivot {
                pivot: "port+ship".into(),
                left: "ships".into(),
                right: "ports".into(),
            })
        );
        assert_eq!(relation.local_key(), ShipPort::port_id);
        assert_eq!(relation.foreign_key(), ShipPort::ship_id);
    }

    #[tokio::test]
    async fn terminal_operations() {
        let mut connection = connection().await;
        let result = Captain::query(&mut connection)
            .create([("name", Value::from("Jason"))])
            .await
            .expect("Failed to create a captain");
        assert_eq!(result.rows_affected, 1);
        let jason = result.last_affected_id;
        for (name, crew) in [("Argo", 50), ("Bounty", 46), ("Endurance", 28)] {
            let mut ship = Ship::new(name, crew);
            ship.captain_id = jason;
            ship.save(&mut connection)
                .await
                .expect("Failed to save a ship");
        }

        let last = Ship::query(&mut connection)
            .sort(Ship::name, Direction::Descending)
            .first()
            .await
            .expect("Failed to read the first ship")
            .expect("There are ships");
        assert_eq!(last.name, "Endurance");
        assert_eq!(last.ports, Loaded::NotLoaded);

        let error = Ship::query(&mut connection)
            .paginate(0, 2)
            .await
            .expect_err("Pages start from one");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::InvalidPage { page: 0, per: 2 })
        ));
        let error = Ship::query(&mut connection)
            .paginate(u64::MAX, 2)
            .await
            .expect_err("The offset of the last page does not fit");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::InvalidPage {
                page: u64::MAX,
                per: 2
            })
        ));
        let page = Ship::query(&mut connection)
            .sort(Ship::name, Direction::Ascending)
            .paginate(2, 2)
            .await
            .expect("Failed to read the second page");
        assert_eq!(
            page.items.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["Endurance"]
        );
        assert_eq!(page.metadata.total, 3);
        assert_eq!(page.metadata.pages(), 2);

        let result = Ship::query(&mut connection)
            .filter(Ship::name, Comparison::Equals, "Bounty")
            .update([("crew", Value::from(44))])
            .await
            .expect("Failed to update the bounty");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(
            Ship::query(&mut connection)
                .sum::<i64>(Ship::crew)
                .await
                .expect("Failed to sum the crews"),
            Some(122)
        );

        let error = Ship::query(&mut connection)
            .join::<Captain>()
            .filter(Captain::name, Comparison::Equals, "Jason")
            .delete()
            .await
            .expect_err("A delete cannot join");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::JoinedWrite {
                action: "Update",
                ..
            })
        ));
        let error = Ship::query(&mut connection)
            .join::<Captain>()
            .force_delete()
            .await
            .expect_err("A delete cannot join");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::JoinedWrite {
                action: "Delete",
                ..
            })
        ));
        let error = Ship::query(&mut connection)
            .join::<Captain>()
            .update([("crew", Value::from(0))])
            .await
            .expect_err("An update cannot join");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::JoinedWrite { .. })
        ));
        assert_eq!(
            Ship::query(&mut connection)
                .count()
                .await
                .expect("Failed to count the ships"),
            Some(3)
        );

        let result = Ship::query(&mut connection)
            .filter(Ship::crew, Comparison::LessThan, 45)
            .delete()
            .await
            .expect("Failed to delete the small ships");
        assert_eq!(result.rows_affected, 2);
        assert_eq!(
            Ship::query(&mut connection)
                .count()
                .await
                .expect("Failed to count the ships"),
            Some(1)
        );
        assert_eq!(
            Ship::query(&mut connection)
                .with_soft_deleted()
                .count()
                .await
                .expect("Failed to count every ship"),
            Some(3)
        );
        let result = Ship::query(&mut connection)
            .force_delete()
            .await
            .expect("Failed to remove the ships");
        assert_eq!(result.rows_affected, 3);
    }
}
