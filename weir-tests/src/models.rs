use time::PrimitiveDateTime;
use uuid::Uuid;
use weir::{Children, Entity, Loaded, Parent, Side, Siblings};

#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(entity = "galaxies")]
pub struct Galaxy {
    pub id: Option<i64>,
    #[weir(unique)]
    pub name: String,
    pub stars: Loaded<Vec<Star>>,
}

impl Galaxy {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.into(),
            stars: Loaded::NotLoaded,
        }
    }

    pub fn stars() -> Children<Galaxy, Star> {
        Children::new(Star::galaxy_id, |v| &mut v.stars)
    }
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(entity = "stars")]
pub struct Star {
    #[weir(id)]
    pub id: Option<i64>,
    pub name: String,
    pub mass: f64,
    #[weir(references = Galaxy)]
    pub galaxy_id: Option<i64>,
    pub galaxy: Loaded<Option<Galaxy>>,
    pub planets: Loaded<Vec<Planet>>,
}

impl Star {
    pub fn new(name: &str, mass: f64, galaxy: &Galaxy) -> Self {
        Self {
            id: None,
            name: name.into(),
            mass,
            galaxy_id: galaxy.id,
            galaxy: Loaded::NotLoaded,
            planets: Loaded::NotLoaded,
        }
    }

    pub fn galaxy() -> Parent<Star, Galaxy> {
        Parent::new(Star::galaxy_id, |v| &mut v.galaxy)
    }

    pub fn planets() -> Children<Star, Planet> {
        Children::new(Planet::star_id, |v| &mut v.planets)
    }
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(entity = "planets")]
pub struct Planet {
    pub id: Option<i64>,
    pub name: String,
    pub radius: Option<f64>,
    #[weir(default = false)]
    pub habitable: bool,
    #[weir(references = Star)]
    pub star_id: Option<i64>,
    #[weir(created_at)]
    pub created_at: Option<PrimitiveDateTime>,
    #[weir(updated_at)]
    pub updated_at: Option<PrimitiveDateTime>,
    #[weir(deleted_at)]
    pub deleted_at: Option<PrimitiveDateTime>,
    pub star: Loaded<Option<Star>>,
    pub tags: Loaded<Vec<Tag>>,
}

impl Planet {
    pub fn new(name: &str, radius: Option<f64>, star: &Star) -> Self {
        Self {
            id: None,
            name: name.into(),
            radius,
            habitable: false,
            star_id: star.id,
            created_at: None,
            updated_at: None,
            deleted_at: None,
            star: Loaded::NotLoaded,
            tags: Loaded::NotLoaded,
        }
    }

    pub fn star() -> Parent<Planet, Star> {
        Parent::new(Planet::star_id, |v| &mut v.star)
    }

    pub fn tags() -> Siblings<Planet, Tag, PlanetTag> {
        Siblings::new(Side::Left, |v| &mut v.tags)
    }
}

#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(entity = "tags")]
pub struct Tag {
    #[weir(id = "generated")]
    pub id: Option<Uuid>,
    #[weir(unique)]
    pub name: String,
    pub planets: Loaded<Vec<Planet>>,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.into(),
            planets: Loaded::NotLoaded,
        }
    }

    pub fn planets() -> Siblings<Tag, Planet, PlanetTag> {
        Siblings::new(Side::Right, |v| &mut v.planets)
    }
}

/// Pivot between planets and tags, named `planet+tag`.
#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(pivot(Planet, Tag))]
pub struct PlanetTag {
    pub id: Option<i64>,
    pub planet_id: Option<i64>,
    pub tag_id: Option<Uuid>,
}

/// Raw readings of a star.
#[derive(Entity, Debug, Clone, PartialEq)]
#[weir(entity = "observations")]
pub struct Observation {
    pub id: Option<i64>,
    pub star_id: Option<i64>,
    pub spectrum: Vec<u8>,
}

/// Drops and creates every model of the suite, parents first.
pub async fn create_tables<E: weir::Executor>(executor: &mut E) {
    for result in [
        PlanetTag::drop_table(executor).await,
        Tag::drop_table(executor).await,
        Planet::drop_table(executor).await,
        Star::drop_table(executor).await,
        Galaxy::drop_table(executor).await,
    ] {
        result.expect("Failed to drop the tables");
    }
    Galaxy::create_table(executor)
        .await
        .expect("Failed to create the galaxies");
    Star::create_table(executor)
        .await
        .expect("Failed to create the stars");
    Planet::create_table(executor)
        .await
        .expect("Failed to create the planets");
    Tag::create_table(executor)
        .await
        .expect("Failed to create the tags");
    PlanetTag::create_table(executor)
        .await
        .expect("Failed to create the pivot between planets and tags");
}

/// Rows shared by the scenarios.
pub struct Universe {
    pub galaxies: Vec<Galaxy>,
    pub stars: Vec<Star>,
    pub planets: Vec<Planet>,
}

/// Recreates the tables and fills them with two galaxies, four stars and five planets.
///
/// Stars: Sun, Sirius, Proxima Centauri (Milky Way) and Alpheratz
/// (Andromeda). Planets: Mercury, Venus, Earth, Mars (Sun) and Proxima b.
pub async fn seed<E: weir::Executor>(executor: &mut E) -> Universe {
    create_tables(executor).await;
    let mut galaxies = vec![Galaxy::new("Milky Way"), Galaxy::new("Andromeda")];
    for galaxy in &mut galaxies {
        galaxy.save(executor).await.expect("Failed to save a galaxy");
    }
    let mut stars = vec![
        Star::new("Sun", 1.0, &galaxies[0]),
        Star::new("Sirius", 2.06, &galaxies[0]),
        Star::new("Proxima Centauri", 0.12, &galaxies[0]),
        Star::new("Alpheratz", 3.8, &galaxies[1]),
    ];
    for star in &mut stars {
        star.save(executor).await.expect("Failed to save a star");
    }
    let mut planets = vec![
        Planet::new("Mercury", Some(2439.7), &stars[0]),
        Planet::new("Venus", Some(6051.8), &stars[0]),
        Planet {
            habitable: true,
            ..Planet::new("Earth", Some(6371.0), &stars[0])
        },
        Planet::new("Mars", Some(3389.5), &stars[0]),
        Planet::new("Proxima b", None, &stars[2]),
    ];
    for planet in &mut planets {
        planet.save(executor).await.expect("Failed to save a planet");
    }
    Universe {
        galaxies,
        stars,
        planets,
    }
}
