#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use time::{PrimitiveDateTime, macros::datetime};
    use uuid::Uuid;
    use weir::{Entity, FieldRef, IdType, Loaded, Pivot, RowLabeled, Value, pivot_name};

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[weir(entity = "authors")]
    struct Author {
        id: Option<i64>,
        #[weir(name = "full_name", unique)]
        name: String,
        nickname: Option<String>,
        #[weir(skip)]
        cache: Vec<u8>,
        books: Loaded<Vec<Book>>,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[weir(entity = "books", model = "volume")]
    struct Book {
        #[weir(id = "generated")]
        code: Option<Uuid>,
        title: String,
        #[weir(default = 100)]
        pages: i32,
        #[weir(references = Author)]
        author_id: Option<i64>,
        #[weir(created_at)]
        created_at: Option<PrimitiveDateTime>,
        #[weir(deleted_at)]
        removed_at: Option<PrimitiveDateTime>,
    }

    #[derive(Entity, Debug, Clone, PartialEq, Default)]
    #[weir(pivot(Book, Author))]
    struct Authorship {
        id: Option<i64>,
        author_id: Option<i64>,
        book_id: Option<Uuid>,
        role: Option<String>,
    }

    #[derive(Entity)]
    struct LineItem {
        #[weir(id = "supplied")]
        sku: String,
        quantity: u32,
    }

    fn row(labels: &[&str], values: Vec<Value>) -> RowLabeled {
        RowLabeled::new(
            labels.iter().map(|v| v.to_string()).collect::<Arc<[_]>>(),
            values.into(),
        )
    }

    #[test]
    fn entity_definition() {
        let def = Author::entity();
        assert_eq!(def.name, "authors");
        assert_eq!(def.model, "author");
        assert_eq!(def.id_key, "id");
        assert!(matches!(def.id_type, IdType::Autoincrement));
        assert_eq!(
            def.fields.iter().map(|v| &*v.name).collect::<Vec<_>>(),
            ["id", "full_name", "nickname"]
        );
        let id = &def.fields[0];
        assert!(id.primary_key && id.auto_increment && !id.nullable);
        assert_eq!(id.value, Value::Int64(None));
        let name = &def.fields[1];
        assert!(name.unique && !name.nullable && !name.primary_key);
        assert_eq!(name.value, Value::Varchar(None));
        assert!(def.fields[2].nullable);
        assert_eq!(def.created_at, None);
        assert_eq!(def.deleted_at, None);
        def.validate().expect("The author definition should be valid");
        assert_eq!(Author::NAME, "authors");
        assert_eq!(Author::ID_KEY, "id");
    }

    #[test]
    fn field_constants() {
        assert_eq!(Author::name, FieldRef::new("authors", "full_name"));
        assert_eq!(Book::author_id, FieldRef::new("books", "author_id"));
        assert_eq!(LineItem::sku, FieldRef::new("line_item", "sku"));
        assert_eq!(Book::entity().id_ref(), Book::code);
    }

    #[test]
    fn field_attributes() {
        let def = Book::entity();
        assert_eq!(def.model, "volume");
        assert_eq!(def.id_key, "code");
        let IdType::Generated(generate) = def.id_type else {
            panic!("The book code should be generated");
        };
        assert!(matches!(generate(), Value::Uuid(Some(..))));
        let code = def.field("code").expect("The code field exists");
        assert!(code.primary_key && !code.auto_increment);
        let pages = def.field("pages").expect("The pages field exists");
        assert_eq!(pages.default, Some(Value::Int32(Some(100))));
        assert_eq!(pages.value, Value::Int32(None));
        let author_id = def.field("author_id").expect("The author_id field exists");
        assert_eq!(
            author_id.references,
            Some(FieldRef::new("authors", "id"))
        );
        assert!(author_id.nullable);
        assert_eq!(def.created_at.as_deref(), Some("created_at"));
        assert_eq!(def.updated_at, None);
        assert_eq!(def.deleted_at.as_deref(), Some("removed_at"));

        let def = LineItem::entity();
        assert!(matches!(def.id_type, IdType::Supplied));
        assert_eq!(def.id_key, "sku");
        assert_eq!(def.name, "line_item");
    }

    #[test]
    fn pivot() {
        assert_eq!(Authorship::NAME, "author+book");
        assert_eq!(pivot_name("book", "author"), pivot_name("author", "book"));
        assert_eq!(Authorship::left_key(), FieldRef::new("author+book", "book_id"));
        assert_eq!(Authorship::right_key(), FieldRef::new("author+book", "author_id"));
        let def = Authorship::entity();
        assert_eq!(
            def.field("book_id").and_then(|v| v.references.clone()),
            Some(FieldRef::new("books", "code"))
        );
        assert_eq!(
            def.field("author_id").and_then(|v| v.references.clone()),
            Some(FieldRef::new("authors", "id"))
        );
        let code = Uuid::new_v4();
        let pivot = Authorship::from_keys(Value::Uuid(Some(code)), Value::Int64(Some(3)))
            .expect("Failed to build the pivot from its keys");
        assert_eq!(
            pivot,
            Authorship {
                author_id: Some(3),
                book_id: Some(code),
                ..Default::default()
            }
        );
        assert!(
            Authorship::from_keys(Value::Varchar(Some("nope".into())), Value::Int64(Some(1)))
                .is_err()
        );
    }

    #[test]
    fn from_row() {
        let author = Author::from_row(row(
            &["id", "full_name", "nickname", "unknown"],
            vec![
                Value::Int64(Some(1)),
                Value::Varchar(Some("Ursula K. Le Guin".into())),
                Value::Null,
                Value::Boolean(Some(true)),
            ],
        ))
        .expect("Failed to decode an author");
        assert_eq!(author.id, Some(1));
        assert_eq!(author.name, "Ursula K. Le Guin");
        assert_eq!(author.nickname, None);
        assert!(author.cache.is_empty());
        assert_eq!(author.books, Loaded::NotLoaded);

        // First label wins, integers of any width decode
        let author = Author::from_row(row(
            &["full_name", "id", "nickname", "id"],
            vec![
                Value::Varchar(Some("Octavia E. Butler".into())),
                Value::Int32(Some(2)),
                Value::Varchar(Some("Octavia".into())),
                Value::Int64(Some(99)),
            ],
        ))
        .expect("Failed to decode an author");
        assert_eq!(author.id, Some(2));
        assert_eq!(author.nickname.as_deref(), Some("Octavia"));

        let error = Author::from_row(row(&["id"], vec![Value::Int64(Some(1))]))
            .expect_err("The name column is missing");
        assert!(format!("{:#}", error).contains("full_name"));
        let error = Author::from_row(row(
            &["id", "full_name", "nickname"],
            vec![
                Value::Varchar(Some("one".into())),
                Value::Varchar(Some("Someone".into())),
                Value::Null,
            ],
        ))
        .expect_err("The identifier is not a number");
        assert!(format!("{:#}", error).contains("While decoding column `id` of `Author`"));

        // Text columns are parsed
        let book = Book::from_row(row(
            &["code", "title", "pages", "author_id", "created_at", "removed_at"],
            vec![
                Value::Varchar(Some("67e55044-10b1-426f-9247-bb680e5fe0c8".into())),
                Value::Varchar(Some("Kindred".into())),
                Value::Int64(Some(264)),
                Value::Int64(Some(2)),
                Value::Varchar(Some("1979-06-01 10:30:00.000000".into())),
                Value::Null,
            ],
        ))
        .expect("Failed to decode a book");
        assert_eq!(
            book.code.map(|v| v.to_string()).as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert_eq!(book.pages, 264);
        assert_eq!(book.created_at, Some(datetime!(1979-06-01 10:30:00)));
    }

    #[test]
    fn reflection() {
        let mut book = Book {
            code: None,
            title: "The Dispossessed".into(),
            pages: 387,
            author_id: Some(1),
            created_at: None,
            removed_at: None,
        };
        assert!(book.id().is_null());
        assert_eq!(
            book.row().into_iter().map(|(v, _)| v).collect::<Vec<_>>(),
            ["code", "title", "pages", "author_id", "created_at", "removed_at"]
        );
        assert_eq!(book.get("pages"), Some(Value::Int32(Some(387))));
        assert_eq!(book.get("missing"), None);
        let code = Uuid::new_v4();
        book.set_id(Value::Uuid(Some(code)))
            .expect("Failed to set the code");
        assert_eq!(book.code, Some(code));
        book.set_field("pages", Value::Int64(Some(400)))
            .expect("Failed to set the pages");
        assert_eq!(book.pages, 400);
        let error = book
            .set_field("isbn", Value::Null)
            .expect_err("Books have no isbn");
        assert_eq!(error.to_string(), "Entity `books` has no field `isbn`");
    }
}
