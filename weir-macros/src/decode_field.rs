use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{Expr, Field, Ident, LitStr, Path, Type, parse::ParseBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdKind {
    Autoincrement,
    Generated,
    Supplied,
}

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) id: Option<IdKind>,
    pub(crate) id_generator: Option<Path>,
    pub(crate) unique: bool,
    pub(crate) skip: bool,
    pub(crate) references: Option<Type>,
    pub(crate) default: Option<TokenStream>,
    pub(crate) left: bool,
    pub(crate) right: bool,
    pub(crate) created_at: bool,
    pub(crate) updated_at: bool,
    pub(crate) deleted_at: bool,
}

/// `Loaded<..>` fields hold eager loaded relations and are never persisted.
fn is_loaded(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|v| v.ident == "Loaded")
}

fn flag(arg: &syn::meta::ParseNestedMeta, name: &str) {
    // value() is Err for Meta::Path
    let Err(..) = arg.value() else {
        panic!(
            "Error while parsing `{}`, use it like: `#[weir({})]`",
            name, name
        );
    };
}

pub(crate) fn decode_field(field: &Field) -> FieldMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Entity fields are expected to have a name");
    let mut metadata = FieldMetadata {
        name: ident.to_string().trim_start_matches("r#").to_string(),
        ident,
        ty: field.ty.clone(),
        id: None,
        id_generator: None,
        unique: false,
        skip: is_loaded(&field.ty),
        references: None,
        default: None,
        left: false,
        right: false,
        created_at: false,
        updated_at: false,
        deleted_at: false,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("weir") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `weir`, use it like: `#[weir(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("id") {
                metadata.id = Some(match arg.value() {
                    Err(..) => IdKind::Autoincrement,
                    Ok(v) => {
                        let Ok(v) = v.parse::<LitStr>() else {
                            panic!("Error while parsing `id`, use it like: `#[weir(id = \"generated\")]`");
                        };
                        match v.value().as_str() {
                            "autoincrement" => IdKind::Autoincrement,
                            "generated" => IdKind::Generated,
                            "supplied" => IdKind::Supplied,
                            other => panic!(
                                "Unknown id type `{}`, expected one of `autoincrement`, `generated`, `supplied`",
                                other
                            ),
                        }
                    }
                });
            } else if arg.path.is_ident("id_generator") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Path>) else {
                    panic!("Error while parsing `id_generator`, use it like: `#[weir(id = \"generated\", id_generator = my_module::new_id)]`");
                };
                metadata.id_generator = Some(v);
            } else if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[weir(name = \"my_field\")]`");
                };
                metadata.name = v.value();
            } else if arg.path.is_ident("unique") {
                flag(&arg, "unique");
                metadata.unique = true;
            } else if arg.path.is_ident("skip") {
                flag(&arg, "skip");
                metadata.skip = true;
            } else if arg.path.is_ident("references") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Type>) else {
                    panic!("Error while parsing `references`, use it like: `#[weir(references = Star)]`");
                };
                metadata.references = Some(v);
            } else if arg.path.is_ident("default") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                    panic!("Error while parsing `default`, use it like: `#[weir(default = some_expression)]`");
                };
                metadata.default = Some(v.to_token_stream());
            } else if arg.path.is_ident("left") {
                flag(&arg, "left");
                metadata.left = true;
            } else if arg.path.is_ident("right") {
                flag(&arg, "right");
                metadata.right = true;
            } else if arg.path.is_ident("created_at") {
                flag(&arg, "created_at");
                metadata.created_at = true;
            } else if arg.path.is_ident("updated_at") {
                flag(&arg, "updated_at");
                metadata.updated_at = true;
            } else if arg.path.is_ident("deleted_at") {
                flag(&arg, "deleted_at");
                metadata.deleted_at = true;
            } else {
                panic!(
                    "Unknown attribute `{}` inside weir macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    if metadata.id_generator.is_some() && metadata.id != Some(IdKind::Generated) {
        panic!(
            "Field `{}` has an `id_generator` but is not a generated id, use it like: `#[weir(id = \"generated\", id_generator = path)]`",
            metadata.ident
        );
    }
    metadata
}
