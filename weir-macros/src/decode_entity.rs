use crate::decode_field::{FieldMetadata, decode_field};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{
    ItemStruct, LitStr, Token, Type,
    meta::ParseNestedMeta,
    parenthesized,
    parse::{Parse, ParseBuffer},
};

pub(crate) struct EntityMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) model: String,
    /// `(left, right)` participants when the entity is a pivot.
    pub(crate) pivot: Option<(Type, Type)>,
    pub(crate) fields: Vec<FieldMetadata>,
}

impl EntityMetadata {
    /// Persisted fields.
    pub(crate) fn columns(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|v| !v.skip)
    }

    pub(crate) fn skipped(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|v| v.skip)
    }

    pub(crate) fn id(&self) -> &FieldMetadata {
        self.columns()
            .find(|v| v.id.is_some())
            .or_else(|| self.columns().find(|v| v.name == "id"))
            .unwrap_or_else(|| {
                panic!(
                    "Entity `{}` needs an identifier, mark one field with `#[weir(id)]`",
                    self.item.ident
                )
            })
    }

    pub(crate) fn find(&self, f: impl Fn(&FieldMetadata) -> bool) -> Option<&FieldMetadata> {
        self.columns().find(|v| f(v))
    }

    /// Foreign keys of a pivot, the fields marked `left` and `right` or else
    /// the ones named after the participants (`planet_id`, `tag_id`).
    pub(crate) fn pivot_keys(&self) -> Option<(&FieldMetadata, &FieldMetadata)> {
        let (left, right) = self.pivot.as_ref()?;
        let key = |ty: &Type, marked: fn(&FieldMetadata) -> bool, side: &str| {
            let name = format!("{}_id", snake_type_name(ty));
            self.find(marked)
                .or_else(|| self.find(|v| v.name == name))
                .unwrap_or_else(|| {
                    panic!(
                        "Pivot `{}` needs a {} key, mark one field with `#[weir({})]` or name it `{}`",
                        self.item.ident, side, side, name
                    )
                })
        };
        let left = key(left, |v| v.left, "left");
        let right = key(right, |v| v.right, "right");
        if left.ident == right.ident {
            panic!(
                "Pivot `{}` uses `{}` as both keys, mark them with `#[weir(left)]` and `#[weir(right)]`",
                self.item.ident, left.ident
            );
        }
        Some((left, right))
    }
}

fn parse_types(arg: &ParseNestedMeta) -> syn::Result<Vec<Type>> {
    let content;
    parenthesized!(content in arg.input);
    Ok(content
        .parse_terminated(Type::parse, Token![,])?
        .into_iter()
        .collect())
}

fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|v| v.ident.to_string())
            .unwrap_or_default(),
        _ => ty.to_token_stream().to_string(),
    }
}

pub(crate) fn decode_entity(item: ItemStruct) -> EntityMetadata {
    let default_name = item.ident.to_string().to_case(Case::Snake);
    let mut name = None;
    let mut model = None;
    let mut pivot = None;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("weir") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `weir`, use it like: `#[weir(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("entity") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `entity`, use it like: `#[weir(entity = \"{}\")]`",
                        default_name
                    );
                };
                name = Some(v.value());
            } else if arg.path.is_ident("model") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `model`, use it like: `#[weir(model = \"{}\")]`",
                        default_name
                    );
                };
                model = Some(v.value());
            } else if arg.path.is_ident("pivot") {
                let types = parse_types(&arg).unwrap_or_default();
                let Ok([left, right]) = <[Type; 2]>::try_from(types) else {
                    panic!("Error while parsing `pivot`, use it like: `#[weir(pivot(Left, Right))]`");
                };
                pivot = Some((left, right));
            } else {
                panic!(
                    "Unknown attribute `{}` inside weir macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    let name = name.unwrap_or_else(|| match &pivot {
        Some((left, right)) => weir_core::pivot_name(
            &type_name(left).to_case(Case::Snake),
            &type_name(right).to_case(Case::Snake),
        ),
        None => default_name.clone(),
    });
    let model = model.unwrap_or(default_name);
    let fields = item.fields.iter().map(decode_field).collect();
    EntityMetadata {
        item,
        name,
        model,
        pivot,
        fields,
    }
}

/// Snake case name of the last segment of `ty`, `Planet` becomes `planet`.
pub(crate) fn snake_type_name(ty: &Type) -> String {
    type_name(ty).to_case(Case::Snake)
}
