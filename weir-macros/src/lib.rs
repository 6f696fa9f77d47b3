mod decode_entity;
mod decode_field;
mod encode_field_def;
mod from_row_trait;
mod pivot_trait;

use decode_entity::decode_entity;
use decode_field::IdKind;
use encode_field_def::encode_field_def;
use from_row_trait::from_row_trait;
use pivot_trait::pivot_trait;
use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `weir::Entity` (and `weir::Pivot` for `#[weir(pivot(L, R))]`).
///
/// Every persisted field also becomes an associated `FieldRef` constant
/// named like the field: `Planet::name`.
#[proc_macro_derive(Entity, attributes(weir))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    let entity = decode_entity(item);
    let struct_name = &entity.item.ident;
    let (entity_name, model_name) = (&entity.name, &entity.model);
    let id = entity.id();
    let (id_ident, id_ty, id_name) = (&id.ident, &id.ty, &id.name);
    let id_type = match id.id.unwrap_or(IdKind::Autoincrement) {
        IdKind::Autoincrement => quote!(::weir::IdType::Autoincrement),
        IdKind::Generated => {
            let generator = id
                .id_generator
                .as_ref()
                .map(|v| quote!(#v))
                .unwrap_or(quote!(::weir::generate_uuid));
            quote!(::weir::IdType::Generated(#generator))
        }
        IdKind::Supplied => quote!(::weir::IdType::Supplied),
    };
    let timestamp = |marked: fn(&decode_field::FieldMetadata) -> bool| match entity.find(marked) {
        Some(v) => {
            let name = &v.name;
            quote!(Some(::std::borrow::Cow::Borrowed(#name)))
        }
        None => quote!(None),
    };
    let created_at = timestamp(|v| v.created_at);
    let updated_at = timestamp(|v| v.updated_at);
    let deleted_at = timestamp(|v| v.deleted_at);
    let field_defs = entity.columns().map(|v| encode_field_def(v, &entity));
    let constants = entity.columns().map(|v| {
        let ident = &v.ident;
        let name = &v.name;
        quote!(pub const #ident: ::weir::FieldRef = ::weir::FieldRef::new(#entity_name, #name);)
    });
    let row = entity.columns().map(|v| {
        let ident = &v.ident;
        let name = &v.name;
        quote!((#name, ::weir::AsValue::as_value(::std::clone::Clone::clone(&self.#ident))))
    });
    let set_field = entity.columns().map(|v| {
        let ident = &v.ident;
        let ty = &v.ty;
        let name = &v.name;
        quote!(#name => self.#ident = <#ty as ::weir::AsValue>::try_from_value(value)?,)
    });
    let from_row = from_row_trait(&entity);
    let pivot = pivot_trait(&entity);
    quote! {
        #[allow(non_upper_case_globals)]
        impl #struct_name {
            #(#constants)*
        }

        impl ::weir::Entity for #struct_name {
            const NAME: &'static str = #entity_name;
            const ID_KEY: &'static str = #id_name;

            fn entity() -> &'static ::weir::EntityDef {
                static ENTITY: ::std::sync::LazyLock<::weir::EntityDef> =
                    ::std::sync::LazyLock::new(|| ::weir::EntityDef {
                        name: ::std::borrow::Cow::Borrowed(#entity_name),
                        model: ::std::borrow::Cow::Borrowed(#model_name),
                        id_key: ::std::borrow::Cow::Borrowed(#id_name),
                        id_type: #id_type,
                        fields: vec![#(#field_defs),*],
                        created_at: #created_at,
                        updated_at: #updated_at,
                        deleted_at: #deleted_at,
                    });
                &ENTITY
            }

            #from_row

            fn row(&self) -> Vec<(&'static str, ::weir::Value)> {
                vec![#(#row),*]
            }

            fn id(&self) -> ::weir::Value {
                ::weir::AsValue::as_value(::std::clone::Clone::clone(&self.#id_ident))
            }

            fn set_id(&mut self, value: ::weir::Value) -> ::weir::Result<()> {
                self.#id_ident = <#id_ty as ::weir::AsValue>::try_from_value(value)?;
                Ok(())
            }

            fn set_field(&mut self, name: &str, value: ::weir::Value) -> ::weir::Result<()> {
                match name {
                    #(#set_field)*
                    _ => {
                        return Err(::weir::Error::msg(format!(
                            "Entity `{}` has no field `{}`",
                            #entity_name, name
                        )));
                    }
                }
                Ok(())
            }
        }

        #pivot
    }
    .into()
}
