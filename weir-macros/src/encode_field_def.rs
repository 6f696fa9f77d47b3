use crate::{
    decode_entity::EntityMetadata,
    decode_field::{FieldMetadata, IdKind},
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

fn is_self(ty: &Type, entity: &EntityMetadata) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path.is_ident("Self") || path.path.is_ident(&entity.item.ident)
}

/// Reference to the identifier of `ty`, resolved through its constants so no
/// descriptor has to be built while building this one.
fn encode_reference(ty: &Type, entity: &EntityMetadata) -> TokenStream {
    let ty = if is_self(ty, entity) {
        let ident = &entity.item.ident;
        quote!(#ident)
    } else {
        quote!(#ty)
    };
    quote! {
        ::weir::FieldRef::new(
            <#ty as ::weir::Entity>::NAME,
            <#ty as ::weir::Entity>::ID_KEY,
        )
    }
}

pub(crate) fn encode_field_def(field: &FieldMetadata, entity: &EntityMetadata) -> TokenStream {
    let name = &field.name;
    let ty = &field.ty;
    let is_id = entity.id().ident == field.ident;
    let auto_increment =
        is_id && entity.id().id.unwrap_or(IdKind::Autoincrement) == IdKind::Autoincrement;
    let unique = field.unique;
    let nullable = if is_id {
        quote!(false)
    } else {
        quote!(<#ty as ::weir::AsValue>::NULLABLE)
    };
    let default = match &field.default {
        Some(v) => quote!(Some(::std::convert::Into::<::weir::Value>::into(#v))),
        None => quote!(None),
    };
    let pivot_reference = entity
        .pivot
        .as_ref()
        .zip(entity.pivot_keys())
        .and_then(|((left, right), (left_key, right_key))| {
            if left_key.ident == field.ident {
                Some(left)
            } else if right_key.ident == field.ident {
                Some(right)
            } else {
                None
            }
        });
    let references = match field.references.as_ref().or(pivot_reference) {
        Some(ty) => {
            let reference = encode_reference(ty, entity);
            quote!(Some(#reference))
        }
        None => quote!(None),
    };
    quote! {
        ::weir::FieldDef {
            name: ::std::borrow::Cow::Borrowed(#name),
            value: <#ty as ::weir::AsValue>::as_empty_value(),
            nullable: #nullable,
            unique: #unique,
            primary_key: #is_id,
            auto_increment: #auto_increment,
            default: #default,
            references: #references,
        }
    }
}
