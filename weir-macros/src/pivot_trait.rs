use crate::decode_entity::EntityMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn pivot_trait(entity: &EntityMetadata) -> TokenStream {
    let (Some((left, right)), Some((left_key, right_key))) =
        (entity.pivot.as_ref(), entity.pivot_keys())
    else {
        return TokenStream::new();
    };
    let struct_name = &entity.item.ident;
    let entity_name = &entity.name;
    let (left_ident, left_ty, left_name) = (&left_key.ident, &left_key.ty, &left_key.name);
    let (right_ident, right_ty, right_name) = (&right_key.ident, &right_key.ty, &right_key.name);
    let others = entity
        .fields
        .iter()
        .filter(|v| v.ident != *left_ident && v.ident != *right_ident)
        .map(|v| {
            let ident = &v.ident;
            quote!(#ident: ::std::default::Default::default())
        });
    quote! {
        impl ::weir::Pivot for #struct_name {
            type Left = #left;
            type Right = #right;

            fn left_key() -> ::weir::FieldRef {
                ::weir::FieldRef::new(#entity_name, #left_name)
            }

            fn right_key() -> ::weir::FieldRef {
                ::weir::FieldRef::new(#entity_name, #right_name)
            }

            fn from_keys(left: ::weir::Value, right: ::weir::Value) -> ::weir::Result<Self> {
                Ok(Self {
                    #left_ident: <#left_ty as ::weir::AsValue>::try_from_value(left)?,
                    #right_ident: <#right_ty as ::weir::AsValue>::try_from_value(right)?,
                    #(#others,)*
                })
            }
        }
    }
}
