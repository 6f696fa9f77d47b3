use crate::decode_entity::EntityMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Body of `Entity::from_row`.
///
/// Every column is required, the first occurrence of a label is used. Fields
/// that are not persisted start from `Default::default()`.
pub(crate) fn from_row_trait(entity: &EntityMetadata) -> TokenStream {
    let struct_name = &entity.item.ident;
    let holders = entity.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        quote!(let mut #ident: Option<#ty> = None;)
    });
    let assignments = entity.columns().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let name = &c.name;
        quote! {
            #name if #ident.is_none() => {
                #ident = Some(
                    <#ty as ::weir::AsValue>::try_from_value(__v__)
                        .map_err(|e| e.context(format!(
                            "While decoding column `{}` of `{}`",
                            #name,
                            stringify!(#struct_name)
                        )))?,
                );
            }
        }
    });
    let columns = entity.columns().map(|c| {
        let ident = &c.ident;
        let name = &c.name;
        quote!(#ident: #ident.ok_or_else(|| __make_error__(#name))?)
    });
    let skipped = entity.skipped().map(|c| {
        let ident = &c.ident;
        quote!(#ident: ::std::default::Default::default())
    });
    quote! {
        fn from_row(row: ::weir::RowLabeled) -> ::weir::Result<Self> {
            #(#holders)*
            for (__n__, __v__) in ::std::iter::zip(row.labels.iter(), row.values.into_vec()) {
                match __n__.as_str() {
                    #(#assignments)*
                    _ => {}
                }
            }
            let __make_error__ = |name: &str| ::weir::Error::msg(format!(
                "Column `{}` does not exist in the row provided",
                name
            ));
            Ok(#struct_name {
                #(#columns,)*
                #(#skipped,)*
            })
        }
    }
}
