use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, Ident, LitBool, LitInt, LitStr, Type,
    parse_macro_input, spanned::Spanned,
};

/// Implements `relmap::Entity` for a struct with named fields.
///
/// - `#[entity]` / `#[entity(table = "...")]` on the struct marks it as mapped.
///   Without it the type is known but not applicable for table mapping.
/// - `#[id]` marks the primary-key field.
/// - `#[column]` / `#[column(name = "...", length = N, nullable = bool)]` marks
///   a column field.
///
/// Fields with neither `#[id]` nor `#[column]` are left alone; every field must
/// implement `Default`.
#[proc_macro_derive(Entity, attributes(entity, id, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct EntityOptions {
    declared: bool,
    table: Option<String>,
}

#[derive(Default)]
struct ColumnOptions {
    name: Option<String>,
    length: Option<u32>,
    nullable: Option<bool>,
}

struct MappedField {
    ident: Ident,
    ty: Type,
    primary_key: bool,
    column: Option<ColumnOptions>,
}

fn expand_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Entity does not support generic structs",
        ));
    }

    let entity_options = parse_entity_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        Fields::Unit => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity requires named fields",
            ));
        }
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new(fields.span(), "Entity requires named fields"));
        }
    };

    let mut all_idents = Vec::<Ident>::new();
    let mut mapped = Vec::<MappedField>::new();

    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Entity requires named fields"))?;
        all_idents.push(ident.clone());

        let primary_key = field.attrs.iter().any(|attr| attr.path().is_ident("id"));
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("id")) {
            if !matches!(attr.meta, syn::Meta::Path(_)) {
                return Err(syn::Error::new(attr.span(), "#[id] takes no arguments"));
            }
        }
        let column = parse_column_options(&field.attrs)?;

        if primary_key || column.is_some() {
            mapped.push(MappedField {
                ident,
                ty: field.ty,
                primary_key,
                column,
            });
        }
    }

    let entity_call = if entity_options.declared {
        match entity_options.table {
            Some(table) => quote! { .entity(::core::option::Option::Some(#table)) },
            None => quote! { .entity(::core::option::Option::None) },
        }
    } else {
        quote! {}
    };

    let field_descriptors = mapped.iter().map(|field| {
        let name = field_name(&field.ident);
        let ty = &field.ty;
        let primary_key = if field.primary_key {
            quote! { .primary_key() }
        } else {
            quote! {}
        };
        let column = field.column.as_ref().map(|options| {
            let name = options.name.as_ref().map(|name| quote! { .name(#name) });
            let length = options.length.map(|length| quote! { .length(#length) });
            let nullable = options.nullable.map(|nullable| quote! { .nullable(#nullable) });
            quote! {
                .column(::relmap::ColumnMarker::default() #name #length #nullable)
            }
        });

        quote! {
            .field(
                ::relmap::FieldDescriptor::new(
                    #name,
                    <#ty as ::relmap::ColumnType>::semantic_type(),
                )
                #primary_key
                #column
            )
        }
    });

    let getter_arms = mapped.iter().map(|field| {
        let name = field_name(&field.ident);
        let ident = &field.ident;
        quote! {
            #name => ::core::option::Option::Some(::relmap::ColumnType::to_value(&self.#ident)),
        }
    });

    let setter_arms = mapped.iter().map(|field| {
        let name = field_name(&field.ident);
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            #name => {
                self.#ident = <#ty as ::relmap::ColumnType>::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        }
    });

    Ok(quote! {
        impl ::relmap::Entity for #struct_name {
            fn descriptor() -> ::relmap::EntityDescriptor {
                ::relmap::EntityDescriptor::new(stringify!(#struct_name))
                    #entity_call
                    #(#field_descriptors)*
            }

            fn instantiate() -> ::relmap::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#all_idents: ::core::default::Default::default(),)*
                })
            }

            fn field_value(&self, field: &str) -> ::core::option::Option<::relmap::Value> {
                match field {
                    #(#getter_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(&mut self, field: &str, value: ::relmap::Value) -> ::relmap::Result<()> {
                match field {
                    #(#setter_arms)*
                    _ => ::core::result::Result::Err(::relmap::OrmError::MappingError(
                        ::std::format!(
                            "{} has no mapped field '{}'",
                            stringify!(#struct_name),
                            field
                        ),
                    )),
                }
            }
        }
    })
}

fn field_name(ident: &Ident) -> String {
    ident.to_string().trim_start_matches("r#").to_string()
}

fn parse_entity_options(attrs: &[Attribute]) -> syn::Result<EntityOptions> {
    let mut options = EntityOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        options.declared = true;

        match &attr.meta {
            syn::Meta::Path(_) => {}
            syn::Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("table") {
                        let value = meta.value()?;
                        let lit: LitStr = value.parse()?;
                        options.table = Some(lit.value());
                        return Ok(());
                    }

                    Err(meta.error("Unsupported entity attribute. Supported: table = \"...\""))
                })?;
            }
            syn::Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "Use #[entity] or #[entity(table = \"...\")]",
                ));
            }
        }
    }

    Ok(options)
}

fn parse_column_options(attrs: &[Attribute]) -> syn::Result<Option<ColumnOptions>> {
    let mut parsed: Option<ColumnOptions> = None;

    for attr in attrs {
        if !attr.path().is_ident("column") {
            continue;
        }
        let options = parsed.get_or_insert_with(ColumnOptions::default);

        match &attr.meta {
            syn::Meta::Path(_) => {}
            syn::Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value = meta.value()?;
                        let lit: LitStr = value.parse()?;
                        options.name = Some(lit.value());
                        return Ok(());
                    }

                    if meta.path.is_ident("length") {
                        let value = meta.value()?;
                        let lit: LitInt = value.parse()?;
                        options.length = Some(lit.base10_parse::<u32>()?);
                        return Ok(());
                    }

                    if meta.path.is_ident("nullable") {
                        let value = meta.value()?;
                        let lit: LitBool = value.parse()?;
                        options.nullable = Some(lit.value());
                        return Ok(());
                    }

                    Err(meta.error(
                        "Unsupported #[column(...)] option. \
                         Supported: name = \"...\", length = <u32>, nullable = <bool>",
                    ))
                })?;
            }
            syn::Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "Use #[column] or #[column(name = \"...\", length = N, nullable = bool)]",
                ));
            }
        }
    }

    Ok(parsed)
}
