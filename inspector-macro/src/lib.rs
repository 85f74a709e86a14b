use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DataEnum, DeriveInput, Expr, Fields, Ident, LitStr, Path, Type,
    parse_macro_input,
};

/// Derive `Inspectable` for a struct, or `ReflectEnum` for a fieldless enum.
///
/// The struct must also derive `Clone` and `Default`. Generic types are not
/// supported.
///
/// # Structs
///
/// ```ignore
/// #[derive(Clone, Default, Inspectable)]
/// #[inspect(button(reset), show(name = "Speed", get = speed, set = set_speed))]
/// struct Mover {
///     #[inspect(base)]
///     base: Behaviour,
///     pub velocity: f32,
///     #[inspect(serialize, rename = "Target")]
///     target: Vec<f32>,
///     #[inspect(hide)]
///     pub cache: u32,
/// }
/// ```
///
/// Field options:
/// - `base`: embedded base part; its type's members come first
/// - `serialize`: include a non-`pub` field
/// - `hide`: keep out of the inspector
/// - `skip`: not serialized, and therefore not inspected
/// - `reference`: shared-reference payload
/// - `custom_renderer`: drawn by a dedicated renderer
/// - `rename = "Name"`: member name used in paths
/// - `attr = expr`: attach any attribute value
///
/// Type options:
/// - `method(a, b)`: expose zero-argument methods
/// - `button(a, b)`: expose zero-argument methods as buttons
/// - `property(name = "..", get = getter, set = setter)`: getter/setter pair
/// - `show(..)`: same as `property` and shown in the inspector
/// - `custom_renderer`, `attr = expr`: type-level attributes
///
/// # Enums
///
/// ```ignore
/// #[derive(Clone, Copy, Default, Inspectable)]
/// enum Mode {
///     #[default]
///     Idle,
///     Run = 4,
/// }
/// ```
#[proc_macro_derive(Inspectable, attributes(inspect))]
pub fn derive_inspectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &input.generics,
            "Inspectable cannot be derived for generic types",
        )
        .to_compile_error()
        .into();
    }

    let result = match &input.data {
        Data::Struct(data) => derive_struct(&input, &data.fields),
        Data::Enum(data) => derive_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Inspectable can only be derived for structs and enums",
        )),
    };

    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct FieldOptions {
    base: bool,
    rename: Option<LitStr>,
    attributes: Vec<TokenStream2>,
}

#[derive(Default)]
struct TypeOptions {
    methods: Vec<(Ident, bool)>,
    properties: Vec<PropertyOptions>,
    attributes: Vec<TokenStream2>,
}

struct PropertyOptions {
    name: LitStr,
    get: Path,
    set: Option<Path>,
    show: bool,
    attributes: Vec<TokenStream2>,
}

fn marker(name: &str) -> TokenStream2 {
    let ident = format_ident!("{}", name);
    quote! { inspector_core::#ident }
}

fn parse_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("inspect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                options.base = true;
            } else if meta.path.is_ident("serialize") {
                options.attributes.push(marker("SerializeField"));
            } else if meta.path.is_ident("hide") {
                options.attributes.push(marker("HideInInspector"));
            } else if meta.path.is_ident("skip") {
                options.attributes.push(marker("NonSerialized"));
            } else if meta.path.is_ident("reference") {
                options.attributes.push(marker("SerializeReference"));
            } else if meta.path.is_ident("custom_renderer") {
                options.attributes.push(marker("CustomRenderer"));
            } else if meta.path.is_ident("rename") {
                options.rename = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("attr") {
                let expr: Expr = meta.value()?.parse()?;
                options.attributes.push(quote! { #expr });
            } else {
                return Err(meta.error("unknown inspect field option"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn parse_type_options(attrs: &[Attribute]) -> syn::Result<TypeOptions> {
    let mut options = TypeOptions::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("inspect")) {
        attr.parse_nested_meta(|meta| {
            let is_button = meta.path.is_ident("button");
            if is_button || meta.path.is_ident("method") {
                meta.parse_nested_meta(|inner| {
                    let ident = inner
                        .path
                        .get_ident()
                        .cloned()
                        .ok_or_else(|| inner.error("expected a method name"))?;
                    options.methods.push((ident, is_button));
                    Ok(())
                })?;
            } else if meta.path.is_ident("property") || meta.path.is_ident("show") {
                let show = meta.path.is_ident("show");
                let mut name = None;
                let mut get = None;
                let mut set = None;
                let mut attributes = Vec::new();
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("name") {
                        name = Some(inner.value()?.parse::<LitStr>()?);
                    } else if inner.path.is_ident("get") {
                        get = Some(inner.value()?.parse::<Path>()?);
                    } else if inner.path.is_ident("set") {
                        set = Some(inner.value()?.parse::<Path>()?);
                    } else if inner.path.is_ident("attr") {
                        let expr: Expr = inner.value()?.parse()?;
                        attributes.push(quote! { #expr });
                    } else {
                        return Err(inner.error("unknown property option"));
                    }
                    Ok(())
                })?;
                let get = get.ok_or_else(|| meta.error("property needs `get = ...`"))?;
                let name = name.ok_or_else(|| meta.error("property needs `name = \"...\"`"))?;
                options.properties.push(PropertyOptions {
                    name,
                    get,
                    set,
                    show,
                    attributes,
                });
            } else if meta.path.is_ident("custom_renderer") {
                options.attributes.push(marker("CustomRenderer"));
            } else if meta.path.is_ident("attr") {
                let expr: Expr = meta.value()?.parse()?;
                options.attributes.push(quote! { #expr });
            } else {
                return Err(meta.error("unknown inspect type option"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn attribute_list(attributes: &[TokenStream2]) -> TokenStream2 {
    quote! {
        ::std::vec![#(
            ::std::boxed::Box::new(#attributes) as ::std::boxed::Box<dyn inspector_core::Attribute>
        ),*]
    }
}

fn derive_struct(input: &DeriveInput, fields: &Fields) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let type_options = parse_type_options(&input.attrs)?;

    let named: Vec<&syn::Field> = match fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "Inspectable cannot be derived for tuple structs",
            ));
        }
    };

    let mut base = None;
    let mut field_infos = Vec::new();
    for field in named {
        let options = parse_field_options(&field.attrs)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty: &Type = &field.ty;

        if options.base {
            if base.is_some() {
                return Err(syn::Error::new_spanned(ident, "only one base field is allowed"));
            }
            base = Some(quote! {
                ::core::option::Option::Some({
                    fn get(object: &dyn inspector_core::Reflect) -> ::core::option::Option<&dyn inspector_core::Reflect> {
                        object
                            .as_any()
                            .downcast_ref::<#name>()
                            .map(|this| &this.#ident as &dyn inspector_core::Reflect)
                    }
                    fn get_mut(object: &mut dyn inspector_core::Reflect) -> ::core::option::Option<&mut dyn inspector_core::Reflect> {
                        object
                            .as_any_mut()
                            .downcast_mut::<#name>()
                            .map(|this| &mut this.#ident as &mut dyn inspector_core::Reflect)
                    }
                    inspector_core::BaseInfo {
                        info: <#ty as inspector_core::Inspectable>::static_type_info,
                        get,
                        get_mut,
                    }
                })
            });
            continue;
        }

        let field_name = options
            .rename
            .clone()
            .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
        let visibility = match field.vis {
            syn::Visibility::Public(_) => quote! { inspector_core::Visibility::Public },
            _ => quote! { inspector_core::Visibility::Private },
        };
        let attributes = attribute_list(&options.attributes);

        field_infos.push(quote! {
            inspector_core::FieldInfo {
                name: #field_name,
                visibility: #visibility,
                ty: <#ty as inspector_core::Reflected>::type_desc,
                attributes: #attributes,
                get: |object: &dyn inspector_core::Reflect| -> ::core::option::Option<inspector_core::Value> {
                    object
                        .as_any()
                        .downcast_ref::<#name>()
                        .map(|this| inspector_core::Reflected::to_value(&this.#ident))
                },
                set: |object: &mut dyn inspector_core::Reflect, value: inspector_core::Value|
                    -> ::core::result::Result<(), inspector_core::CoercionError>
                {
                    let this = inspector_core::reflect::target_mut::<#name>(object)?;
                    this.#ident = <#ty as inspector_core::Reflected>::from_value(value)?;
                    ::core::result::Result::Ok(())
                },
            }
        });
    }
    let base = base.unwrap_or_else(|| quote! { ::core::option::Option::None });

    let property_infos = type_options.properties.iter().map(|p| {
        let PropertyOptions {
            name: prop_name,
            get,
            set,
            show,
            attributes,
        } = p;
        let mut attributes = attributes.clone();
        if *show {
            attributes.push(marker("ShowInInspector"));
        }
        let attributes = attribute_list(&attributes);
        let setter = match set {
            Some(set) => quote! {
                ::core::option::Option::Some(
                    (|object: &mut dyn inspector_core::Reflect, value: inspector_core::Value|
                        -> ::core::result::Result<(), inspector_core::CoercionError>
                    {
                        let this = inspector_core::reflect::target_mut::<#name>(object)?;
                        inspector_core::reflect::setter_arg(#name::#set, this, value)
                    }) as inspector_core::SetFn
                )
            },
            None => quote! { ::core::option::Option::None },
        };
        quote! {
            inspector_core::PropertyInfo {
                name: #prop_name,
                ty: || inspector_core::reflect::getter_desc(#name::#get),
                attributes: #attributes,
                get: |object: &dyn inspector_core::Reflect| -> ::core::option::Option<inspector_core::Value> {
                    object
                        .as_any()
                        .downcast_ref::<#name>()
                        .map(|this| inspector_core::Reflected::to_value(&#name::#get(this)))
                },
                set: #setter,
            }
        }
    });

    let method_infos = type_options.methods.iter().map(|(method, is_button)| {
        let method_str = method.to_string();
        let attributes = if *is_button {
            attribute_list(&[marker("Button")])
        } else {
            attribute_list(&[])
        };
        quote! {
            inspector_core::MethodInfo {
                name: #method_str,
                returns: || inspector_core::reflect::return_desc_of(|this: &mut #name| #name::#method(this)),
                attributes: #attributes,
                invoke: |object: &mut dyn inspector_core::Reflect| -> ::core::option::Option<inspector_core::Value> {
                    object
                        .as_any_mut()
                        .downcast_mut::<#name>()
                        .map(|this| inspector_core::MethodReturn::into_return_value(#name::#method(this)))
                },
            }
        }
    });

    let type_attributes = attribute_list(&type_options.attributes);

    Ok(quote! {
        impl inspector_core::Reflect for #name {
            fn type_info(&self) -> &'static inspector_core::TypeInfo {
                <Self as inspector_core::Inspectable>::static_type_info()
            }

            fn clone_boxed(&self) -> ::std::boxed::Box<dyn inspector_core::Reflect> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }
        }

        impl inspector_core::Reflected for #name {
            fn type_desc() -> inspector_core::TypeDesc {
                inspector_core::TypeDesc::Struct(<Self as inspector_core::Inspectable>::static_type_info())
            }

            fn to_value(&self) -> inspector_core::Value {
                inspector_core::Value::Struct(inspector_core::Instance::new(::core::clone::Clone::clone(self)))
            }

            fn from_value(value: inspector_core::Value) -> ::core::result::Result<Self, inspector_core::CoercionError> {
                inspector_core::reflect::instance_from_value::<Self>(value)
            }
        }

        impl inspector_core::Inspectable for #name {
            fn static_type_info() -> &'static inspector_core::TypeInfo {
                static INFO: ::std::sync::LazyLock<inspector_core::TypeInfo> =
                    ::std::sync::LazyLock::new(|| inspector_core::TypeInfo {
                        name: #name_str,
                        type_path: ::core::concat!(::core::module_path!(), "::", #name_str),
                        base: #base,
                        fields: ::std::vec![#(#field_infos),*],
                        properties: ::std::vec![#(#property_infos),*],
                        methods: ::std::vec![#(#method_infos),*],
                        attributes: #type_attributes,
                        construct: || -> ::std::boxed::Box<dyn inspector_core::Reflect> {
                            ::std::boxed::Box::new(<#name as ::core::default::Default>::default())
                        },
                    });
                &INFO
            }
        }
    })
}

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "Inspectable enums must be fieldless",
            ));
        }
    }
    let variants: Vec<&Ident> = data.variants.iter().map(|v| &v.ident).collect();
    let variant_strs: Vec<String> = variants.iter().map(|v| v.to_string()).collect();

    Ok(quote! {
        impl inspector_core::ReflectEnum for #name {
            fn enum_info() -> &'static inspector_core::EnumInfo {
                static INFO: ::std::sync::LazyLock<inspector_core::EnumInfo> =
                    ::std::sync::LazyLock::new(|| inspector_core::EnumInfo {
                        name: #name_str,
                        type_path: ::core::concat!(::core::module_path!(), "::", #name_str),
                        variants: ::std::vec![#(
                            inspector_core::EnumVariant {
                                name: #variant_strs,
                                discriminant: #name::#variants as i64,
                            }
                        ),*],
                    });
                &INFO
            }
        }

        impl inspector_core::Reflected for #name {
            fn type_desc() -> inspector_core::TypeDesc {
                inspector_core::TypeDesc::Enum(<Self as inspector_core::ReflectEnum>::enum_info())
            }

            fn to_value(&self) -> inspector_core::Value {
                let discriminant = match self {
                    #(Self::#variants => Self::#variants as i64,)*
                };
                inspector_core::Value::Enum(inspector_core::EnumValue::new(
                    <Self as inspector_core::ReflectEnum>::enum_info(),
                    discriminant,
                ))
            }

            fn from_value(value: inspector_core::Value) -> ::core::result::Result<Self, inspector_core::CoercionError> {
                let discriminant = inspector_core::reflect::enum_discriminant(
                    value,
                    <Self as inspector_core::ReflectEnum>::enum_info(),
                )?;
                #(
                    if discriminant == Self::#variants as i64 {
                        return ::core::result::Result::Ok(Self::#variants);
                    }
                )*
                ::core::result::Result::Err(inspector_core::CoercionError::OutOfRange {
                    value: discriminant.to_string(),
                    to: ::std::string::String::from(#name_str),
                })
            }
        }
    })
}
