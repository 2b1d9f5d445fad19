use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{
    Data, DeriveInput, Expr, ExprLit, ExprPath, Fields, Ident, ItemFn, ItemImpl, Lit, Meta,
    MetaNameValue, Token,
};

type AttrArgs = Punctuated<Meta, Token![,]>;

/// Register a function as a scheduler task.
///
/// The function must have the signature `fn(&mut TaskContext<'_>)`. It is
/// collected at link time and added by `SchedulerBuilder::register_all`.
///
/// ```rust,ignore
/// use tickloop::{task, TaskContext};
///
/// #[task(interval = "500ms")]
/// fn heartbeat(_ctx: &mut TaskContext<'_>) {
///     println!("alive");
/// }
///
/// #[task(one_shot = "${app.boot_delay:2s}")]
/// fn boot_banner(_ctx: &mut TaskContext<'_>) {
///     println!("booted");
/// }
/// ```
///
/// # Parameters
///
/// - `interval`: period between runs (`"250ms"`, `"2s"`, or a bare number)
/// - `one_shot`: delay before the single run
/// - `time_unit`: unit of bare numbers (`"seconds"` or `TimeUnit::Seconds`)
/// - `enabled`: bool or config placeholder
/// - `name`: task name, defaults to the function name
///
/// Every string value may be a `${key:default}` config placeholder.
#[proc_macro_attribute]
pub fn task(args: TokenStream, input: TokenStream) -> TokenStream {
    let attr_args = syn::parse_macro_input!(args with AttrArgs::parse_terminated);
    let input_fn = syn::parse_macro_input!(input as ItemFn);

    let fn_name = &input_fn.sig.ident;
    let schedule = match parse_schedule_args(&attr_args, &fn_name.to_string()) {
        Ok(schedule) => schedule,
        Err(e) => return e.to_compile_error().into(),
    };
    let TaskSchedule {
        name,
        schedule_type,
        schedule_value,
        enabled,
        time_unit,
        ..
    } = schedule;

    let register_fn_name = Ident::new(&format!("__register_task_{}", fn_name), fn_name.span());

    let expanded = quote! {
        #input_fn

        // Auto-registration using linkme
        #[::tickloop::tickloop_runtime::linkme::distributed_slice(::tickloop::tickloop_runtime::TASKS)]
        #[linkme(crate = ::tickloop::tickloop_runtime::linkme)]
        fn #register_fn_name() -> ::tickloop::tickloop_runtime::TaskRegistration {
            ::tickloop::tickloop_runtime::TaskRegistration {
                name: #name,
                schedule_type: #schedule_type,
                schedule_value: #schedule_value,
                enabled: #enabled,
                time_unit: #time_unit,
                handler: #fn_name,
            }
        }
    };

    TokenStream::from(expanded)
}

/// Attach a schedule to an `impl Runnable for T` block.
///
/// Generates `TaskMetadata` for `T` so an instance can be queued with
/// `SchedulerBuilder::runnable`. Accepts the same parameters as `#[task]`;
/// the name defaults to the type name.
#[proc_macro_attribute]
pub fn task_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    let attr_args = syn::parse_macro_input!(args with AttrArgs::parse_terminated);
    let input_impl = syn::parse_macro_input!(input as ItemImpl);

    let impl_type = &input_impl.self_ty;
    let type_name = quote!(#impl_type).to_string().replace(' ', "");
    let schedule = match parse_schedule_args(&attr_args, &type_name) {
        Ok(schedule) => schedule,
        Err(e) => return e.to_compile_error().into(),
    };
    let TaskSchedule {
        name,
        schedule_type,
        schedule_value,
        enabled,
        time_unit,
        time_unit_variant,
    } = schedule;

    let time_unit_enum = time_unit_variant.map(|variant| {
        quote! {
            fn time_unit_enum() -> ::core::option::Option<::tickloop::tickloop_runtime::TimeUnit> {
                ::core::option::Option::Some(::tickloop::tickloop_runtime::TimeUnit::#variant)
            }
        }
    });

    let expanded = quote! {
        #input_impl

        impl ::tickloop::tickloop_runtime::TaskMetadata for #impl_type {
            fn name() -> &'static str { #name }
            fn schedule_type() -> &'static str { #schedule_type }
            fn schedule_value() -> &'static str { #schedule_value }
            fn enabled() -> &'static str { #enabled }
            fn time_unit() -> &'static str { #time_unit }
            #time_unit_enum
        }
    };

    TokenStream::from(expanded)
}

/// Derive `ResumePoint` for a fieldless enum.
///
/// Variants map to their discriminants. Discriminant 0 is the fresh-entry
/// value and is never reported as a saved point.
///
/// ```rust,ignore
/// #[derive(Clone, Copy, ResumePoint)]
/// enum Blink {
///     Start = 0,
///     On = 1,
///     Off = 2,
/// }
/// ```
#[proc_macro_derive(ResumePoint)]
pub fn derive_resume_point(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_resume_point(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_resume_point(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ResumePoint can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ResumePoint needs at least one variant",
        ));
    }
    if let Some(variant) = data.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
        return Err(syn::Error::new_spanned(
            variant,
            "ResumePoint variants cannot carry fields",
        ));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let checks = data.variants.iter().map(|v| {
        let variant = &v.ident;
        quote! {
            if raw == #name::#variant as u16 {
                return ::core::option::Option::Some(#name::#variant);
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::tickloop::tickloop_runtime::ResumePoint for #name #ty_generics #where_clause {
            fn to_raw(self) -> u16 {
                self as u16
            }

            fn from_raw(raw: u16) -> ::core::option::Option<Self> {
                #(#checks)*
                ::core::option::Option::None
            }
        }
    })
}

struct TaskSchedule {
    name: String,
    schedule_type: &'static str,
    schedule_value: String,
    enabled: String,
    time_unit: String,
    time_unit_variant: Option<Ident>,
}

fn parse_schedule_args(attr_args: &AttrArgs, default_name: &str) -> syn::Result<TaskSchedule> {
    let mut name = None;
    let mut schedule: Option<(&'static str, String)> = None;
    let mut enabled = None;
    let mut time_unit = None;
    let mut time_unit_variant = None;

    for arg in attr_args {
        let Meta::NameValue(MetaNameValue { path, value, .. }) = arg else {
            return Err(syn::Error::new_spanned(arg, "expected `key = value`"));
        };
        let key = path.get_ident().map(|i| i.to_string()).unwrap_or_default();

        match key.as_str() {
            "interval" | "one_shot" => {
                if schedule.is_some() {
                    return Err(syn::Error::new_spanned(
                        arg,
                        "only one of `interval` or `one_shot` may be given",
                    ));
                }
                let schedule_type = if key == "interval" { "interval" } else { "one_shot" };
                schedule = Some((schedule_type, int_or_str(value, &key)?));
            }
            "name" => name = Some(string_value(value, "name")?),
            "enabled" => {
                enabled = Some(match value {
                    Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }) => b.value.to_string(),
                    Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => s.value(),
                    _ => {
                        return Err(syn::Error::new_spanned(
                            value,
                            "enabled must be bool or string",
                        ))
                    }
                });
            }
            "time_unit" => {
                time_unit = Some(match value {
                    Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => s.value(),
                    // Support TimeUnit::Seconds, TimeUnit::Minutes, etc.
                    Expr::Path(ExprPath { path, .. }) => {
                        let Some(last) = path.segments.last() else {
                            return Err(syn::Error::new_spanned(path, "invalid time_unit path"));
                        };
                        time_unit_variant = Some(last.ident.clone());
                        last.ident.to_string().to_lowercase()
                    }
                    _ => {
                        return Err(syn::Error::new_spanned(
                            value,
                            "time_unit must be a string or TimeUnit::* constant",
                        ))
                    }
                });
            }
            _ => return Err(syn::Error::new_spanned(path, format!("unknown parameter `{}`", key))),
        }
    }

    let Some((schedule_type, schedule_value)) = schedule else {
        return Err(syn::Error::new(
            Span::call_site(),
            format!("task `{}` must specify `interval` or `one_shot`", default_name),
        ));
    };

    Ok(TaskSchedule {
        name: name.unwrap_or_else(|| default_name.to_string()),
        schedule_type,
        schedule_value,
        enabled: enabled.unwrap_or_else(|| "true".to_string()),
        time_unit: time_unit.unwrap_or_else(|| "milliseconds".to_string()),
        time_unit_variant,
    })
}

fn int_or_str(value: &Expr, key: &str) -> syn::Result<String> {
    match value {
        Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => Ok(i.base10_digits().to_string()),
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.value()),
        _ => Err(syn::Error::new_spanned(
            value,
            format!("{} must be int or string", key),
        )),
    }
}

fn string_value(value: &Expr, key: &str) -> syn::Result<String> {
    match value {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.value()),
        _ => Err(syn::Error::new_spanned(value, format!("{} must be a string", key))),
    }
}
