//! OpenAPI document for the generated routes, built with utoipa's builders
//! since the routes only exist at runtime.

use crate::config::{FieldInfo, FieldType, ObjectSchema, ResolvedRouter};
use crate::routes::{CrudRouter, RouteName};
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use utoipa::openapi::{
    path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathsBuilder},
    request_body::RequestBodyBuilder,
    schema::{Array, ComponentsBuilder, KnownFormat, ObjectBuilder, Schema, SchemaFormat, SchemaType, Type},
    ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Ref, RefOr, Required, ResponseBuilder,
};

fn field_schema(f: &FieldInfo) -> RefOr<Schema> {
    let (ty, format) = match f.field_type {
        FieldType::Integer => (Some(Type::Integer), Some(KnownFormat::Int64)),
        FieldType::Float => (Some(Type::Number), Some(KnownFormat::Double)),
        FieldType::String => (Some(Type::String), None),
        FieldType::Boolean => (Some(Type::Boolean), None),
        FieldType::Uuid => (Some(Type::String), Some(KnownFormat::Uuid)),
        FieldType::Json => (None, None),
    };
    let schema_type = match ty {
        Some(t) if f.nullable => SchemaType::from_iter([t, Type::Null]),
        Some(t) => SchemaType::Type(t),
        None => SchemaType::AnyValue,
    };
    let mut builder = ObjectBuilder::new()
        .title(Some(f.name.clone()))
        .schema_type(schema_type)
        .format(format.map(SchemaFormat::KnownFormat));
    if let Some(d) = &f.default {
        builder = builder.default(Some(d.clone()));
    }
    RefOr::T(Schema::Object(builder.build()))
}

fn object_schema(schema: &ObjectSchema) -> RefOr<Schema> {
    let mut builder = ObjectBuilder::new()
        .title(Some(schema.name.clone()))
        .schema_type(Type::Object);
    for f in &schema.fields {
        builder = builder.property(f.name.clone(), field_schema(f));
        if f.required {
            builder = builder.required(f.name.clone());
        }
    }
    RefOr::T(Schema::Object(builder.build()))
}

fn page_schema(router: &ResolvedRouter) -> RefOr<Schema> {
    let count = || RefOr::T(Schema::Object(ObjectBuilder::new().schema_type(Type::Integer).build()));
    let items = Array::new(Ref::from_schema_name(router.schema.name.clone()));
    let builder = ObjectBuilder::new()
        .title(Some(page_name(router)))
        .schema_type(Type::Object)
        .property("items", RefOr::T(Schema::Array(items)))
        .property("total", count())
        .property("page", count())
        .property("size", count())
        .property("pages", count())
        .required("items")
        .required("total")
        .required("page")
        .required("size")
        .required("pages");
    RefOr::T(Schema::Object(builder.build()))
}

fn page_name(router: &ResolvedRouter) -> String {
    format!("{}Page", router.schema.name)
}

fn json_content(schema: RefOr<Schema>) -> utoipa::openapi::Content {
    ContentBuilder::new().schema(Some(schema)).build()
}

fn schema_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn query_param(name: &str, ty: Type, description: &str) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .description(Some(description))
        .schema(Some(RefOr::T(Schema::Object(ObjectBuilder::new().schema_type(ty).build()))))
        .build()
}

fn summary(router: &ResolvedRouter, route: RouteName) -> String {
    let body = match route {
        RouteName::GetAll => format!("List {}", router.entity_name_plural),
        RouteName::Create => format!("Create {}", router.entity_name),
        RouteName::DeleteAll => format!("Remove All {}", router.entity_name_plural),
        RouteName::GetOne => format!("Get {}", router.entity_name),
        RouteName::Update => format!("Update {}", router.entity_name),
        RouteName::DeleteOne => format!("Remove {}", router.entity_name),
    };
    format!("{}{}", router.summary_prefix, body)
}

fn http_method(route: RouteName) -> HttpMethod {
    match route {
        RouteName::GetAll | RouteName::GetOne => HttpMethod::Get,
        RouteName::Create => HttpMethod::Post,
        RouteName::Update => HttpMethod::Patch,
        RouteName::DeleteAll | RouteName::DeleteOne => HttpMethod::Delete,
    }
}

fn operation(router: &ResolvedRouter, route: RouteName) -> utoipa::openapi::path::Operation {
    let entity = schema_ref(&router.schema.name);
    let operation_id = format!(
        "{}_{}",
        route.as_str(),
        router.prefix.trim_start_matches('/').replace(['/', '.', '-'], "_")
    );
    let mut op = OperationBuilder::new()
        .summary(Some(summary(router, route)))
        .operation_id(Some(operation_id))
        .tags(Some(router.doc_tags()));

    if route.is_item() {
        op = op.parameter(
            ParameterBuilder::new()
                .name(router.path_param_name.clone())
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .schema(Some(field_schema(&FieldInfo {
                    name: router.path_param_name.clone(),
                    field_type: router
                        .schema
                        .field(&router.pk)
                        .map(|f| f.field_type)
                        .unwrap_or(FieldType::String),
                    required: true,
                    nullable: false,
                    default: None,
                })))
                .build(),
        );
    }

    let body_schema = match route {
        RouteName::Create => Some(&router.create_schema),
        RouteName::Update => Some(&router.update_schema),
        _ => None,
    };
    if let Some(s) = body_schema {
        op = op.request_body(Some(
            RequestBodyBuilder::new()
                .content("application/json", json_content(schema_ref(&s.name)))
                .required(Some(Required::True))
                .build(),
        ));
    }

    let ok = match route {
        RouteName::GetAll => {
            op = op
                .parameter(query_param("filter", Type::String, "JSON list of {field, op, value} filters"))
                .parameter(query_param("sort", Type::String, "JSON list of {field, direction} sort keys"));
            let list_schema = if router.pagination {
                op = op
                    .parameter(query_param("page", Type::Integer, "1-based page number"))
                    .parameter(query_param("size", Type::Integer, "Items per page"));
                schema_ref(&page_name(router))
            } else {
                RefOr::T(Schema::Array(Array::new(Ref::from_schema_name(router.schema.name.clone()))))
            };
            ResponseBuilder::new()
                .description("Successful Response")
                .content("application/json", json_content(list_schema))
        }
        RouteName::Create => ResponseBuilder::new()
            .description("Created")
            .content("application/json", json_content(entity)),
        RouteName::DeleteAll => ResponseBuilder::new().description("No Content"),
        _ => ResponseBuilder::new()
            .description("Successful Response")
            .content("application/json", json_content(entity)),
    };
    let code = match route {
        RouteName::Create => "201",
        RouteName::DeleteAll => "204",
        _ => "200",
    };
    op = op.response(code, ok.build());

    if route.is_item() {
        op = op.response("404", ResponseBuilder::new().description("Item not found").build());
    }
    if route.is_item() || route == RouteName::Create || route == RouteName::GetAll {
        op = op.response("422", ResponseBuilder::new().description("Validation Error").build());
    }
    op.build()
}

/// Build the document for `routers`. Only enabled routes appear.
pub fn openapi_document(title: &str, version: &str, routers: &[&CrudRouter]) -> OpenApi {
    let mut paths = PathsBuilder::new();
    let mut components = ComponentsBuilder::new();

    for crud in routers {
        let router = crud.config();
        components = components
            .schema(router.schema.name.clone(), object_schema(&router.schema))
            .schema(router.create_schema.name.clone(), object_schema(&router.create_schema))
            .schema(router.update_schema.name.clone(), object_schema(&router.update_schema));
        if router.pagination {
            components = components.schema(page_name(router), page_schema(router));
        }

        let mut collection: Option<PathItemBuilder> = None;
        let mut item: Option<PathItemBuilder> = None;
        for route in CrudRouter::ROUTES {
            if !crud.is_enabled(route) {
                continue;
            }
            let slot = if route.is_item() { &mut item } else { &mut collection };
            let builder = slot.take().unwrap_or_else(PathItemBuilder::new);
            *slot = Some(builder.operation(http_method(route), operation(router, route)));
        }
        if let Some(b) = collection {
            paths = paths.path(router.collection_path(), b.build());
        }
        if let Some(b) = item {
            paths = paths.path(router.item_path_template(), b.build());
        }
    }

    OpenApiBuilder::new()
        .info(InfoBuilder::new().title(title).version(version).build())
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}

/// GET /openapi.json serving a prebuilt document.
pub fn openapi_routes(doc: OpenApi) -> Router {
    let doc = Arc::new(doc);
    Router::new().route(
        "/openapi.json",
        get(move || {
            let doc = doc.clone();
            async move { Json(doc.as_ref().clone()) }
        }),
    )
}
