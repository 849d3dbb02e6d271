use utoipa::openapi::{
    ComponentsBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Required, ResponseBuilder,
    path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathsBuilder},
    schema::{ObjectBuilder, Schema, Type},
    security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme},
};

use crate::registry::{Access, Route, RouteTable};

const BEARER_SCHEME: &str = "bearer_auth";

/// openapi
///
/// Describes the composed route table as an OpenAPI document. Generated from
/// the table itself so the documentation cannot drift from what is served.
/// Routes with a method OpenAPI cannot express are left out.
pub fn openapi(table: &RouteTable) -> OpenApi {
    let mut paths = PathsBuilder::new();
    for route in table.routes() {
        let Some(method) = http_method(route) else {
            continue;
        };
        paths = paths.path(
            route.pattern().to_openapi(),
            PathItem::new(method, operation(route)),
        );
    }

    let bearer = SecurityScheme::Http(
        HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .build(),
    );

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title("forum-gateway")
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths.build())
        .components(Some(
            ComponentsBuilder::new()
                .security_scheme(BEARER_SCHEME, bearer)
                .build(),
        ))
        .build()
}

fn http_method(route: &Route) -> Option<HttpMethod> {
    let method = match route.method().as_str() {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        "HEAD" => HttpMethod::Head,
        "OPTIONS" => HttpMethod::Options,
        "TRACE" => HttpMethod::Trace,
        _ => return None,
    };
    Some(method)
}

fn operation(route: &Route) -> utoipa::openapi::path::Operation {
    let mut op = OperationBuilder::new()
        .operation_id(Some(route.name()))
        .tag(route.group())
        .response("200", ResponseBuilder::new().description("Success").build());

    for name in route.pattern().capture_names() {
        op = op.parameter(
            ParameterBuilder::new()
                .name(name)
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .schema(Some(Schema::Object(
                    ObjectBuilder::new().schema_type(Type::String).build(),
                ))),
        );
    }

    match route.access() {
        Access::Public => {}
        Access::SignedIn | Access::Admin => {
            op = op
                .security(SecurityRequirement::new(BEARER_SCHEME, Vec::<String>::new()))
                .response("401", ResponseBuilder::new().description("Not signed in").build());
        }
    }
    if route.access() == Access::Admin {
        op = op.response("403", ResponseBuilder::new().description("Admin role required").build());
    }

    op.build()
}
