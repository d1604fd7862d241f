//! Route documentation collector.
//!
//! [`Swagger::init_app`] wraps an axum [`Router`] in an [`ApiRouter`] that
//! intercepts route registration. Every registration is recorded as a
//! [`RouteRecord`] `(url, methods, endpoint, handler)` together with the
//! documentation staged for it, and the route rule is rewritten from
//! framework placeholder syntax (`<int:id>`, `:id`, `*rest`) into the
//! generic `{id}` form. [`ApiRouter::finish`] renders the records into an
//! OpenAPI document and mounts Swagger UI next to the routes.

use std::any::type_name;
use std::fmt;
use std::sync::OnceLock;

use axum::{
    handler::Handler,
    http::{Method, StatusCode},
    routing::{on, MethodFilter},
    Router,
};
use regex::Regex;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::info::InfoBuilder;
use utoipa::openapi::path::{
    HttpMethod, Operation, OperationBuilder, ParameterBuilder, ParameterIn, PathItem, PathsBuilder,
};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::schema::{
    ArrayBuilder, ComponentsBuilder, ObjectBuilder, Ref, Schema, SchemaType, Type,
};
use utoipa::openapi::{OpenApi, OpenApiBuilder, RefOr, Required};
use utoipa::{PartialSchema, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::DocsConfig;

// ==================== Route rules ====================

/// Declared type of a path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    /// Remainder of the path, slashes included.
    Path,
}

impl ParamKind {
    fn from_converter(converter: Option<&str>) -> Self {
        match converter {
            Some("int") => ParamKind::Integer,
            Some("float") => ParamKind::Number,
            Some("path") => ParamKind::Path,
            _ => ParamKind::String,
        }
    }

    fn schema_type(self) -> Type {
        match self {
            ParamKind::Integer => Type::Integer,
            ParamKind::Number => Type::Number,
            ParamKind::String | ParamKind::Path => Type::String,
        }
    }
}

/// A path parameter found in a route rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    pub name: String,
    pub kind: ParamKind,
}

/// A route rule split into its documented and routable forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// Path with `{name}` placeholders, as written into the OpenAPI document.
    pub doc_path: String,
    /// Path in axum syntax (`:name`, `*name`).
    pub route_path: String,
    pub params: Vec<PathParam>,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(
            r"<(?:(?P<conv>[A-Za-z_]\w*)(?:\([^)]*\))?:)?(?P<flask>[A-Za-z_]\w*)>|\{(?P<brace>[A-Za-z_]\w*)\}|/(?P<sigil>[:*])(?P<axum>[A-Za-z_]\w*)",
        )
        .expect("valid regex")
    })
}

/// Rewrite placeholder syntax in `rule`.
///
/// Accepts `<name>`, `<converter:name>`, `{name}`, `:name` and `*name`.
/// The `path` converter and `*name` become axum wildcards when they end the
/// rule; anywhere else they match a single segment.
pub fn parse_rule(rule: &str) -> RouteRule {
    let mut doc_path = String::with_capacity(rule.len());
    let mut route_path = String::with_capacity(rule.len());
    let mut params = Vec::new();
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(rule) {
        let Some(whole) = caps.get(0) else { continue };
        doc_path.push_str(&rule[last..whole.start()]);
        route_path.push_str(&rule[last..whole.start()]);

        let (prefix, name, kind) = if let Some(name) = caps.name("flask") {
            let converter = caps.name("conv").map(|c| c.as_str());
            ("", name.as_str(), ParamKind::from_converter(converter))
        } else if let Some(name) = caps.name("brace") {
            ("", name.as_str(), ParamKind::String)
        } else {
            let name = caps.name("axum").map(|m| m.as_str()).unwrap_or_default();
            let kind = match caps.name("sigil").map(|m| m.as_str()) {
                Some("*") => ParamKind::Path,
                _ => ParamKind::String,
            };
            ("/", name, kind)
        };

        // axum only accepts a wildcard as the final segment.
        let kind = if kind == ParamKind::Path && whole.end() != rule.len() {
            tracing::warn!(rule, param = name, "Wildcard is not the last segment, matching one segment");
            ParamKind::String
        } else {
            kind
        };

        doc_path.push_str(prefix);
        doc_path.push('{');
        doc_path.push_str(name);
        doc_path.push('}');

        route_path.push_str(prefix);
        route_path.push(if kind == ParamKind::Path { '*' } else { ':' });
        route_path.push_str(name);

        params.push(PathParam {
            name: name.to_string(),
            kind,
        });
        last = whole.end();
    }

    doc_path.push_str(&rule[last..]);
    route_path.push_str(&rule[last..]);

    RouteRule {
        doc_path,
        route_path,
        params,
    }
}

// ==================== Route documentation ====================

/// A schema referenced from an operation, with everything it depends on.
#[derive(Clone)]
struct SchemaRef {
    name: String,
    schemas: Vec<(String, RefOr<Schema>)>,
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SchemaRef").field(&self.name).finish()
    }
}

impl SchemaRef {
    fn of<T: ToSchema>() -> Self {
        let name = T::name().into_owned();
        let mut schemas = vec![(name.clone(), <T as PartialSchema>::schema())];
        T::schemas(&mut schemas);
        Self { name, schemas }
    }

    fn reference(&self) -> RefOr<Schema> {
        RefOr::Ref(Ref::from_schema_name(self.name.clone()))
    }
}

#[derive(Debug, Clone)]
struct ResponseDoc {
    status: StatusCode,
    description: String,
    body: Option<SchemaRef>,
    list: bool,
}

/// Documentation staged for one route registration.
#[derive(Debug, Clone, Default)]
pub struct RouteDoc {
    summary: Option<String>,
    description: String,
    endpoint: Option<String>,
    tags: Vec<String>,
    request_body: Option<SchemaRef>,
    responses: Vec<ResponseDoc>,
}

impl RouteDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Override the endpoint name (defaults to the handler's function name).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Document the JSON request body as `T`.
    pub fn body<T: ToSchema>(mut self) -> Self {
        self.request_body = Some(SchemaRef::of::<T>());
        self
    }

    /// Document a response without a body schema.
    pub fn response(mut self, status: StatusCode, description: impl Into<String>) -> Self {
        self.responses.push(ResponseDoc {
            status,
            description: description.into(),
            body: None,
            list: false,
        });
        self
    }

    /// Document a response whose body is a `T`.
    pub fn response_body<T: ToSchema>(
        mut self,
        status: StatusCode,
        description: impl Into<String>,
    ) -> Self {
        self.responses.push(ResponseDoc {
            status,
            description: description.into(),
            body: Some(SchemaRef::of::<T>()),
            list: false,
        });
        self
    }

    /// Document a response whose body is a list of `T`.
    pub fn response_list<T: ToSchema>(
        mut self,
        status: StatusCode,
        description: impl Into<String>,
    ) -> Self {
        self.responses.push(ResponseDoc {
            status,
            description: description.into(),
            body: Some(SchemaRef::of::<T>()),
            list: true,
        });
        self
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    fn schema_refs(&self) -> impl Iterator<Item = &SchemaRef> {
        self.request_body
            .iter()
            .chain(self.responses.iter().filter_map(|r| r.body.as_ref()))
    }
}

/// One intercepted route registration.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// Route rule in `{name}` form.
    pub url: String,
    pub methods: Vec<Method>,
    /// Endpoint name, also used as the operation id.
    pub endpoint: String,
    /// Full type path of the handler.
    pub handler: &'static str,
    pub params: Vec<PathParam>,
    pub doc: RouteDoc,
}

impl RouteRecord {
    fn operation(&self, method: &Method) -> Operation {
        let operation_id = if self.methods.len() > 1 {
            format!("{}_{}", self.endpoint, method.as_str().to_lowercase())
        } else {
            self.endpoint.clone()
        };

        let mut builder = OperationBuilder::new()
            .summary(self.doc.summary.clone())
            .description(Some(self.doc.description.clone()))
            .operation_id(Some(operation_id));

        if !self.doc.tags.is_empty() {
            builder = builder.tags(Some(self.doc.tags.clone()));
        }

        for param in &self.params {
            let schema = ObjectBuilder::new()
                .schema_type(SchemaType::new(param.kind.schema_type()))
                .build();
            builder = builder.parameter(
                ParameterBuilder::new()
                    .name(param.name.clone())
                    .parameter_in(ParameterIn::Path)
                    .required(Required::True)
                    .schema(Some(RefOr::T(Schema::Object(schema))))
                    .build(),
            );
        }

        if let Some(body) = &self.doc.request_body {
            let request_body = RequestBodyBuilder::new()
                .content(
                    "application/json",
                    ContentBuilder::new().schema(Some(body.reference())).build(),
                )
                .required(Some(Required::True))
                .build();
            builder = builder.request_body(Some(request_body));
        }

        if self.doc.responses.is_empty() {
            builder = builder.response(
                StatusCode::OK.as_str(),
                RefOr::T(ResponseBuilder::new().description("Successful response").build()),
            );
        }

        for response in &self.doc.responses {
            let mut response_builder = ResponseBuilder::new().description(response.description.clone());
            if let Some(body) = &response.body {
                let schema = if response.list {
                    RefOr::T(Schema::Array(ArrayBuilder::new().items(body.reference()).build()))
                } else {
                    body.reference()
                };
                response_builder = response_builder.content(
                    "application/json",
                    ContentBuilder::new().schema(Some(schema)).build(),
                );
            }
            builder = builder.response(
                response.status.as_str(),
                RefOr::T(response_builder.build()),
            );
        }

        if self.doc.request_body.is_some() {
            builder = builder.response(
                StatusCode::BAD_REQUEST.as_str(),
                RefOr::T(ResponseBuilder::new().description("Validation error").build()),
            );
        }

        builder.build()
    }
}

fn http_method(method: &Method) -> Option<HttpMethod> {
    match *method {
        Method::GET => Some(HttpMethod::Get),
        Method::POST => Some(HttpMethod::Post),
        Method::PUT => Some(HttpMethod::Put),
        Method::DELETE => Some(HttpMethod::Delete),
        Method::PATCH => Some(HttpMethod::Patch),
        Method::HEAD => Some(HttpMethod::Head),
        Method::OPTIONS => Some(HttpMethod::Options),
        Method::TRACE => Some(HttpMethod::Trace),
        _ => None,
    }
}

/// Function name of a handler type, if it has one.
fn handler_name<H>() -> Option<String> {
    let full = type_name::<H>();
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next()?;
    if name.is_empty() || name.contains('{') {
        None
    } else {
        Some(name.to_string())
    }
}

fn fallback_endpoint(methods: &[Method], doc_path: &str) -> String {
    let method = methods
        .first()
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| "get".to_string());
    let slug: String = doc_path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}", method, slug.trim_end_matches('_'))
}

// ==================== Collector ====================

/// API information and mount points for the rendered documentation.
#[derive(Debug, Clone)]
pub struct Swagger {
    title: String,
    description: Option<String>,
    version: String,
    ui_path: String,
    spec_path: String,
}

impl Default for Swagger {
    fn default() -> Self {
        Self {
            title: "Frest API".to_string(),
            description: None,
            version: "0.0.1".to_string(),
            ui_path: "/swagger-ui".to_string(),
            spec_path: "/api-docs/openapi.json".to_string(),
        }
    }
}

impl From<&DocsConfig> for Swagger {
    fn from(config: &DocsConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            version: config.version.clone(),
            ui_path: config.ui_path.clone(),
            spec_path: config.spec_path.clone(),
        }
    }
}

impl Swagger {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn ui_path(mut self, path: impl Into<String>) -> Self {
        self.ui_path = path.into();
        self
    }

    pub fn spec_path(mut self, path: impl Into<String>) -> Self {
        self.spec_path = path.into();
        self
    }

    /// Start collecting route registrations made on `router`.
    pub fn init_app<S>(self, router: Router<S>) -> ApiRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        ApiRouter {
            router,
            swagger: self,
            records: Vec::new(),
        }
    }
}

/// An axum router whose registrations are recorded for documentation.
pub struct ApiRouter<S = ()> {
    router: Router<S>,
    swagger: Swagger,
    records: Vec<RouteRecord>,
}

impl<S> ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Register `handler` for `methods` on `rule` with no extra documentation.
    pub fn route<H, T>(self, rule: &str, methods: &[Method], handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(rule, methods, handler, RouteDoc::default())
    }

    /// Register `handler` for `methods` on `rule`, staging `doc` for it.
    ///
    /// An empty method list registers `GET`.
    pub fn route_with<H, T>(mut self, rule: &str, methods: &[Method], handler: H, doc: RouteDoc) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let parsed = parse_rule(rule);
        let requested = if methods.is_empty() {
            vec![Method::GET]
        } else {
            methods.to_vec()
        };

        let mut filter: Option<MethodFilter> = None;
        let mut accepted = Vec::with_capacity(requested.len());
        for method in requested {
            match MethodFilter::try_from(method.clone()) {
                Ok(next) => {
                    filter = Some(match filter {
                        Some(prev) => prev.or(next),
                        None => next,
                    });
                    accepted.push(method);
                }
                Err(_) => tracing::warn!(rule, method = %method, "Unsupported method skipped"),
            }
        }

        let Some(filter) = filter else {
            tracing::warn!(rule, "Route has no routable methods, not registered");
            return self;
        };

        let endpoint = doc
            .endpoint
            .clone()
            .or_else(handler_name::<H>)
            .unwrap_or_else(|| fallback_endpoint(&accepted, &parsed.doc_path));

        let handler_path = type_name::<H>();

        tracing::debug!(
            url = %parsed.doc_path,
            methods = ?accepted,
            endpoint = %endpoint,
            handler = handler_path,
            "Route registered"
        );

        self.router = self.router.route(&parsed.route_path, on(filter, handler));
        self.records.push(RouteRecord {
            url: parsed.doc_path,
            methods: accepted,
            endpoint,
            handler: handler_path,
            params: parsed.params,
            doc,
        });

        self
    }

    /// Apply `f` to the wrapped router, for layers and undocumented routes.
    pub fn map_router(mut self, f: impl FnOnce(Router<S>) -> Router<S>) -> Self {
        self.router = f(self.router);
        self
    }

    /// Records collected so far, in registration order.
    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    /// Render the collected records as an OpenAPI document.
    pub fn openapi(&self) -> OpenApi {
        let info = InfoBuilder::new()
            .title(self.swagger.title.clone())
            .version(self.swagger.version.clone())
            .description(self.swagger.description.clone())
            .build();

        let mut paths = PathsBuilder::new();
        let mut components = ComponentsBuilder::new();

        for record in &self.records {
            for method in &record.methods {
                if let Some(http_method) = http_method(method) {
                    paths = paths.path(
                        record.url.clone(),
                        PathItem::new(http_method, record.operation(method)),
                    );
                }
            }
            for schema_ref in record.doc.schema_refs() {
                for (name, schema) in &schema_ref.schemas {
                    components = components.schema(name.clone(), schema.clone());
                }
            }
        }

        OpenApiBuilder::new()
            .info(info)
            .paths(paths.build())
            .components(Some(components.build()))
            .build()
    }

    /// Render the documentation, mount Swagger UI and return the router.
    pub fn finish(self) -> Router<S> {
        let openapi = self.openapi();
        tracing::info!(
            routes = self.records.len(),
            ui = %self.swagger.ui_path,
            spec = %self.swagger.spec_path,
            "API documentation mounted"
        );
        self.router.merge(
            SwaggerUi::new(self.swagger.ui_path.clone()).url(self.swagger.spec_path.clone(), openapi),
        )
    }

    /// Return the router without mounting documentation.
    pub fn finish_without_docs(self) -> Router<S> {
        self.router
    }
}
