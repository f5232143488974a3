use anyhow::Context;
use axum::{
    Router,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header},
};
use pdash_common::views::ApiErrorResponse;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::{
    ToSchema,
    openapi::{Info, License, OpenApi, RefOr, path::Operation},
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{auth::providers::session::CSRF_HEADER, context::ApiContext, handlers};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn make(ctx: ApiContext) -> anyhow::Result<(Router, OpenApi)> {
    let origin = ctx
        .config
        .public_url
        .trim_end_matches('/')
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid public URL {:?}", ctx.config.public_url))?;

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                let span = info_span!(
                    "http_request",
                    method = req.method().to_string(),
                    request_id = Option::<&str>::None,
                    path = Option::<&str>::None,
                );

                if let Some(request_id) = req
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                {
                    span.record("request_id", request_id);
                }

                match req.extensions().get::<MatchedPath>() {
                    Some(path) => span.record("path", path.as_str()),
                    None => span.record("path", req.uri().path()),
                };

                span
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_credentials(true)
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)]),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id));

    let openapi = OpenApi::builder()
        .info(
            Info::builder()
                .title("phoenixd dashboard API")
                .version(env!("CARGO_PKG_VERSION"))
                .license(Some(
                    License::builder()
                        .name("Apache 2.0 License")
                        .identifier(Some(env!("CARGO_PKG_LICENSE")))
                        .build(),
                )),
        )
        .build();

    let (router, mut api) = OpenApiRouter::with_openapi(openapi)
        .routes(routes!(handlers::health_check))
        .routes(routes!(handlers::auth::auth_status))
        .routes(routes!(handlers::auth::auth_setup))
        .routes(routes!(handlers::auth::auth_login))
        .routes(routes!(handlers::auth::auth_logout))
        .routes(routes!(
            handlers::auth::change_password,
            handlers::auth::remove_password
        ))
        .routes(routes!(
            handlers::auth::get_auth_settings,
            handlers::auth::update_auth_settings
        ))
        .routes(routes!(handlers::node::node_info))
        .routes(routes!(handlers::node::node_balance))
        .routes(routes!(handlers::node::list_channels))
        .routes(routes!(handlers::node::close_channel))
        .routes(routes!(handlers::node::estimate_liquidity_fees))
        .routes(routes!(handlers::node::bump_fee))
        .routes(routes!(handlers::node::get_offer))
        .routes(routes!(handlers::node::get_ln_address))
        .routes(routes!(handlers::payments::list_incoming))
        .routes(routes!(handlers::payments::get_incoming))
        .routes(routes!(handlers::payments::list_outgoing))
        .routes(routes!(handlers::payments::get_outgoing))
        .routes(routes!(handlers::payments::create_invoice))
        .routes(routes!(handlers::payments::pay_invoice))
        .routes(routes!(handlers::payments::pay_offer))
        .routes(routes!(handlers::payments::pay_ln_address))
        .routes(routes!(handlers::payments::send_to_address))
        .routes(routes!(handlers::decode::decode_invoice))
        .routes(routes!(handlers::decode::decode_offer))
        .routes(routes!(handlers::phoenixd::phoenixd_status))
        .routes(routes!(handlers::phoenixd::update_phoenixd_config))
        .routes(routes!(handlers::phoenixd::test_phoenixd))
        .routes(routes!(handlers::phoenixd::events))
        .layer(middleware)
        .with_state(ctx)
        .split_for_parts();

    api.paths.paths.iter_mut().for_each(|(_path, item)| {
        apply_default_errors(&mut item.get);
        apply_default_errors(&mut item.post);
        apply_default_errors(&mut item.patch);
        apply_default_errors(&mut item.put);
        apply_default_errors(&mut item.delete);
        apply_default_errors(&mut item.trace);
        apply_default_errors(&mut item.head);
        apply_default_errors(&mut item.options);
    });

    Ok((router, api))
}

fn error_ref(summary: &str) -> RefOr<utoipa::openapi::Response> {
    RefOr::Ref(
        utoipa::openapi::Ref::builder()
            .summary(summary)
            .ref_location_from_schema_name(ApiErrorResponse::name())
            .build(),
    )
}

fn apply_default_errors(item: &mut Option<Operation>) {
    if let Some(item) = item {
        let responses = &mut item.responses.responses;
        responses.insert("401".into(), error_ref("Unauthorized"));
        responses.insert("500".into(), error_ref("Internal server error"));
    }
}
