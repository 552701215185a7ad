//! app.rs
use crate::config::operation_registry::REGISTRY;
use crate::config::proxy_config::ProxyConfig;
use crate::handlers::{api_handler, audit_handler};
use crate::services::dispatch_service::DispatchService;
use actix_web::{web, HttpRequest};

pub fn init_app(cfg: &mut web::ServiceConfig) {
    let mut api = web::scope("/api");

    // Una ruta por operación, con un único verbo; el resto pasa por auth y luego 405
    for spec in REGISTRY.iter() {
        let operation = spec.id;
        let verb = spec.verb;
        api = api.service(
            web::resource(spec.path())
                .name(operation.as_str())
                .route(web::method(verb.to_method()).to(
                    move |req: HttpRequest,
                          body: web::Bytes,
                          dispatcher: web::Data<DispatchService>,
                          config: web::Data<ProxyConfig>| {
                        api_handler::operation_endpoint(operation, req, body, dispatcher, config)
                    },
                ))
                .default_service(web::to(
                    move |req: HttpRequest, config: web::Data<ProxyConfig>| {
                        api_handler::method_not_allowed_endpoint(verb, req, config)
                    },
                )),
        );
    }

    cfg.service(
        api.service(
            web::scope("/audit")
                .route("", web::get().to(audit_handler::list_audit_endpoint))
                .route("/{id}", web::get().to(audit_handler::get_audit_endpoint)),
        ),
    );
}
