//! Integration tests for the rate limiting middleware

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use actix_web::{http::header, test, web, App, HttpResponse};
    use shelf_api::Gatekeeper;
    use shelf_shared::AppConfig;

    fn config(capacity: f64, refill_rate: f64) -> AppConfig {
        let mut config = AppConfig::development();
        config.rate_limit.capacity = capacity;
        config.rate_limit.refill_rate = refill_rate;
        config
    }

    fn peer(addr: &str) -> SocketAddr {
        addr.parse().unwrap()
    }

    #[actix_web::test]
    async fn test_rejects_after_burst_without_calling_handler() {
        let gatekeeper = Gatekeeper::from_config(&config(5.0, 1.0)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let handler_calls = Arc::clone(&calls);

        let app = test::init_service(
            App::new().wrap(gatekeeper.rate_limiter()).route(
                "/",
                web::get().to(move || {
                    let calls = Arc::clone(&handler_calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        HttpResponse::Ok().finish()
                    }
                }),
            ),
        )
        .await;

        for i in 0..5 {
            let req = test::TestRequest::get().uri("/").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200, "request {} should be admitted", i + 1);
        }

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 429);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[actix_web::test]
    async fn test_peers_have_independent_buckets() {
        let gatekeeper = Gatekeeper::from_config(&config(1.0, 0.0)).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(gatekeeper.rate_limiter())
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let first = peer("198.51.100.1:40000");
        let second = peer("198.51.100.2:40000");

        let resp = test::call_service(&app, test::TestRequest::get().peer_addr(first).to_request()).await;
        assert_eq!(resp.status(), 200);
        let resp = test::call_service(&app, test::TestRequest::get().peer_addr(first).to_request()).await;
        assert_eq!(resp.status(), 429);
        let resp = test::call_service(&app, test::TestRequest::get().peer_addr(second).to_request()).await;
        assert_eq!(resp.status(), 200);

        assert_eq!(gatekeeper.registry().len(), 2);
    }

    #[actix_web::test]
    async fn test_empty_bucket_without_refill_omits_retry_after() {
        let gatekeeper = Gatekeeper::from_config(&config(1.0, 0.0)).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(gatekeeper.rate_limiter())
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        test::call_service(&app, test::TestRequest::get().to_request()).await;
        let resp = test::call_service(&app, test::TestRequest::get().to_request()).await;

        assert_eq!(resp.status(), 429);
        assert!(resp.headers().get(header::RETRY_AFTER).is_none());
    }

    #[actix_web::test]
    async fn test_forwarded_for_only_honoured_from_trusted_proxy() {
        let mut config = config(1.0, 0.0);
        config.rate_limit.trusted_proxies = vec!["10.0.0.0/8".to_string()];
        let gatekeeper = Gatekeeper::from_config(&config).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(gatekeeper.rate_limiter())
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        // Behind the proxy each forwarded client gets its own bucket
        for client in ["203.0.113.1", "203.0.113.2"] {
            let req = test::TestRequest::get()
                .peer_addr(peer("10.0.0.5:8080"))
                .insert_header(("X-Forwarded-For", client))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 200);
        }

        // A direct client cannot escape its bucket by forging the header
        let direct = peer("198.51.100.9:5000");
        for (forged, expected) in [("203.0.113.3", 200), ("203.0.113.4", 429)] {
            let req = test::TestRequest::get()
                .peer_addr(direct)
                .insert_header(("X-Forwarded-For", forged))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_disabled_limiter_forwards_everything() {
        let mut config = config(1.0, 0.0);
        config.rate_limit.enabled = false;
        let gatekeeper = Gatekeeper::from_config(&config).unwrap();
        let app = test::init_service(
            App::new()
                .wrap(gatekeeper.rate_limiter())
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..20 {
            let resp = test::call_service(&app, test::TestRequest::get().to_request()).await;
            assert_eq!(resp.status(), 200);
        }
        assert!(gatekeeper.registry().is_empty());
    }
}
