#![allow(dead_code)]

use oplata_service::config::{CheckoutConfig, Config, OplataConfig, ServerConfig, LIVE_URL};
use oplata_service::startup::{AppState, Application};
use reqwest::{redirect::Policy, Client};
use secrecy::Secret;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const PROJECT: &str = "demoshop";
pub const SECRET: &str = "950856916534772";
pub const PUBLIC_BASE_URL: &str = "http://shop.test";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub gateway: MockServer,
    pub state: AppState,
    pub client: Client,
}

pub fn test_config(gateway_url: &str, store_currency: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
        },
        oplata: OplataConfig {
            project_title: PROJECT.to_string(),
            secret_key: Secret::new(SECRET.to_string()),
            test_mode: true,
            ssl_verify: true,
            live_url: LIVE_URL.to_string(),
            test_url: gateway_url.to_string(),
            request_timeout_secs: 5,
            language: "ru".to_string(),
        },
        checkout: CheckoutConfig {
            title: "OPLATA.MD".to_string(),
            description: "Оплата с помощью oplata.md.".to_string(),
            instructions: "Оплата с помощью oplata.md.".to_string(),
            store_currency: store_currency.to_string(),
            public_base_url: PUBLIC_BASE_URL.to_string(),
        },
        log_level: "debug".to_string(),
        service_name: "oplata-service-test".to_string(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_currency("MDL").await
    }

    pub async fn spawn_with_currency(store_currency: &str) -> Self {
        let gateway = MockServer::start().await;
        let config = test_config(&gateway.uri(), store_currency);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let state = app.state();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Redirects are asserted on, never followed.
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build test client");

        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            gateway,
            state,
            client,
        }
    }

    pub async fn register_order(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/orders", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// The example order from the gateway documentation.
pub fn order_body(id: u64) -> Value {
    json!({
        "id": id,
        "amount": 15000,
        "currency": "MDL",
        "billing_email": "e@e.e",
        "created_at": "2020-01-01T00:00:00Z",
        "status_link": format!("https://shop.md/checkout/order-pay/{}", id),
        "cancel_url": format!("https://shop.md/cart?cancel_order={}", id),
        "return_url": format!("https://shop.md/checkout/order-received/{}", id),
    })
}

pub fn view_body(status: &str) -> String {
    json!({
        "ordersId": "174",
        "invoiceId": "33961",
        "invoiceAmount": "150.00",
        "invoiceEmail": "e@e.e",
        "invoiceDate": null,
        "invoiceStatus": status,
    })
    .to_string()
}
