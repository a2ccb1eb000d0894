//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::net::TcpListener;

use storefront_api::config::{RuleMode, ServiceConfig};
use storefront_api::http::HttpServer;
use storefront_api::lifecycle::Shutdown;
use storefront_api::products::model::{NewProduct, Product};
use storefront_api::products::store::{ProductStore, StoreError, StoreResult};
use storefront_api::security::{
    AdmissionRequest, Conclusion, DecisionService, EngineError, EngineVerdict, Policy, RuleReason, RuleResult,
};

/// In-memory stand-in for the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Product>>,
    next_id: AtomicI32,
    writes: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of create/update/delete statements that changed a row.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Make every subsequent call fail like an unreachable database.
    pub fn fail_queries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn bootstrap(&self) -> StoreResult<()> {
        self.check()
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Product>> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: &NewProduct) -> StoreResult<Product> {
        self.check()?;
        let created = Product {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: product.name.clone(),
            image: product.image.clone(),
            price: numeric(product.price),
            created_at: Some(Utc::now().naive_utc()),
        };
        self.rows.lock().unwrap().push(created.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn update(&self, id: i32, product: &NewProduct) -> StoreResult<Option<Product>> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        row.name = product.name.clone();
        row.image = product.image.clone();
        row.price = numeric(product.price);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i32) -> StoreResult<Option<Product>> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(index) = rows.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(rows.remove(index)))
    }
}

/// Mirror `DECIMAL(10, 2)`: always two fractional digits.
fn numeric(price: Decimal) -> Decimal {
    let mut price = price;
    price.rescale(2);
    price
}

/// How the scripted decision service answers.
#[derive(Clone)]
pub enum Script {
    /// Every rule allows.
    AllowAll,
    /// Return these results for every request.
    Fixed(Vec<RuleResult>),
    /// Fail as if the service were unreachable.
    Unavailable,
    /// Count requests per IP; deny once `capacity` tokens are spent.
    Bucket { capacity: u32 },
}

/// Decision service double that records what it was asked.
pub struct ScriptedDecisions {
    script: Script,
    calls: AtomicUsize,
    spent: Mutex<HashMap<Option<IpAddr>, u32>>,
    seen: Mutex<Vec<AdmissionRequest>>,
}

impl ScriptedDecisions {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            spent: Mutex::new(HashMap::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<AdmissionRequest> {
        self.seen.lock().unwrap().clone()
    }
}

pub fn result(conclusion: Conclusion, reason: RuleReason) -> RuleResult {
    RuleResult {
        rule_id: None,
        mode: RuleMode::Live,
        conclusion,
        reason,
    }
}

pub fn shield(conclusion: Conclusion) -> RuleResult {
    result(
        conclusion,
        RuleReason::Shield {
            shield_triggered: conclusion == Conclusion::Deny,
        },
    )
}

pub fn bot(conclusion: Conclusion, spoofed: bool) -> RuleResult {
    result(
        conclusion,
        RuleReason::Bot {
            allowed: vec![],
            denied: if conclusion == Conclusion::Deny { vec!["CURL".into()] } else { vec![] },
            verified: false,
            spoofed,
        },
    )
}

pub fn bucket(conclusion: Conclusion, remaining: u32) -> RuleResult {
    result(
        conclusion,
        RuleReason::RateLimit {
            max: 20,
            remaining,
            reset_in_secs: Some(10),
        },
    )
}

#[async_trait]
impl DecisionService for ScriptedDecisions {
    async fn decide(&self, request: &AdmissionRequest, policy: &Policy) -> Result<EngineVerdict, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        assert_eq!(policy.rules.len(), 3, "policy always carries shield, bot and bucket rules");

        let results = match &self.script {
            Script::AllowAll => vec![shield(Conclusion::Allow), bot(Conclusion::Allow, false), bucket(Conclusion::Allow, 19)],
            Script::Fixed(results) => results.clone(),
            Script::Unavailable => {
                return Err(EngineError::Status {
                    status: 503,
                    body: "upstream unavailable".into(),
                })
            }
            Script::Bucket { capacity } => {
                let mut spent = self.spent.lock().unwrap();
                let used = spent.entry(request.ip).or_insert(0);
                let conclusion = if *used + request.requested <= *capacity {
                    *used += request.requested;
                    Conclusion::Allow
                } else {
                    Conclusion::Deny
                };
                let remaining = capacity.saturating_sub(*used);
                vec![shield(Conclusion::Allow), bot(Conclusion::Allow, false), bucket(conclusion, remaining)]
            }
        };

        Ok(EngineVerdict {
            id: Some(format!("decision-{}", self.calls())),
            results,
        })
    }
}

/// Configuration suitable for tests: gate enabled with a dummy key.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.admission.api_key = "test-key".into();
    config
}

/// A running server plus the handles a test needs.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the server on an ephemeral port.
pub async fn spawn_app(
    config: ServiceConfig,
    store: Arc<dyn ProductStore>,
    decisions: Arc<dyn DecisionService>,
) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store, decisions);
    let server_shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    TestApp { addr, client, shutdown }
}
