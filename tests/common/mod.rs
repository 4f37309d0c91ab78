//! Shared fixtures: an in-process matching engine speaking the engine
//! protocol on a loopback port, plus gateway builders wired to it.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use orderbook_gateway::app_state::AppState;
use orderbook_gateway::engine::framing::{FrameReader, write_frame};
use orderbook_gateway::engine::{Framing, SessionPool, SessionSettings};
use orderbook_gateway::service::OrderService;

/// Behavior switches for [`MockEngine`].
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Framing spoken on every connection.
    pub framing: Framing,
    /// Leave `success` out of `add_order` replies, like the reference engine
    /// does for some error paths.
    pub omit_add_success: bool,
    /// Close each connection after this many replies.
    pub close_after: Option<usize>,
    /// Include `total_orders` in `get_orderbook` replies.
    pub book_reports_total: bool,
    /// Answer `get_size` with an engine-reported failure.
    pub size_fails: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            framing: Framing::Json,
            omit_add_success: false,
            close_after: None,
            book_reports_total: false,
            size_fails: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Resting {
    id: i64,
    side: i64,
    price: i64,
    quantity: i64,
}

/// Price-time priority book with just enough matching for tests.
#[derive(Debug, Default)]
struct Book {
    resting: Vec<Resting>,
}

impl Book {
    fn best_opposite(&self, side: i64, limit: i64) -> Option<usize> {
        let crossing = |r: &&Resting| {
            r.side != side && if side == 0 { r.price <= limit } else { r.price >= limit }
        };
        let best_price = self.resting.iter().filter(crossing).map(|r| r.price);
        let best_price = if side == 0 {
            best_price.min()
        } else {
            best_price.max()
        }?;
        self.resting
            .iter()
            .position(|r| r.side != side && r.price == best_price)
    }

    fn add(&mut self, id: i64, side: i64, price: i64, quantity: i64, order_type: i64) -> Result<Vec<Value>, String> {
        if self.resting.iter().any(|r| r.id == id) {
            return Ok(Vec::new());
        }

        let mut price = price;
        if order_type == 3 {
            let opposite = self.resting.iter().filter(|r| r.side != side).map(|r| r.price);
            let worst = if side == 0 { opposite.max() } else { opposite.min() };
            price = match worst {
                Some(p) => p,
                None if side == 0 => {
                    return Err("Market Buy Order cannot be placed: No Ask orders available".into());
                }
                None => {
                    return Err("Market Sell Order cannot be placed: No Bid orders available".into());
                }
            };
        }
        if order_type == 1 && self.best_opposite(side, price).is_none() {
            return Ok(Vec::new());
        }

        let mut remaining = quantity;
        let mut trades = Vec::new();
        while remaining > 0 {
            let Some(pos) = self.best_opposite(side, price) else {
                break;
            };
            let Some(maker) = self.resting.get_mut(pos) else {
                break;
            };
            let fill = remaining.min(maker.quantity);
            let (bid_id, ask_id, bid_price) = if side == 0 {
                (id, maker.id, price)
            } else {
                (maker.id, id, maker.price)
            };
            trades.push(json!({
                "bid_order_id": bid_id,
                "ask_order_id": ask_id,
                "price": bid_price,
                "quantity": fill,
            }));
            maker.quantity -= fill;
            remaining -= fill;
            if maker.quantity == 0 {
                self.resting.remove(pos);
            }
        }

        if remaining > 0 && order_type != 1 {
            self.resting.push(Resting {
                id,
                side,
                price,
                quantity: remaining,
            });
        }
        Ok(trades)
    }

    fn cancel(&mut self, id: i64) -> bool {
        let before = self.resting.len();
        self.resting.retain(|r| r.id != id);
        self.resting.len() != before
    }

    fn levels(&self, side: i64) -> Vec<Value> {
        let mut prices: Vec<i64> = self
            .resting
            .iter()
            .filter(|r| r.side == side)
            .map(|r| r.price)
            .collect();
        prices.sort_unstable();
        prices.dedup();
        if side == 0 {
            prices.reverse();
        }
        prices
            .into_iter()
            .map(|price| {
                let quantity: i64 = self
                    .resting
                    .iter()
                    .filter(|r| r.side == side && r.price == price)
                    .map(|r| r.quantity)
                    .sum();
                json!({ "price": price, "quantity": quantity })
            })
            .collect()
    }
}

fn field(data: &Value, name: &str) -> i64 {
    data.get(name).and_then(Value::as_i64).unwrap_or(0)
}

fn handle(book: &Mutex<Book>, options: &MockOptions, request: &Value) -> Value {
    let mut book = book.lock().unwrap_or_else(PoisonError::into_inner);
    let data = request.get("data").cloned().unwrap_or(Value::Null);
    match request.get("action").and_then(Value::as_str).unwrap_or("") {
        "add_order" => match book.add(
            field(&data, "orderId"),
            field(&data, "side"),
            field(&data, "price"),
            field(&data, "quantity"),
            field(&data, "orderType"),
        ) {
            Ok(trades) => {
                let mut reply = json!({ "trades_count": trades.len(), "trades": trades });
                if !options.omit_add_success {
                    reply["success"] = Value::Bool(true);
                }
                reply
            }
            Err(error) => json!({ "success": false, "error": error }),
        },
        "cancel_order" => {
            if book.cancel(field(&data, "orderId")) {
                json!({ "success": true, "message": "Order cancelled" })
            } else {
                json!({ "success": false, "error": "order not found" })
            }
        }
        "get_size" if options.size_fails => {
            json!({ "success": false, "error": "size unavailable" })
        }
        "get_size" => json!({ "success": true, "size": book.resting.len() }),
        "get_orderbook" => {
            let mut reply = json!({
                "success": true,
                "bids": book.levels(0),
                "asks": book.levels(1),
            });
            if options.book_reports_total {
                reply["total_orders"] = json!(book.resting.len());
            }
            reply
        }
        other => json!({ "error": format!("Unknown action: {other}") }),
    }
}

async fn serve_connection(mut stream: TcpStream, book: Arc<Mutex<Book>>, options: MockOptions) {
    let mut reader = FrameReader::new(options.framing, 1024 * 1024);
    let mut replies = 0usize;
    loop {
        let Ok(frame) = reader.read_frame(&mut stream).await else {
            return;
        };
        let reply = match serde_json::from_slice::<Value>(&frame) {
            Ok(request) => handle(&book, &options, &request),
            Err(_) => json!({ "error": "Invalid JSON" }),
        };
        let Ok(bytes) = serde_json::to_vec(&reply) else {
            return;
        };
        if write_frame(&mut stream, options.framing, &bytes).await.is_err() {
            return;
        }
        replies += 1;
        if options.close_after.is_some_and(|limit| replies >= limit) {
            return;
        }
    }
}

/// Matching engine on an ephemeral loopback port. Stops on drop.
#[derive(Debug)]
pub struct MockEngine {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl MockEngine {
    /// Starts an engine with default options.
    pub async fn start() -> Self {
        Self::start_with(MockOptions::default()).await
    }

    /// Starts an engine with the given options.
    pub async fn start_with(options: MockOptions) -> Self {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind loopback listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener address");
        };
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        let book = Arc::new(Mutex::new(Book::default()));
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_connection(stream, Arc::clone(&book), options.clone()));
            }
        });
        Self {
            addr,
            accepted,
            task,
        }
    }

    /// Loopback port the engine listens on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Waits (up to two seconds) until at least `n` connections have been
    /// accepted and returns the count observed.
    pub async fn wait_accepted(&self, n: usize) -> usize {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.accepted() < n && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.accepted()
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Session settings with short deadlines for tests.
pub fn test_settings(framing: Framing) -> SessionSettings {
    SessionSettings {
        connect_timeout: Duration::from_secs(2),
        request_timeout: Some(Duration::from_secs(2)),
        framing,
        max_frame_bytes: 1024 * 1024,
    }
}

/// Order service over `pool_size` sessions to `engine`, none connected yet.
pub fn unconnected_service(
    engine: &MockEngine,
    pool_size: usize,
    framing: Framing,
    reconnect_on_acquire: bool,
) -> OrderService {
    let pool = SessionPool::new(
        "127.0.0.1",
        engine.port(),
        pool_size,
        &test_settings(framing),
        reconnect_on_acquire,
    );
    OrderService::new(Arc::new(pool), false)
}

/// Connected order service backed by `pool_size` sessions to `engine`, with
/// the default (explicit-only) recovery policy.
pub async fn connected_service(engine: &MockEngine, pool_size: usize, framing: Framing) -> OrderService {
    let service = unconnected_service(engine, pool_size, framing, false);
    let Ok(()) = service.pool().connect_all().await else {
        panic!("connect to mock engine");
    };
    service
}

/// Application state over a single-session pool.
pub async fn app_state(engine: &MockEngine) -> AppState {
    AppState::new(connected_service(engine, 1, Framing::Json).await)
}
