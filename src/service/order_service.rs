//! Order service: the four gateway operations on top of the engine bridge.

use std::sync::Arc;

use tracing::Instrument;

use crate::domain::{CancelAck, OrderAck, OrderBookSnapshot, OrderId, OrderIntent};
use crate::engine::codec::{self, AddOrderReply, BookReply, CancelReply, SizeReply};
use crate::engine::{EngineError, EngineSession, Fields, SessionPool, WireRequest};
use crate::error::GatewayError;

/// Orchestration layer for all engine operations.
///
/// Stateless coordinator: owns a handle to the [`SessionPool`] and nothing
/// else. Every operation follows the pattern: lease a session → encode →
/// send and receive → decode → interpret. Nothing is retried and nothing is
/// cached; each call either fully succeeds or returns an error.
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: Arc<SessionPool>,
    strict_success: bool,
}

impl OrderService {
    /// Creates a new `OrderService`.
    ///
    /// With `strict_success`, every engine reply must carry
    /// `"success": true`. Without it, an `add_order` reply lacking the flag
    /// counts as accepted, matching what the reference engine sends.
    #[must_use]
    pub fn new(pool: Arc<SessionPool>, strict_success: bool) -> Self {
        Self {
            pool,
            strict_success,
        }
    }

    /// Returns a reference to the inner [`SessionPool`].
    #[must_use]
    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }

    /// Places an order.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OrderRejected`] if the engine reports failure.
    /// - [`GatewayError::EngineUnavailable`] on any transport failure.
    pub async fn add_order(&self, intent: OrderIntent) -> Result<OrderAck, GatewayError> {
        let request = WireRequest::add_order(&intent)?;
        let fields = {
            let mut lease = self.pool.acquire().await?;
            exchange(&mut lease, &request).await?
        };

        let ack = settle_add(codec::interpret(fields)?, self.strict_success)?;
        tracing::info!(
            order_id = intent.order_id,
            side = %intent.side,
            price = intent.price,
            quantity = intent.quantity,
            trades_count = ack.trades_count,
            "order accepted"
        );
        Ok(ack)
    }

    /// Cancels a resting order.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::CancelRejected`] if the engine reports failure or
    ///   omits the success flag.
    /// - [`GatewayError::EngineUnavailable`] on any transport failure.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<CancelAck, GatewayError> {
        let request = WireRequest::cancel_order(order_id)?;
        let fields = {
            let mut lease = self.pool.acquire().await?;
            exchange(&mut lease, &request).await?
        };

        let ack = settle_cancel(order_id, codec::interpret(fields)?)?;
        tracing::info!(order_id, "order cancelled");
        Ok(ack)
    }

    /// Fetches a fresh snapshot of both sides of the book.
    ///
    /// `total_orders` is taken from the book reply when the engine includes
    /// it; otherwise a `get_size` is issued on the same leased session
    /// before it is released. Either both reads succeed or no snapshot is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::SnapshotUnavailable`] if the engine reports failure
    ///   or omits the success flag on the book reply, or if the follow-up
    ///   size reply reports failure or carries no size.
    /// - [`GatewayError::EngineUnavailable`] on any transport failure,
    ///   including one during the follow-up size read.
    pub async fn get_snapshot(&self) -> Result<OrderBookSnapshot, GatewayError> {
        let mut lease = self.pool.acquire().await?;

        let fields = exchange(&mut lease, &WireRequest::get_orderbook()).await?;
        let book = settle_book(codec::interpret(fields)?)?;

        let total_orders = match book.total_orders {
            Some(total) => total,
            None => {
                let fields = exchange(&mut lease, &WireRequest::get_size()).await?;
                settle_size(codec::interpret(fields)?, self.strict_success).map_err(
                    |err| match err {
                        GatewayError::EngineUnavailable(EngineError::MalformedResponse(why)) => {
                            GatewayError::SnapshotUnavailable(why)
                        }
                        other => other,
                    },
                )?
            }
        };
        drop(lease);

        Ok(OrderBookSnapshot {
            bids: book.bids,
            asks: book.asks,
            total_orders,
        })
    }

    /// Returns the number of resting orders as reported by the engine.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EngineUnavailable`] on transport failure or
    /// if the reply carries no size.
    pub async fn get_size(&self) -> Result<i64, GatewayError> {
        let fields = {
            let mut lease = self.pool.acquire().await?;
            exchange(&mut lease, &WireRequest::get_size()).await?
        };
        settle_size(codec::interpret(fields)?, self.strict_success)
    }

    /// Liveness probe: a `get_size` round trip.
    ///
    /// # Errors
    ///
    /// Same as [`OrderService::get_size`].
    pub async fn health(&self) -> Result<i64, GatewayError> {
        self.get_size().await
    }

    /// Explicitly reconnects every pooled session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EngineUnavailable`] if any session fails to
    /// reconnect.
    pub async fn reconnect(&self) -> Result<usize, GatewayError> {
        Ok(self.pool.reconnect_all().await?)
    }

    /// Releases every engine socket.
    pub async fn shutdown(&self) {
        self.pool.disconnect_all().await;
    }
}

/// Runs one encode → send → receive → decode cycle on a leased session.
async fn exchange(session: &mut EngineSession, request: &WireRequest) -> Result<Fields, EngineError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::debug_span!("engine_call", %request_id, action = request.action.as_str());
    async {
        let bytes = codec::encode(request)?;
        let reply = session.send_and_receive(&bytes).await?;
        tracing::debug!(request_bytes = bytes.len(), reply_bytes = reply.len(), "engine replied");
        codec::decode(&reply)
    }
    .instrument(span)
    .await
}

fn reason(error: Option<String>, fallback: &str) -> String {
    error
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Interprets an `add_order` reply.
fn settle_add(reply: AddOrderReply, strict: bool) -> Result<OrderAck, GatewayError> {
    let accepted = match reply.success {
        Some(flag) => flag,
        None => !strict && reply.error.is_none(),
    };
    if !accepted {
        return Err(GatewayError::OrderRejected(reason(reply.error, "order failed")));
    }

    let trades_count = match reply.trades_count {
        Some(count) => count,
        None => i64::try_from(reply.trades.len()).unwrap_or(i64::MAX),
    };
    Ok(OrderAck {
        trades_count,
        trades: reply.trades,
    })
}

/// Interprets a `cancel_order` reply. Only an explicit `true` succeeds.
fn settle_cancel(order_id: OrderId, reply: CancelReply) -> Result<CancelAck, GatewayError> {
    if reply.success == Some(true) {
        Ok(CancelAck {
            order_id,
            cancelled: true,
        })
    } else {
        Err(GatewayError::CancelRejected(reason(reply.error, "cancel failed")))
    }
}

/// Interprets a `get_orderbook` reply. Only an explicit `true` succeeds.
fn settle_book(reply: BookReply) -> Result<BookReply, GatewayError> {
    if reply.success == Some(true) {
        Ok(reply)
    } else {
        Err(GatewayError::SnapshotUnavailable(reason(
            reply.error,
            "failed to retrieve order book",
        )))
    }
}

/// Interprets a `get_size` reply.
///
/// An explicit `false` (or, in strict mode, a missing flag) and a missing
/// `size` are both treated as an unusable reply.
fn settle_size(reply: SizeReply, strict: bool) -> Result<i64, GatewayError> {
    let failed = match reply.success {
        Some(flag) => !flag,
        None => strict,
    };
    if failed {
        return Err(EngineError::MalformedResponse(format!(
            "get_size failed: {}",
            reason(reply.error, "no success flag")
        ))
        .into());
    }
    reply
        .size
        .ok_or_else(|| EngineError::MalformedResponse("get_size reply has no size".to_string()).into())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Trade;

    fn trade(price: i64) -> Trade {
        let Ok(trade) = serde_json::from_value(serde_json::json!({
            "bid_order_id": 1,
            "ask_order_id": 2,
            "price": price,
            "quantity": 5
        })) else {
            panic!("valid trade");
        };
        trade
    }

    #[test]
    fn add_without_flag_is_accepted_unless_strict() {
        let reply = AddOrderReply {
            trades_count: Some(0),
            ..AddOrderReply::default()
        };
        assert!(settle_add(reply.clone(), false).is_ok());
        assert!(matches!(
            settle_add(reply, true),
            Err(GatewayError::OrderRejected(_))
        ));
    }

    #[test]
    fn add_with_error_and_no_flag_is_rejected() {
        let reply = AddOrderReply {
            error: Some("Invalid JSON".to_string()),
            ..AddOrderReply::default()
        };
        let Err(GatewayError::OrderRejected(why)) = settle_add(reply, false) else {
            panic!("expected rejection");
        };
        assert_eq!(why, "Invalid JSON");
    }

    #[test]
    fn add_keeps_engine_trade_count() {
        let reply = AddOrderReply {
            success: Some(true),
            trades_count: Some(3),
            trades: vec![trade(100)],
            ..AddOrderReply::default()
        };
        let Ok(ack) = settle_add(reply, true) else {
            panic!("expected ack");
        };
        assert_eq!(ack.trades_count, 3);
        assert_eq!(ack.trades.len(), 1);
    }

    #[test]
    fn add_counts_trades_when_count_missing() {
        let reply = AddOrderReply {
            trades: vec![trade(100), trade(101)],
            ..AddOrderReply::default()
        };
        let Ok(ack) = settle_add(reply, false) else {
            panic!("expected ack");
        };
        assert_eq!(ack.trades_count, 2);
    }

    #[test]
    fn cancel_requires_explicit_success() {
        assert!(settle_cancel(1, CancelReply::default()).is_err());

        let rejected = CancelReply {
            success: Some(false),
            error: Some("order not found".to_string()),
            ..CancelReply::default()
        };
        let Err(GatewayError::CancelRejected(why)) = settle_cancel(9, rejected) else {
            panic!("expected rejection");
        };
        assert_eq!(why, "order not found");

        let accepted = CancelReply {
            success: Some(true),
            ..CancelReply::default()
        };
        assert!(matches!(
            settle_cancel(9, accepted),
            Ok(CancelAck {
                order_id: 9,
                cancelled: true
            })
        ));
    }

    #[test]
    fn book_requires_explicit_success() {
        let result = settle_book(BookReply::default());
        assert!(matches!(result, Err(GatewayError::SnapshotUnavailable(_))));
    }

    #[test]
    fn size_failures_are_transport_errors() {
        let missing = SizeReply {
            success: Some(true),
            ..SizeReply::default()
        };
        let result = settle_size(missing, false);
        assert!(matches!(result, Err(ref e) if e.is_transport()));

        let unflagged = SizeReply {
            size: Some(4),
            ..SizeReply::default()
        };
        assert!(matches!(settle_size(unflagged.clone(), false), Ok(4)));
        assert!(settle_size(unflagged, true).is_err());
    }
}
