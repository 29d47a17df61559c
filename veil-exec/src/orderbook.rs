//! Encrypted Order Book
//!
//! Long-lived books keyed by id; orders carry a 0x-prefixed commitment in
//! place of revealed terms. Validation is advisory: bad input returns
//! `None`, never an error, so callers branch without exception handling.
//!
//! Matching pairs bids and asks positionally by submission order (bid[i]
//! against ask[i]), not by best price. The positional rule is a deliberate
//! simplification; replace it explicitly or not at all.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::{ExecError, ExecResult};
use crate::pipeline::ExecutionPipeline;
use veil_core::{AgentId, Digest, OrderId, OrderbookId};

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Bid,
    Ask,
}

impl OrderSide {
    /// Get side name
    pub fn name(&self) -> &'static str {
        match self {
            OrderSide::Bid => "bid",
            OrderSide::Ask => "ask",
        }
    }
}

/// One resting order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncryptedOrder {
    /// Order id
    pub order_id: OrderId,
    /// Submitting agent
    pub agent_id: AgentId,
    /// Side
    pub side: OrderSide,
    /// Limit price
    pub price: Decimal,
    /// Size
    pub size: Decimal,
    /// 0x-prefixed commitment over the order terms
    pub commitment: String,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

/// Acknowledgement returned to the submitter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Order id
    pub order_id: OrderId,
    /// 0x-prefixed commitment
    pub commitment: String,
}

/// One order book
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orderbook {
    /// Book id
    pub orderbook_id: OrderbookId,
    /// Asset pair label
    pub pair: String,
    /// Resting bids in submission order
    pub bids: Vec<EncryptedOrder>,
    /// Resting asks in submission order
    pub asks: Vec<EncryptedOrder>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One positional match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderMatch {
    /// Matched bid
    pub bid_order: OrderId,
    /// Matched ask
    pub ask_order: OrderId,
    /// Clearing price, midpoint of the two limits
    pub price: Decimal,
    /// Filled size, the smaller of the two
    pub size: Decimal,
    /// Match correctness proof if the prover produced one
    pub proof: Option<String>,
    /// Match time
    pub matched_at: DateTime<Utc>,
}

impl ExecutionPipeline {
    /// Create an order book. A blank pair label is rejected with `None`.
    pub async fn create_orderbook(&self, pair: &str) -> Option<OrderbookId> {
        let pair = pair.trim();
        if pair.is_empty() {
            return None;
        }

        let orderbook_id = self.tokens.orderbook_id();
        let book = Orderbook {
            orderbook_id: orderbook_id.clone(),
            pair: pair.to_string(),
            bids: Vec::new(),
            asks: Vec::new(),
            created_at: Utc::now(),
        };
        self.orderbooks
            .write()
            .await
            .insert(orderbook_id.clone(), book);

        info!(orderbook_id = %orderbook_id, pair = pair, "orderbook created");
        Some(orderbook_id)
    }

    /// Submit an order. Non-positive price or size, or an unknown book,
    /// returns `None`.
    pub async fn submit_encrypted_order(
        &self,
        orderbook_id: &OrderbookId,
        agent_id: AgentId,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
    ) -> Option<OrderAck> {
        if price <= Decimal::ZERO || size <= Decimal::ZERO {
            return None;
        }

        let mut books = self.orderbooks.write().await;
        let book = books.get_mut(orderbook_id)?;

        let order_id = self.tokens.order_id();
        let commitment = format!(
            "0x{}",
            Digest::blake3(
                format!(
                    "{}:{}:{}:{}:{}:{}",
                    orderbook_id,
                    agent_id,
                    side.name(),
                    price,
                    size,
                    order_id
                )
                .as_bytes()
            )
            .to_hex()
        );

        let order = EncryptedOrder {
            order_id: order_id.clone(),
            agent_id,
            side,
            price,
            size,
            commitment: commitment.clone(),
            submitted_at: Utc::now(),
        };
        match side {
            OrderSide::Bid => book.bids.push(order),
            OrderSide::Ask => book.asks.push(order),
        }

        Some(OrderAck {
            order_id,
            commitment,
        })
    }

    /// Match resting orders positionally and prove each match.
    ///
    /// Matched orders leave the book; a prover failure downgrades that
    /// match's proof to `None` rather than aborting the batch.
    pub async fn match_orders(&self, orderbook_id: &OrderbookId) -> ExecResult<Vec<OrderMatch>> {
        let pairs: Vec<(EncryptedOrder, EncryptedOrder)> = {
            let mut books = self.orderbooks.write().await;
            let book = books
                .get_mut(orderbook_id)
                .ok_or_else(|| ExecError::OrderbookNotFound {
                    orderbook_id: orderbook_id.clone(),
                })?;
            let depth = book.bids.len().min(book.asks.len());
            let bids: Vec<EncryptedOrder> = book.bids.drain(..depth).collect();
            let asks: Vec<EncryptedOrder> = book.asks.drain(..depth).collect();
            bids.into_iter().zip(asks).collect()
        };

        let mut matches = Vec::with_capacity(pairs.len());
        for (bid, ask) in pairs {
            let price = (bid.price + ask.price) / Decimal::new(2, 0);
            let size = bid.size.min(ask.size);

            let mut public_inputs = BTreeMap::new();
            public_inputs.insert("orderbook_id".to_string(), orderbook_id.to_string());
            public_inputs.insert("bid_commitment".to_string(), bid.commitment.clone());
            public_inputs.insert("ask_commitment".to_string(), ask.commitment.clone());

            let mut private_inputs = BTreeMap::new();
            private_inputs.insert("bid_price".to_string(), bid.price.to_string());
            private_inputs.insert("ask_price".to_string(), ask.price.to_string());
            private_inputs.insert("fill_size".to_string(), size.to_string());

            let proof = match self
                .prover
                .prove("order_match", public_inputs, private_inputs)
                .await
            {
                Ok(proof) => Some(proof.proof),
                Err(error) => {
                    warn!(
                        orderbook_id = %orderbook_id,
                        bid_order = %bid.order_id,
                        ask_order = %ask.order_id,
                        error = %error,
                        "match proof unavailable"
                    );
                    None
                }
            };

            matches.push(OrderMatch {
                bid_order: bid.order_id,
                ask_order: ask.order_id,
                price,
                size,
                proof,
                matched_at: Utc::now(),
            });
        }

        Ok(matches)
    }

    /// Tear an order book down. Returns whether it existed.
    pub async fn close_orderbook(&self, orderbook_id: &OrderbookId) -> bool {
        self.orderbooks.write().await.remove(orderbook_id).is_some()
    }
}
