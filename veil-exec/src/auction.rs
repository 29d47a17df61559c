//! Private Auction
//!
//! Sealed-bid auctions with an optionally encrypted reserve. Creation and
//! bidding validate advisorily (`None` on bad input); settlement walks
//! `Bidding -> Settling -> Completed` and produces a winner plus a
//! winning-bid proof.
//!
//! Winner selection is deterministic: highest bid, earliest submission on
//! ties. A deployment comparing encrypted bids would replace
//! `select_winner` with a homomorphic comparison against the encryptor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::collaborators::EncryptedValue;
use crate::error::{ExecError, ExecResult};
use crate::pipeline::ExecutionPipeline;
use veil_core::{AgentId, AuctionId};

/// Auction lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// Accepting bids
    Bidding,
    /// Winner selection in progress
    Settling,
    /// Settled; terminal
    Completed,
}

impl AuctionStatus {
    /// Get status name
    pub fn name(&self) -> &'static str {
        match self {
            AuctionStatus::Bidding => "bidding",
            AuctionStatus::Settling => "settling",
            AuctionStatus::Completed => "completed",
        }
    }
}

/// One sealed bid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionBid {
    /// Bidding agent
    pub bidder: AgentId,
    /// Bid amount
    pub amount: Decimal,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

/// One private auction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivateAuction {
    /// Auction id
    pub auction_id: AuctionId,
    /// Auctioneer reference
    pub auctioneer: String,
    /// Asset under auction
    pub asset: String,
    /// Reserve price
    pub reserve: Decimal,
    /// Encrypted reserve when requested at creation
    pub encrypted_reserve: Option<EncryptedValue>,
    /// Lifecycle status
    pub status: AuctionStatus,
    /// Bids in submission order
    pub bids: Vec<AuctionBid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Settlement outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionSettlement {
    /// Auction id
    pub auction_id: AuctionId,
    /// Winning agent
    pub winner: AgentId,
    /// Winning amount
    pub winning_amount: Decimal,
    /// Winning-bid proof if the prover produced one
    pub winning_bid_proof: Option<String>,
    /// Settlement time
    pub settled_at: DateTime<Utc>,
}

impl ExecutionPipeline {
    /// Create an auction. Blank auctioneer/asset or a negative reserve is
    /// rejected with `None`; so is a failed reserve encryption, since the
    /// reserve must not be stored in the clear when encryption was asked for.
    pub async fn create_auction(
        &self,
        auctioneer: &str,
        asset: &str,
        reserve: Decimal,
        encrypt_reserve: bool,
    ) -> Option<AuctionId> {
        let auctioneer = auctioneer.trim();
        let asset = asset.trim();
        if auctioneer.is_empty() || asset.is_empty() || reserve < Decimal::ZERO {
            return None;
        }

        let encrypted_reserve = if encrypt_reserve {
            match self
                .encryptor
                .encrypt(&reserve.to_string(), "euint128")
                .await
            {
                Ok(value) => Some(value),
                Err(error) => {
                    warn!(error = %error, "reserve encryption failed, auction not created");
                    return None;
                }
            }
        } else {
            None
        };

        let auction_id = self.tokens.auction_id();
        let auction = PrivateAuction {
            auction_id: auction_id.clone(),
            auctioneer: auctioneer.to_string(),
            asset: asset.to_string(),
            reserve,
            encrypted_reserve,
            status: AuctionStatus::Bidding,
            bids: Vec::new(),
            created_at: Utc::now(),
        };
        self.auctions.write().await.insert(auction_id.clone(), auction);

        info!(auction_id = %auction_id, asset = asset, "auction created");
        Some(auction_id)
    }

    /// Submit a bid. Non-positive amounts, unknown auctions, and auctions
    /// not in `Bidding` status are rejected with `None`. Returns the bid's
    /// position in submission order.
    pub async fn submit_bid(
        &self,
        auction_id: &AuctionId,
        bidder: AgentId,
        amount: Decimal,
    ) -> Option<usize> {
        if amount <= Decimal::ZERO {
            return None;
        }

        let mut auctions = self.auctions.write().await;
        let auction = auctions.get_mut(auction_id)?;
        if auction.status != AuctionStatus::Bidding {
            return None;
        }

        auction.bids.push(AuctionBid {
            bidder,
            amount,
            submitted_at: Utc::now(),
        });
        Some(auction.bids.len() - 1)
    }

    /// Settle an auction: requires at least one bid, transitions
    /// `Bidding -> Settling -> Completed`, returns the winner and a
    /// winning-bid proof.
    pub async fn settle_auction(&self, auction_id: &AuctionId) -> ExecResult<AuctionSettlement> {
        // Claim the settling transition under the lock; concurrent settles
        // of one auction see a non-bidding status.
        let bids = {
            let mut auctions = self.auctions.write().await;
            let auction =
                auctions
                    .get_mut(auction_id)
                    .ok_or_else(|| ExecError::AuctionNotFound {
                        auction_id: auction_id.clone(),
                    })?;
            if auction.status != AuctionStatus::Bidding {
                return Err(ExecError::AuctionNotBidding {
                    auction_id: auction_id.clone(),
                    status: auction.status.name().to_string(),
                });
            }
            if auction.bids.is_empty() {
                return Err(ExecError::AuctionWithoutBids {
                    auction_id: auction_id.clone(),
                });
            }
            auction.status = AuctionStatus::Settling;
            auction.bids.clone()
        };

        let winner = select_winner(&bids);

        let mut public_inputs = BTreeMap::new();
        public_inputs.insert("auction_id".to_string(), auction_id.to_string());
        public_inputs.insert("winner".to_string(), winner.bidder.to_string());

        let mut private_inputs = BTreeMap::new();
        private_inputs.insert("winning_amount".to_string(), winner.amount.to_string());

        let winning_bid_proof = match self
            .prover
            .prove("winning_bid", public_inputs, private_inputs)
            .await
        {
            Ok(proof) => Some(proof.proof),
            Err(error) => {
                warn!(auction_id = %auction_id, error = %error, "winning-bid proof unavailable");
                None
            }
        };

        {
            let mut auctions = self.auctions.write().await;
            if let Some(auction) = auctions.get_mut(auction_id) {
                auction.status = AuctionStatus::Completed;
            }
        }

        info!(
            auction_id = %auction_id,
            winner = %winner.bidder,
            bids = bids.len(),
            "auction settled"
        );

        Ok(AuctionSettlement {
            auction_id: auction_id.clone(),
            winner: winner.bidder.clone(),
            winning_amount: winner.amount,
            winning_bid_proof,
            settled_at: Utc::now(),
        })
    }

    /// Tear an auction down. Returns whether it existed.
    pub async fn close_auction(&self, auction_id: &AuctionId) -> bool {
        self.auctions.write().await.remove(auction_id).is_some()
    }
}

/// Highest bid wins; strict comparison keeps the earliest submission on ties.
fn select_winner(bids: &[AuctionBid]) -> &AuctionBid {
    let mut winner = &bids[0];
    for bid in &bids[1..] {
        if bid.amount > winner.amount {
            winner = bid;
        }
    }
    winner
}
