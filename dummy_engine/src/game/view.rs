//! Per-viewer snapshots. Opponent hands are reduced to card counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    cards::{Card, GamerId, MeldId},
    melds::MeldKind,
    scoring::{PlayerTotals, WinningType},
    session::{GameSession, SessionId, SessionStatus},
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MeldView {
    pub id: MeldId,
    pub kind: MeldKind,
    pub owner: GamerId,
    pub cards: Vec<Card>,
    pub created_from_head: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerView {
    pub gamer_id: GamerId,
    pub seat: usize,
    pub card_count: usize,
    pub totals: PlayerTotals,
    pub total_points: i32,
}

/// What one player may see of a session at a given version.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameStatePayload {
    pub session_id: SessionId,
    pub room_id: String,
    pub version: u64,
    pub status: SessionStatus,
    pub round_number: u32,
    pub phase: String,
    /// Only set while the session is active.
    pub current_turn_gamer_id: Option<GamerId>,
    pub turn_started_at: DateTime<Utc>,
    pub winner_id: Option<GamerId>,
    pub winning_type: Option<WinningType>,
    /// The viewer's own hand; `None` for spectators.
    pub hand: Option<Vec<Card>>,
    pub discard_top: Option<Card>,
    pub discard_count: usize,
    pub deck_remaining: usize,
    pub melds: Vec<MeldView>,
    pub players: Vec<PlayerView>,
}

impl GameSession {
    #[must_use]
    pub fn view_for(&self, viewer: GamerId) -> GameStatePayload {
        let totals = self.totals();
        let players = self
            .players()
            .iter()
            .enumerate()
            .map(|(seat, &gamer_id)| {
                let totals = totals.get(&gamer_id).copied().unwrap_or_default();
                PlayerView {
                    gamer_id,
                    seat,
                    card_count: self.hand(gamer_id).map_or(0, |h| h.len()),
                    total_points: totals.total(),
                    totals,
                }
            })
            .collect();
        let melds = self
            .melds()
            .iter()
            .map(|m| MeldView {
                id: m.id,
                kind: m.kind,
                owner: m.owner,
                cards: m.cards.clone(),
                created_from_head: m.created_from_head,
            })
            .collect();

        GameStatePayload {
            session_id: self.id(),
            room_id: self.room_id().to_string(),
            version: self.version(),
            status: self.status().clone(),
            round_number: self.turns().round_number(),
            phase: self.turns().phase().to_string(),
            current_turn_gamer_id: self.is_active().then(|| self.current_turn_gamer_id()),
            turn_started_at: self.turns().turn_started_at(),
            winner_id: self.winner_id(),
            winning_type: self.winning_type(),
            hand: self.hand(viewer).map(|h| h.to_vec()),
            discard_top: self.discard_pile().top(),
            discard_count: self.discard_pile().len(),
            deck_remaining: self.deck().len(),
            melds,
            players,
        }
    }
}
