// Solraffle - State
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::{error::RaffleError, vrf};

/// Participant slots available to a single round
pub const MAX_PARTICIPANTS: usize = 128;
const PARTICIPANTS_LEN: usize = 32 * MAX_PARTICIPANTS;

/// Lifecycle of the current round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Waiting for the coordinator to deliver randomness
    Calculating,
}

impl TryFrom<u8> for RaffleState {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err("Invalid raffle state"),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Parameters fixed when the raffle is initialized
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum payment in lamports to enter
    pub entrance_fee: u64,
    /// Minimum seconds between the start of a round and its draw
    pub interval: u64,
    /// Program that serves randomness requests
    pub vrf_coordinator: Pubkey,
    /// Subscription billed by the coordinator
    pub subscription_id: u64,
    /// Gas lane / fee tier of the coordinator
    pub key_hash: [u8; 32],
    /// Compute budget the fulfiller must provide for the callback
    pub callback_gas_limit: u32,
}

/// Snapshot taken by an upkeep check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    pub pot: u64,
    pub players: usize,
    pub state: RaffleState,
    pub elapsed: u64,
}

/// Raffle account data.
///
/// A single round lives in these fields and is reset in place after every
/// payout. Fields are private: every mutation goes through the round
/// transitions below.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    is_initialized: bool,
    config: RaffleConfig,
    state: RaffleState,
    participants: Vec<Pubkey>,
    last_timestamp: UnixTimestamp,
    pending_request_id: Option<u64>,
    recent_winner: Option<Pubkey>,
}

impl Raffle {
    /// Open the first round at `now`
    pub fn new(config: RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            config,
            state: RaffleState::Open,
            participants: Vec::new(),
            last_timestamp: now,
            pending_request_id: None,
            recent_winner: None,
        }
    }

    /// Register `player` for the current round.
    ///
    /// The payment itself is moved by the caller; this only validates it and
    /// records the slot.
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<(), RaffleError> {
        if amount < self.config.entrance_fee {
            return Err(RaffleError::InsufficientPayment);
        }
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen);
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(RaffleError::RaffleFull);
        }
        self.participants.push(player);
        Ok(())
    }

    /// Evaluate draw eligibility at `now` with `pot` lamports held
    pub fn check_upkeep(&self, now: UnixTimestamp, pot: u64) -> UpkeepCheck {
        let elapsed = u64::try_from(now.saturating_sub(self.last_timestamp)).unwrap_or(0);
        let upkeep_needed = elapsed >= self.config.interval
            && self.state == RaffleState::Open
            && pot > 0
            && !self.participants.is_empty();

        UpkeepCheck {
            upkeep_needed,
            pot,
            players: self.participants.len(),
            state: self.state,
            elapsed,
        }
    }

    /// Close entries and correlate the round with `request_id`
    pub fn start_calculating(&mut self, request_id: u64) -> Result<(), RaffleError> {
        if self.state != RaffleState::Open || self.pending_request_id.is_some() {
            return Err(RaffleError::RaffleNotOpen);
        }
        self.state = RaffleState::Calculating;
        self.pending_request_id = Some(request_id);
        Ok(())
    }

    /// Participant selected by `random_words` for the current registry
    pub fn winner_for(&self, random_words: &[u64]) -> Result<Pubkey, RaffleError> {
        let word = random_words
            .first()
            .copied()
            .ok_or(RaffleError::MissingRandomWords)?;
        let index = vrf::winner_index(word, self.participants.len())
            .ok_or(RaffleError::IndexOutOfRange)?;
        self.player(index)
    }

    /// Resolve the pending request. Does not mutate; see `reset_round`.
    pub fn draw_winner(&self, request_id: u64, random_words: &[u64]) -> Result<Pubkey, RaffleError> {
        match self.pending_request_id {
            Some(pending) if pending == request_id && self.state == RaffleState::Calculating => {}
            _ => return Err(RaffleError::UnknownRequest),
        }
        self.winner_for(random_words)
    }

    /// Record `winner` and open a fresh round at `now`
    pub fn reset_round(&mut self, winner: Pubkey, now: UnixTimestamp) {
        self.recent_winner = Some(winner);
        self.participants.clear();
        self.last_timestamp = now;
        self.state = RaffleState::Open;
        self.pending_request_id = None;
    }

    pub fn config(&self) -> &RaffleConfig {
        &self.config
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    pub fn vrf_coordinator(&self) -> &Pubkey {
        &self.config.vrf_coordinator
    }

    pub fn subscription_id(&self) -> u64 {
        self.config.subscription_id
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    /// Participant in slot `index` of the current round
    pub fn player(&self, index: usize) -> Result<Pubkey, RaffleError> {
        self.participants
            .get(index)
            .copied()
            .ok_or(RaffleError::IndexOutOfRange)
    }

    pub fn number_of_players(&self) -> usize {
        self.participants.len()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Raffle {
    const LEN: usize = 1 + 1 + 8 + 8 + 32 + 8 + 32 + 4 + 8 + 1 + 8 + 1 + 32 + 2 + PARTICIPANTS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            state,
            entrance_fee,
            interval,
            vrf_coordinator,
            subscription_id,
            key_hash,
            callback_gas_limit,
            last_timestamp,
            has_pending,
            pending_request_id,
            has_winner,
            recent_winner,
            participant_count,
            participants,
        ) = array_refs![src, 1, 1, 8, 8, 32, 8, 32, 4, 8, 1, 8, 1, 32, 2, PARTICIPANTS_LEN];

        let state = RaffleState::try_from(state[0]).map_err(|_| ProgramError::InvalidAccountData)?;

        let count = u16::from_le_bytes(*participant_count) as usize;
        if count > MAX_PARTICIPANTS {
            return Err(ProgramError::InvalidAccountData);
        }
        let participants = participants
            .chunks_exact(32)
            .take(count)
            .map(|chunk| {
                let mut key = [0u8; 32];
                key.copy_from_slice(chunk);
                Pubkey::new_from_array(key)
            })
            .collect();

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            config: RaffleConfig {
                entrance_fee: u64::from_le_bytes(*entrance_fee),
                interval: u64::from_le_bytes(*interval),
                vrf_coordinator: Pubkey::new_from_array(*vrf_coordinator),
                subscription_id: u64::from_le_bytes(*subscription_id),
                key_hash: *key_hash,
                callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            },
            state,
            participants,
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            pending_request_id: (has_pending[0] != 0)
                .then(|| u64::from_le_bytes(*pending_request_id)),
            recent_winner: (has_winner[0] != 0).then(|| Pubkey::new_from_array(*recent_winner)),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            state_dst,
            entrance_fee_dst,
            interval_dst,
            vrf_coordinator_dst,
            subscription_id_dst,
            key_hash_dst,
            callback_gas_limit_dst,
            last_timestamp_dst,
            has_pending_dst,
            pending_request_id_dst,
            has_winner_dst,
            recent_winner_dst,
            participant_count_dst,
            participants_dst,
        ) = mut_array_refs![dst, 1, 1, 8, 8, 32, 8, 32, 4, 8, 1, 8, 1, 32, 2, PARTICIPANTS_LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        state_dst[0] = self.state.into();
        *entrance_fee_dst = self.config.entrance_fee.to_le_bytes();
        *interval_dst = self.config.interval.to_le_bytes();
        vrf_coordinator_dst.copy_from_slice(self.config.vrf_coordinator.as_ref());
        *subscription_id_dst = self.config.subscription_id.to_le_bytes();
        *key_hash_dst = self.config.key_hash;
        *callback_gas_limit_dst = self.config.callback_gas_limit.to_le_bytes();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();

        has_pending_dst[0] = self.pending_request_id.is_some() as u8;
        *pending_request_id_dst = self.pending_request_id.unwrap_or_default().to_le_bytes();

        has_winner_dst[0] = self.recent_winner.is_some() as u8;
        recent_winner_dst.copy_from_slice(self.recent_winner.unwrap_or_default().as_ref());

        *participant_count_dst = (self.participants.len() as u16).to_le_bytes();
        participants_dst.fill(0);
        for (slot, player) in participants_dst.chunks_exact_mut(32).zip(&self.participants) {
            slot.copy_from_slice(player.as_ref());
        }
    }
}
