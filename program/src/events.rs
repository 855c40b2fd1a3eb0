// Solraffle - Events
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Round milestones published to indexers
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    Entered { player: Pubkey },
    RandomnessRequested { request_id: u64 },
    WinnerPicked { winner: Pubkey },
}

impl RaffleEvent {
    /// Log the event as borsh program data
    pub fn emit(&self) {
        msg!("Event: {:?}", self);
        match self.try_to_vec() {
            Ok(data) => sol_log_data(&[&data]),
            Err(e) => msg!("Failed to encode event: {}", e),
        }
    }
}
