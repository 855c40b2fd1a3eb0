// Solraffle
// An automated raffle: players buy in, a keeper closes the round once the
// interval has passed, and a VRF coordinator picks the winner.

pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;

// Randomness requests and callback authentication
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, program_error::PrintProgramError,
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Dispatch and log failures; shared by the BPF entrypoint and program-test hosts
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if let Err(error) = processor::Processor::process(program_id, accounts, instruction_data) {
        error.print::<RaffleError>();
        return Err(error);
    }
    Ok(())
}
