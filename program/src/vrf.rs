// Solraffle - VRF coordinator interface
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke},
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{error::RaffleError, state::RaffleConfig};

/// Seed of the coordinator PDA that signs fulfillment callbacks
pub const VRF_IDENTITY_SEED: &[u8] = b"vrf-identity";

/// Blocks the coordinator waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Instructions understood by a VRF coordinator program.
///
/// The coordinator answers `RequestRandomWords` by setting the request id
/// (u64, little endian) as return data, and later invokes the consumer's
/// fulfillment instruction signed by its `VRF_IDENTITY_SEED` PDA.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Accounts expected:
    /// 0. `[writable]` Coordinator state (subscriptions and request counter)
    /// 1. `[]` Consumer account the fulfillment will target
    /// 2..  Coordinator specific accounts
    RequestRandomWords {
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
}

/// Address allowed to deliver randomness on behalf of `coordinator`
pub fn find_vrf_identity(coordinator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VRF_IDENTITY_SEED], coordinator)
}

/// Ask the configured coordinator for randomness and return its request id
pub fn request_random_words<'a>(
    config: &RaffleConfig,
    coordinator_program: &AccountInfo<'a>,
    coordinator_state: &AccountInfo<'a>,
    consumer: &AccountInfo<'a>,
    remaining_accounts: &[AccountInfo<'a>],
) -> Result<u64, ProgramError> {
    if coordinator_program.key != &config.vrf_coordinator {
        msg!("Coordinator {} is not the configured one", coordinator_program.key);
        return Err(RaffleError::InvalidCoordinator.into());
    }

    let data = CoordinatorInstruction::RequestRandomWords {
        key_hash: config.key_hash,
        subscription_id: config.subscription_id,
        request_confirmations: REQUEST_CONFIRMATIONS,
        callback_gas_limit: config.callback_gas_limit,
        num_words: NUM_WORDS,
    }
    .try_to_vec()
    .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;

    let mut accounts = vec![
        AccountMeta::new(*coordinator_state.key, false),
        AccountMeta::new_readonly(*consumer.key, false),
    ];
    accounts.extend(remaining_accounts.iter().map(|account| {
        if account.is_writable {
            AccountMeta::new(*account.key, account.is_signer)
        } else {
            AccountMeta::new_readonly(*account.key, account.is_signer)
        }
    }));

    let mut account_infos = vec![coordinator_state.clone(), consumer.clone()];
    account_infos.extend_from_slice(remaining_accounts);
    account_infos.push(coordinator_program.clone());

    invoke(
        &Instruction {
            program_id: config.vrf_coordinator,
            accounts,
            data,
        },
        &account_infos,
    )?;

    let request_id = read_request_id(&config.vrf_coordinator, get_return_data())?;
    msg!("Randomness requested, id {}", request_id);
    Ok(request_id)
}

/// Decode the request id the coordinator left as return data
pub fn read_request_id(
    coordinator: &Pubkey,
    return_data: Option<(Pubkey, Vec<u8>)>,
) -> Result<u64, RaffleError> {
    match return_data {
        Some((program_id, data)) if program_id == *coordinator => data
            .get(..8)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::MissingRequestId),
        _ => Err(RaffleError::MissingRequestId),
    }
}

/// Reject fulfillments not signed by the coordinator identity
pub fn verify_callback_authority(authority: &AccountInfo, coordinator: &Pubkey) -> ProgramResult {
    if !authority.is_signer {
        msg!("Callback authority must sign");
        return Err(ProgramError::MissingRequiredSignature);
    }
    let (identity, _) = find_vrf_identity(coordinator);
    if authority.key != &identity {
        msg!("Callback signed by {}, expected {}", authority.key, identity);
        return Err(RaffleError::InvalidCallbackAuthority.into());
    }
    Ok(())
}

/// Participant slot picked by `random_word`, `None` for an empty round
pub fn winner_index(random_word: u64, players: usize) -> Option<usize> {
    if players == 0 {
        return None;
    }
    Some((random_word % players as u64) as usize)
}
