// Solraffle - Instructions
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

use crate::state::RaffleConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleInstruction {
    /// Create the raffle account and open the first round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer of the raffle account rent
    /// 1. `[signer, writable]` The raffle account, not yet created
    /// 2. `[]` The VRF coordinator program
    /// 3. `[]` The system program
    InitializeRaffle {
        /// Minimum entry payment in lamports
        entrance_fee: u64,
        /// Seconds a round stays open before it can be drawn
        interval: u64,
        subscription_id: u64,
        key_hash: [u8; 32],
        callback_gas_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether a draw is due. Sets `(bool, Vec<u8>)` as borsh return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close the round and request randomness
    ///
    /// Accounts expected:
    /// 0. `[writable]` The raffle account
    /// 1. `[]` The VRF coordinator program
    /// 2. `[writable]` The coordinator state account
    /// 3.. Accounts forwarded to the coordinator
    PerformUpkeep { perform_data: Vec<u8> },

    /// Deliver randomness for the pending request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator identity PDA
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The drawn participant
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(ProgramError::InvalidInstructionData)?;

        let (instruction, rest) = match *tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                (
                    Self::InitializeRaffle {
                        entrance_fee,
                        interval,
                        subscription_id,
                        key_hash,
                        callback_gas_limit,
                    },
                    rest,
                )
            }
            1 => {
                let (amount, rest) = Self::unpack_u64(rest)?;
                (Self::EnterRaffle { amount }, rest)
            }
            2 => {
                let (check_data, rest) = Self::unpack_bytes(rest)?;
                (Self::CheckUpkeep { check_data }, rest)
            }
            3 => {
                let (perform_data, rest) = Self::unpack_bytes(rest)?;
                (Self::PerformUpkeep { perform_data }, rest)
            }
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (random_words, rest) = Self::unpack_words(rest)?;
                (
                    Self::FulfillRandomWords {
                        request_id,
                        random_words,
                    },
                    rest,
                )
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        };

        if !rest.is_empty() {
            return Err(ProgramError::InvalidInstructionData);
        }
        Ok(instruction)
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                subscription_id,
                key_hash,
                callback_gas_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep { check_data } => {
                buf.push(2);
                Self::pack_bytes(&mut buf, check_data);
            }
            Self::PerformUpkeep { perform_data } => {
                buf.push(3);
                Self::pack_bytes(&mut buf, perform_data);
            }
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        buf
    }

    fn pack_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
        buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(bytes);
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = input.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok((out, rest))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_bytes(input: &[u8]) -> Result<(Vec<u8>, &[u8]), ProgramError> {
        let (len, rest) = Self::unpack_u32(input)?;
        let len = len as usize;
        if rest.len() < len {
            return Err(ProgramError::InvalidInstructionData);
        }
        let (bytes, rest) = rest.split_at(len);
        Ok((bytes.to_vec(), rest))
    }

    fn unpack_words(input: &[u8]) -> Result<(Vec<u64>, &[u8]), ProgramError> {
        let (count, mut rest) = Self::unpack_u32(input)?;
        let needed = (count as usize)
            .checked_mul(8)
            .ok_or(ProgramError::InvalidInstructionData)?;
        if rest.len() < needed {
            return Err(ProgramError::InvalidInstructionData);
        }
        let mut words = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (word, next) = Self::unpack_u64(rest)?;
            words.push(word);
            rest = next;
        }
        Ok((words, rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    payer: &Pubkey,
    raffle_account: &Pubkey,
    config: &RaffleConfig,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee: config.entrance_fee,
        interval: config.interval,
        subscription_id: config.subscription_id,
        key_hash: config.key_hash,
        callback_gas_limit: config.callback_gas_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*raffle_account, true),
        AccountMeta::new_readonly(config.vrf_coordinator, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::EnterRaffle { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(
    program_id: &Pubkey,
    raffle_account: &Pubkey,
    check_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep { check_data }.pack();

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    raffle_account: &Pubkey,
    coordinator_program: &Pubkey,
    coordinator_state: &Pubkey,
    perform_data: Vec<u8>,
    coordinator_accounts: &[AccountMeta],
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep { perform_data }.pack();

    let mut accounts = vec![
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(*coordinator_program, false),
        AccountMeta::new(*coordinator_state, false),
    ];
    accounts.extend_from_slice(coordinator_accounts);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction, signed by the coordinator identity
pub fn fulfill_random_words(
    program_id: &Pubkey,
    vrf_identity: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*vrf_identity, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
