// Solraffle - Processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    native_token::lamports_to_sol,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    instruction::RaffleInstruction,
    state::{Raffle, RaffleConfig},
    utils, vrf,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                subscription_id,
                key_hash,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entrance_fee,
                    interval,
                    subscription_id,
                    key_hash,
                    callback_gas_limit,
                    program_id,
                )
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, perform_data, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, random_words, program_id)
            }
        }
    }

    /// Create the raffle account and open its first round.
    ///
    /// The coordinator and every fee parameter are fixed here for the
    /// lifetime of the raffle.
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: u64,
        subscription_id: u64,
        key_hash: [u8; 32],
        callback_gas_limit: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer || !raffle_info.is_signer {
            msg!("Payer and raffle account must sign");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if !coordinator_info.executable {
            msg!("Coordinator {} is not a program", coordinator_info.key);
            return Err(RaffleError::InvalidCoordinator.into());
        }

        let rent = Rent::get()?;
        invoke(
            &system_instruction::create_account(
                payer_info.key,
                raffle_info.key,
                rent.minimum_balance(Raffle::LEN),
                Raffle::LEN as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(
            RaffleConfig {
                entrance_fee,
                interval,
                vrf_coordinator: *coordinator_info.key,
                subscription_id,
                key_hash,
                callback_gas_limit,
            },
            now,
        );
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle {} opened: fee {} SOL, interval {}s, coordinator {}",
            raffle_info.key,
            lamports_to_sol(entrance_fee),
            interval,
            coordinator_info.key
        );
        Ok(())
    }

    fn process_enter_raffle(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the entry");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        raffle.enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let players = raffle.number_of_players();
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!("{} entered with {} lamports, {} players", player_info.key, amount, players);
        RaffleEvent::Entered {
            player: *player_info.key,
        }
        .emit();
        Ok(())
    }

    fn process_check_upkeep(
        accounts: &[AccountInfo],
        check_data: Vec<u8>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let check = raffle.check_upkeep(Clock::get()?.unix_timestamp, Self::pot(raffle_info)?);

        let data = (check.upkeep_needed, check_data)
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&data);

        msg!("Upkeep needed: {}", check.upkeep_needed);
        Ok(())
    }

    /// Close the round and hand it to the coordinator.
    ///
    /// Eligibility is re-checked here: anyone may call this, not only the
    /// automation network.
    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        perform_data: Vec<u8>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;
        let remaining_accounts: Vec<AccountInfo> = account_info_iter.cloned().collect();

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let check = raffle.check_upkeep(Clock::get()?.unix_timestamp, Self::pot(raffle_info)?);
        if !check.upkeep_needed {
            msg!(
                "Upkeep not needed: balance {} players {} state {:?} elapsed {}s",
                check.pot,
                check.players,
                check.state,
                check.elapsed
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        if !perform_data.is_empty() {
            msg!("Ignoring {} bytes of perform data", perform_data.len());
        }

        let request_id = vrf::request_random_words(
            raffle.config(),
            coordinator_program_info,
            coordinator_state_info,
            raffle_info,
            &remaining_accounts,
        )?;
        raffle.start_calculating(request_id)?;
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RandomnessRequested { request_id }.emit();
        Ok(())
    }

    /// Settle the pending round: pay the whole pot to the drawn participant
    /// and open the next round.
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: Vec<u64>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        vrf::verify_callback_authority(authority_info, raffle.vrf_coordinator())?;

        let winner = raffle.draw_winner(request_id, &random_words)?;
        if winner != *winner_info.key {
            msg!("Drawn participant {} but got account {}", winner, winner_info.key);
            return Err(RaffleError::WinnerAccountMismatch.into());
        }

        let prize = Self::pot(raffle_info)?;
        raffle.reset_round(winner, Clock::get()?.unix_timestamp);
        utils::transfer_lamports(raffle_info, winner_info, prize)?;
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!("Winner {} paid {} SOL", winner, lamports_to_sol(prize));
        RaffleEvent::WinnerPicked { winner }.emit();
        Ok(())
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account not owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Raffle::unpack(&raffle_info.data.borrow())
    }

    fn pot(raffle_info: &AccountInfo) -> Result<u64, ProgramError> {
        Ok(utils::pot_balance(
            raffle_info.lamports(),
            raffle_info.data_len(),
            &Rent::get()?,
        ))
    }
}
