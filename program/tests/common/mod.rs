#![allow(dead_code)]

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};
use solana_program_test::*;
use solana_sdk::{
    account::Account,
    instruction::InstructionError,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::clock::Clock,
    transaction::{Transaction, TransactionError},
};
use solraffle::{
    error::RaffleError,
    events::RaffleEvent,
    instruction,
    process_instruction,
    state::{Raffle, RaffleConfig},
    utils,
    vrf::{find_vrf_identity, CoordinatorInstruction, VRF_IDENTITY_SEED},
};

pub const ENTRANCE_FEE: u64 = 10_000_000; // 0.01 SOL
pub const INTERVAL: u64 = 30;
pub const SUBSCRIPTION_ID: u64 = 1;
pub const KEY_HASH: [u8; 32] = [0x47; 32];
pub const CALLBACK_GAS_LIMIT: u32 = 500_000;

// Mock coordinator: borsh `CoordinatorInstruction` requests, or this tag
// followed by `MockFulfill` to deliver words through the identity PDA.
const MOCK_FULFILL_TAG: u8 = 0xff;

#[derive(BorshSerialize, BorshDeserialize)]
struct MockFulfill {
    request_id: u64,
    random_words: Vec<u64>,
}

/// Stand-in VRF coordinator, counting request ids from 1
pub fn process_mock_coordinator(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    match instruction_data.split_first() {
        Some((&MOCK_FULFILL_TAG, rest)) => {
            let args = MockFulfill::try_from_slice(rest)
                .map_err(|_| ProgramError::InvalidInstructionData)?;
            mock_fulfill(program_id, accounts, args)
        }
        _ => match CoordinatorInstruction::try_from_slice(instruction_data)
            .map_err(|_| ProgramError::InvalidInstructionData)?
        {
            CoordinatorInstruction::RequestRandomWords { num_words, .. } => {
                mock_request(accounts, num_words)
            }
        },
    }
}

fn mock_request(accounts: &[AccountInfo], num_words: u32) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let state_info = next_account_info(account_info_iter)?;
    let consumer_info = next_account_info(account_info_iter)?;

    let mut data = state_info.try_borrow_mut_data()?;
    let mut counter = [0u8; 8];
    counter.copy_from_slice(&data[..8]);
    let request_id = u64::from_le_bytes(counter) + 1;
    data[..8].copy_from_slice(&request_id.to_le_bytes());

    msg!("Mock request {} for {} words from {}", request_id, num_words, consumer_info.key);
    set_return_data(&request_id.to_le_bytes());
    Ok(())
}

fn mock_fulfill(program_id: &Pubkey, accounts: &[AccountInfo], args: MockFulfill) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();
    let identity_info = next_account_info(account_info_iter)?;
    let raffle_program_info = next_account_info(account_info_iter)?;
    let raffle_info = next_account_info(account_info_iter)?;
    let winner_info = next_account_info(account_info_iter)?;

    let (identity, bump) = find_vrf_identity(program_id);
    let mut ix = instruction::fulfill_random_words(
        raffle_program_info.key,
        &identity,
        raffle_info.key,
        winner_info.key,
        args.request_id,
        args.random_words,
    )?;
    // forward the winner with the privileges the caller gave it
    ix.accounts[2].is_writable = winner_info.is_writable;
    invoke_signed(
        &ix,
        &[
            identity_info.clone(),
            raffle_info.clone(),
            winner_info.clone(),
            raffle_program_info.clone(),
        ],
        &[&[VRF_IDENTITY_SEED, &[bump]]],
    )
}

pub struct RaffleTest {
    pub context: ProgramTestContext,
    pub program_id: Pubkey,
    pub coordinator_id: Pubkey,
    pub coordinator_state: Pubkey,
    pub raffle: Keypair,
}

impl RaffleTest {
    /// Start a bank with the raffle and mock coordinator, and open a raffle
    pub async fn start() -> Self {
        let program_id = Pubkey::new_unique();
        let coordinator_id = Pubkey::new_unique();
        let coordinator_state = Pubkey::new_unique();

        let mut program_test =
            ProgramTest::new("solraffle", program_id, processor!(process_instruction));
        program_test.add_program(
            "vrf_coordinator_mock",
            coordinator_id,
            processor!(process_mock_coordinator),
        );
        program_test.add_account(
            coordinator_state,
            Account {
                lamports: 1_000_000_000,
                data: vec![0u8; 8],
                owner: coordinator_id,
                executable: false,
                rent_epoch: 0,
            },
        );

        let mut test = RaffleTest {
            context: program_test.start_with_context().await,
            program_id,
            coordinator_id,
            coordinator_state,
            raffle: Keypair::new(),
        };

        let ix = instruction::initialize_raffle(
            &test.program_id,
            &test.context.payer.pubkey(),
            &test.raffle.pubkey(),
            &test.config(),
        )
        .unwrap();
        let raffle = Keypair::from_bytes(&test.raffle.to_bytes()).unwrap();
        test.process(&[ix], &[&raffle]).await.unwrap();
        test
    }

    pub fn config(&self) -> RaffleConfig {
        RaffleConfig {
            entrance_fee: ENTRANCE_FEE,
            interval: INTERVAL,
            vrf_coordinator: self.coordinator_id,
            subscription_id: SUBSCRIPTION_ID,
            key_hash: KEY_HASH,
            callback_gas_limit: CALLBACK_GAS_LIMIT,
        }
    }

    /// Sign with the context payer plus `signers`, on a fresh blockhash
    pub async fn transaction(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Transaction {
        let blockhash = self
            .context
            .banks_client
            .get_new_latest_blockhash(&self.context.last_blockhash)
            .await
            .unwrap();
        self.context.last_blockhash = blockhash;
        let mut all_signers = vec![&self.context.payer];
        all_signers.extend_from_slice(signers);
        Transaction::new_signed_with_payer(
            instructions,
            Some(&self.context.payer.pubkey()),
            &all_signers,
            blockhash,
        )
    }

    pub async fn process(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<(), BanksClientError> {
        let transaction = self.transaction(instructions, signers).await;
        self.context.banks_client.process_transaction(transaction).await
    }

    /// Process and return the events the raffle program logged
    pub async fn process_for_events(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Vec<RaffleEvent> {
        let transaction = self.transaction(instructions, signers).await;
        let outcome = self
            .context
            .banks_client
            .process_transaction_with_metadata(transaction)
            .await
            .unwrap();
        outcome.result.unwrap();
        raffle_events(&outcome.metadata.unwrap().log_messages)
    }

    /// Simulate a `CheckUpkeep` and decode its `(upkeep_needed, check_data)` return data
    pub async fn simulate_check_upkeep(&mut self, check_data: Vec<u8>) -> (bool, Vec<u8>) {
        let ix = instruction::check_upkeep(&self.program_id, &self.raffle.pubkey(), check_data).unwrap();
        let transaction = self.transaction(&[ix], &[]).await;
        let simulation = self
            .context
            .banks_client
            .simulate_transaction(transaction)
            .await
            .unwrap();
        assert!(matches!(simulation.result, Some(Ok(()))));

        let return_data = simulation
            .simulation_details
            .and_then(|details| details.return_data)
            .unwrap();
        assert_eq!(return_data.program_id, self.program_id);
        <(bool, Vec<u8>)>::try_from_slice(&return_data.data).unwrap()
    }

    /// New system account holding `lamports`
    pub async fn funded_player(&mut self, lamports: u64) -> Keypair {
        let player = Keypair::new();
        let ix = system_instruction::transfer(&self.context.payer.pubkey(), &player.pubkey(), lamports);
        self.process(&[ix], &[]).await.unwrap();
        player
    }

    pub async fn enter(&mut self, player: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = instruction::enter_raffle(&self.program_id, &player.pubkey(), &self.raffle.pubkey(), amount)
            .unwrap();
        self.process(&[ix], &[player]).await
    }

    pub async fn check_upkeep(&mut self) -> Result<(), BanksClientError> {
        let ix = instruction::check_upkeep(&self.program_id, &self.raffle.pubkey(), vec![]).unwrap();
        self.process(&[ix], &[]).await
    }

    pub async fn perform_upkeep(&mut self) -> Result<(), BanksClientError> {
        let ix = instruction::perform_upkeep(
            &self.program_id,
            &self.raffle.pubkey(),
            &self.coordinator_id,
            &self.coordinator_state,
            vec![],
            &[],
        )
        .unwrap();
        self.process(&[ix], &[]).await
    }

    /// Deliver `random_words` through the mock coordinator
    pub async fn fulfill(
        &mut self,
        request_id: u64,
        random_words: Vec<u64>,
        winner: &Pubkey,
    ) -> Result<(), BanksClientError> {
        let ix = self.fulfill_instruction(request_id, random_words, AccountMeta::new(*winner, false));
        self.process(&[ix], &[]).await
    }

    /// Mock coordinator instruction delivering `random_words`, paying `winner`
    pub fn fulfill_instruction(
        &self,
        request_id: u64,
        random_words: Vec<u64>,
        winner: AccountMeta,
    ) -> Instruction {
        let (identity, _) = find_vrf_identity(&self.coordinator_id);
        let mut data = vec![MOCK_FULFILL_TAG];
        data.extend(
            MockFulfill {
                request_id,
                random_words,
            }
            .try_to_vec()
            .unwrap(),
        );
        Instruction {
            program_id: self.coordinator_id,
            accounts: vec![
                AccountMeta::new_readonly(identity, false),
                AccountMeta::new_readonly(self.program_id, false),
                AccountMeta::new(self.raffle.pubkey(), false),
                winner,
            ],
            data,
        }
    }

    pub async fn raffle_state(&mut self) -> Raffle {
        let account = self
            .context
            .banks_client
            .get_account(self.raffle.pubkey())
            .await
            .unwrap()
            .unwrap();
        Raffle::unpack(&account.data).unwrap()
    }

    pub async fn pot(&mut self) -> u64 {
        let rent = self.context.banks_client.get_rent().await.unwrap();
        let raffle = self.raffle.pubkey();
        let lamports = self.balance(&raffle).await;
        utils::pot_balance(lamports, Raffle::LEN, &rent)
    }

    pub async fn balance(&mut self, address: &Pubkey) -> u64 {
        self.context.banks_client.get_balance(*address).await.unwrap()
    }

    pub async fn clock(&mut self) -> Clock {
        self.context.banks_client.get_sysvar::<Clock>().await.unwrap()
    }

    /// Move the bank clock forward by `seconds`
    pub async fn advance_clock(&mut self, seconds: i64) {
        let mut clock = self.clock().await;
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }
}

/// Decode `RaffleEvent`s from `Program data:` log lines
pub fn raffle_events(logs: &[String]) -> Vec<RaffleEvent> {
    logs.iter()
        .filter_map(|line| line.strip_prefix("Program data: "))
        .filter_map(|data| base64::decode(data).ok())
        .filter_map(|bytes| RaffleEvent::try_from_slice(&bytes).ok())
        .collect()
}

pub fn assert_raffle_error(result: Result<(), BanksClientError>, expected: RaffleError) {
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, InstructionError::Custom(expected as u32))
    );
}
