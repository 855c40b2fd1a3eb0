// Solraffle - Utility Functions
use solana_program::{account_info::AccountInfo, msg, rent::Rent};

use crate::error::RaffleError;

/// Lamports held above the rent-exempt reserve of an account of `data_len` bytes
pub fn pot_balance(lamports: u64, data_len: usize, rent: &Rent) -> u64 {
    lamports.saturating_sub(rent.minimum_balance(data_len))
}

/// Move `amount` lamports out of a program-owned account
pub fn transfer_lamports(
    from: &AccountInfo,
    to: &AccountInfo,
    amount: u64,
) -> Result<(), RaffleError> {
    if from.key == to.key || !from.is_writable || !to.is_writable {
        msg!("Payout accounts must be distinct and writable");
        return Err(RaffleError::PayoutFailed);
    }

    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(RaffleError::PayoutFailed)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(RaffleError::PayoutFailed)?;

    **from
        .try_borrow_mut_lamports()
        .map_err(|_| RaffleError::PayoutFailed)? = from_balance;
    **to
        .try_borrow_mut_lamports()
        .map_err(|_| RaffleError::PayoutFailed)? = to_balance;
    Ok(())
}
