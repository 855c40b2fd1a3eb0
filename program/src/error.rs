// Solraffle - Errors
use num_traits::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Payment was below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment,

    /// The raffle is calculating a winner and does not accept the action
    #[error("Raffle is not open")]
    RaffleNotOpen,

    /// performUpkeep was called while the round is not eligible for a draw
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for a request id that is not the pending one
    #[error("Unknown randomness request")]
    UnknownRequest,

    /// The pot could not be moved to the winner
    #[error("Payout to winner failed")]
    PayoutFailed,

    /// No participant at the requested index
    #[error("Participant index out of range")]
    IndexOutOfRange,

    /// Every participant slot of the round is taken
    #[error("Raffle is full")]
    RaffleFull,

    /// Coordinator account does not match the configured oracle program
    #[error("Invalid VRF coordinator")]
    InvalidCoordinator,

    /// Fulfillment was not signed by the coordinator identity
    #[error("Invalid callback authority")]
    InvalidCallbackAuthority,

    /// Coordinator returned no usable request id
    #[error("Coordinator did not return a request id")]
    MissingRequestId,

    /// Fulfillment carried no random words
    #[error("No random words delivered")]
    MissingRandomWords,

    /// Winner account passed with the callback is not the drawn participant
    #[error("Winner account does not match the drawn participant")]
    WinnerAccountMismatch,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl FromPrimitive for RaffleError {
    fn from_i64(n: i64) -> Option<Self> {
        u64::try_from(n).ok().and_then(Self::from_u64)
    }

    fn from_u64(n: u64) -> Option<Self> {
        use RaffleError::*;
        Some(match n {
            0 => InsufficientPayment,
            1 => RaffleNotOpen,
            2 => UpkeepNotNeeded,
            3 => UnknownRequest,
            4 => PayoutFailed,
            5 => IndexOutOfRange,
            6 => RaffleFull,
            7 => InvalidCoordinator,
            8 => InvalidCallbackAuthority,
            9 => MissingRequestId,
            10 => MissingRandomWords,
            11 => WinnerAccountMismatch,
            _ => return None,
        })
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
