use soroban_sdk::{Env, I256};

use crate::state::{PoolState, UserAccount};
use crate::ContractError;

/// Fixed-point scaling factor.
///
/// All reward-per-unit values are multiplied by this constant before storage
/// to preserve sub-unit precision without floating-point arithmetic.
/// 10^18 keeps the truncation loss of a single settlement below one reward
/// unit for any stake up to 10^18 units.
pub const PRECISION: i128 = 1_000_000_000_000_000_000;

// ── Core reward engine ──────────────────────────────────────────────────────

/// Compute `a × b / denominator` in 256-bit precision.
///
/// Fails with `ArithmeticError` when the quotient does not fit back into
/// an `i128`.
fn mul_div(env: &Env, a: i128, b: i128, denominator: i128) -> Result<i128, ContractError> {
    I256::from_i128(env, a)
        .mul(&I256::from_i128(env, b))
        .div(&I256::from_i128(env, denominator))
        .to_i128()
        .ok_or(ContractError::ArithmeticError)
}

/// Advance a `reward_per_unit_stored` value by `elapsed` seconds.
///
/// This is the fundamental O(1) accumulation step:
///
/// ```text
/// Δrpu = reward_rate × elapsed_seconds × PRECISION / total_staked
/// new_rpu = stored_rpu + Δrpu
/// ```
///
/// When `total_staked` is zero we return `stored` unchanged: no stakers
/// means no distribution, which also rules out a division by zero.
///
/// # Arguments
/// * `stored`       – current `reward_per_unit_stored` (scaled by PRECISION)
/// * `reward_rate`  – reward units emitted per second across *all* stakers
/// * `elapsed`      – seconds since the last update
/// * `total_staked` – sum of all active stakes
pub fn compute_reward_per_unit(
    env: &Env,
    stored: i128,
    reward_rate: i128,
    elapsed: u64,
    total_staked: i128,
) -> Result<i128, ContractError> {
    if total_staked <= 0 || elapsed == 0 || reward_rate == 0 {
        return Ok(stored);
    }

    // u64 always fits in i128, and rate × elapsed × PRECISION fits in I256.
    let delta = I256::from_i128(env, reward_rate)
        .mul(&I256::from_i128(env, elapsed as i128))
        .mul(&I256::from_i128(env, PRECISION))
        .div(&I256::from_i128(env, total_staked))
        .to_i128()
        .ok_or(ContractError::ArithmeticError)?;

    stored
        .checked_add(delta)
        .ok_or(ContractError::ArithmeticError)
}

/// Calculate the total rewards earned by a single staker.
///
/// ```text
/// earned = balance × (current_rpu − rpu_paid) / PRECISION + rewards_owed
/// ```
///
/// The subtraction isolates only the accumulation that happened *since the
/// user's last snapshot*, so prior settlements are never double-counted.
///
/// # Arguments
/// * `balance`      – user's current staked balance
/// * `current_rpu`  – accumulator value as of now
/// * `rpu_paid`     – the snapshot taken at the user's last settlement
/// * `rewards_owed` – already-settled rewards not yet claimed
pub fn earned(
    env: &Env,
    balance: i128,
    current_rpu: i128,
    rpu_paid: i128,
    rewards_owed: i128,
) -> Result<i128, ContractError> {
    // The accumulator never decreases, so a snapshot ahead of it is corrupt.
    let delta = current_rpu
        .checked_sub(rpu_paid)
        .filter(|d| *d >= 0)
        .ok_or(ContractError::ArithmeticError)?;
    if balance == 0 || delta == 0 {
        return Ok(rewards_owed);
    }

    let accrued = mul_div(env, balance, delta, PRECISION)?;
    rewards_owed
        .checked_add(accrued)
        .ok_or(ContractError::ArithmeticError)
}

// ── Accumulator operations on the pool record ───────────────────────────────

impl PoolState {
    /// Accumulator value as of `now`, without mutating anything.
    pub fn reward_per_unit(&self, env: &Env, now: u64) -> Result<i128, ContractError> {
        compute_reward_per_unit(
            env,
            self.reward_per_unit_stored,
            self.reward_rate,
            now.saturating_sub(self.last_update_time),
            self.total_staked,
        )
    }

    /// Reward claimable by `account` as of `now`, without mutating anything.
    pub fn earned(
        &self,
        env: &Env,
        account: &UserAccount,
        now: u64,
    ) -> Result<i128, ContractError> {
        earned(
            env,
            account.balance,
            self.reward_per_unit(env, now)?,
            account.reward_per_unit_paid,
            account.rewards_owed,
        )
    }

    /// Advance the accumulator to `now` and, when an account is given, move
    /// everything it accrued under its current balance into `rewards_owed`.
    ///
    /// Must run before any change to `total_staked` or an account balance.
    pub fn settle(
        &mut self,
        env: &Env,
        account: Option<&mut UserAccount>,
        now: u64,
    ) -> Result<(), ContractError> {
        let current = self.reward_per_unit(env, now)?;
        self.reward_per_unit_stored = current;
        self.last_update_time = now;

        if let Some(account) = account {
            account.rewards_owed = earned(
                env,
                account.balance,
                current,
                account.reward_per_unit_paid,
                account.rewards_owed,
            )?;
            account.reward_per_unit_paid = current;
        }

        Ok(())
    }
}

// ── Unit tests ──────────────────────────────────────────────────────────────
// Pure-math tests; the Env only backs the 256-bit intermediates.
