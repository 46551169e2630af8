#![no_std]

#[cfg(test)]
extern crate std;

pub mod events;
pub mod rewards;
pub mod state;

use soroban_sdk::{contract, contractimpl, contracttype, log, token, Address, Env};

use state::{PoolState, UserAccount};

// ── Contract errors ──────────────────────────────────────────────────────────

#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidConfig = 3,
    InvalidAmount = 4,
    InsufficientBalance = 5,
    NoReward = 6,
    TransferFailed = 7,
    InsufficientRewardFunding = 8,
    ArithmeticError = 9,
}

// ── Public-facing types ──────────────────────────────────────────────────────

/// Snapshot of a user's position returned by `get_staker_info`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakerInfo {
    pub staked: i128,
    pub earned: i128,
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct StakingContract;

#[contractimpl]
impl StakingContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the pool.
    ///
    /// * `stake_token`  – SAC address of the token users stake.
    /// * `reward_token` – SAC address of the token distributed as rewards.
    /// * `reward_rate`  – reward units emitted **per second** across all
    ///   stakers. Fixed for the lifetime of the pool.
    ///
    /// The pool must be funded separately by transferring or minting
    /// `reward_token` to the contract address.
    pub fn initialize(
        env: Env,
        stake_token: Address,
        reward_token: Address,
        reward_rate: i128,
    ) -> Result<(), ContractError> {
        if state::has_pool(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        if reward_rate < 0 || stake_token == reward_token {
            return Err(ContractError::InvalidConfig);
        }

        let pool = PoolState {
            total_staked: 0,
            reward_rate,
            reward_per_unit_stored: 0,
            last_update_time: env.ledger().timestamp(),
        };
        state::set_tokens(&env, &stake_token, &reward_token);
        state::store_pool(&env, &pool);

        events::publish_initialized(&env, stake_token, reward_token, reward_rate);

        Ok(())
    }

    // ── Staking ─────────────────────────────────────────────────────────────

    /// Deposit `amount` stake tokens.
    ///
    /// The staker is settled first so accrual up to now is credited under the
    /// old balance. The balance is only credited once the pull succeeded.
    pub fn stake(env: Env, staker: Address, amount: i128) -> Result<(), ContractError> {
        let mut pool = state::load_pool(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        // 1. Flush global accumulator then snapshot for this user.
        let now = env.ledger().timestamp();
        let mut account = state::load_account(&env, &staker);
        pool.settle(&env, Some(&mut account), now)?;
        state::store_pool(&env, &pool);
        state::store_account(&env, &staker, &account);

        // 2. Pull tokens from the staker into the contract.
        let stake_token = state::stake_token(&env)?;
        Self::transfer(
            &env,
            &stake_token,
            &staker,
            &env.current_contract_address(),
            amount,
            ContractError::TransferFailed,
        )?;

        // 3. Credit the staker and the pool total.
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticError)?;
        pool.total_staked = pool
            .total_staked
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticError)?;
        state::store_pool(&env, &pool);
        state::store_account(&env, &staker, &account);

        log!(&env, "staked", staker, amount, pool.total_staked);
        events::publish_staked(&env, staker, amount, account.balance, pool.total_staked);

        Ok(())
    }

    /// Return `amount` staked tokens to the staker.
    ///
    /// Balances are reduced and persisted before the outbound transfer; a
    /// failed transfer fails the whole call with `TransferFailed`.
    pub fn withdraw(env: Env, staker: Address, amount: i128) -> Result<(), ContractError> {
        let mut pool = state::load_pool(&env)?;
        staker.require_auth();

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let mut account = state::load_account(&env, &staker);
        if amount > account.balance {
            return Err(ContractError::InsufficientBalance);
        }

        let now = env.ledger().timestamp();
        pool.settle(&env, Some(&mut account), now)?;
        Self::withdraw_settled(&env, &mut pool, &mut account, &staker, amount)
    }

    // ── Rewards ─────────────────────────────────────────────────────────────

    /// Claim all accumulated rewards for `staker`, returning the amount paid.
    ///
    /// Fails with `NoReward` when nothing is owed, and with
    /// `InsufficientRewardFunding` when the contract cannot cover the payout.
    /// In both cases the staker's claim is left intact.
    pub fn claim_reward(env: Env, staker: Address) -> Result<i128, ContractError> {
        let mut pool = state::load_pool(&env)?;
        staker.require_auth();

        let now = env.ledger().timestamp();
        let mut account = state::load_account(&env, &staker);
        pool.settle(&env, Some(&mut account), now)?;

        if account.rewards_owed == 0 {
            return Err(ContractError::NoReward);
        }

        state::store_pool(&env, &pool);
        Self::pay_reward(&env, &mut account, &staker)
    }

    /// Withdraw the whole staked balance and claim any pending reward.
    ///
    /// Returns the reward paid, which may be zero. Fails with
    /// `InsufficientBalance` when nothing is staked.
    pub fn exit(env: Env, staker: Address) -> Result<i128, ContractError> {
        let mut pool = state::load_pool(&env)?;
        staker.require_auth();

        let mut account = state::load_account(&env, &staker);
        if account.balance <= 0 {
            return Err(ContractError::InsufficientBalance);
        }

        let now = env.ledger().timestamp();
        pool.settle(&env, Some(&mut account), now)?;
        let amount = account.balance;
        Self::withdraw_settled(&env, &mut pool, &mut account, &staker, amount)?;

        if account.rewards_owed == 0 {
            return Ok(0);
        }
        Self::pay_reward(&env, &mut account, &staker)
    }

    // ── View functions ───────────────────────────────────────────────────────

    /// Real-time claimable reward for `account` without mutating state.
    pub fn earned(env: Env, account: Address) -> Result<i128, ContractError> {
        let pool = state::load_pool(&env)?;
        let user = state::load_account(&env, &account);
        pool.earned(&env, &user, env.ledger().timestamp())
    }

    /// Return the user's current staked balance.
    pub fn balance_of(env: Env, account: Address) -> i128 {
        state::load_account(&env, &account).balance
    }

    /// Return the sum of all currently staked tokens.
    pub fn total_staked(env: Env) -> Result<i128, ContractError> {
        Ok(state::load_pool(&env)?.total_staked)
    }

    /// Return the emission rate (reward units per second).
    pub fn reward_rate(env: Env) -> Result<i128, ContractError> {
        Ok(state::load_pool(&env)?.reward_rate)
    }

    /// Accumulator value as of the current ledger timestamp.
    pub fn reward_per_unit(env: Env) -> Result<i128, ContractError> {
        let pool = state::load_pool(&env)?;
        pool.reward_per_unit(&env, env.ledger().timestamp())
    }

    /// Stored pool record, as of its last settlement.
    pub fn get_pool_state(env: Env) -> Result<PoolState, ContractError> {
        state::load_pool(&env)
    }

    /// Stored account record, as of its last settlement.
    pub fn get_account(env: Env, account: Address) -> UserAccount {
        state::load_account(&env, &account)
    }

    /// Return the staked balance and claimable reward in one call.
    pub fn get_staker_info(env: Env, account: Address) -> Result<StakerInfo, ContractError> {
        let pool = state::load_pool(&env)?;
        let user = state::load_account(&env, &account);
        Ok(StakerInfo {
            staked: user.balance,
            earned: pool.earned(&env, &user, env.ledger().timestamp())?,
        })
    }

    pub fn get_stake_token(env: Env) -> Result<Address, ContractError> {
        state::stake_token(&env)
    }

    pub fn get_reward_token(env: Env) -> Result<Address, ContractError> {
        state::reward_token(&env)
    }

    pub fn is_initialized(env: Env) -> bool {
        state::has_pool(&env)
    }

    /// Contract version
    pub fn version() -> u32 {
        1
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Debit an already-settled account, persist, then send the stake back.
    fn withdraw_settled(
        env: &Env,
        pool: &mut PoolState,
        account: &mut UserAccount,
        staker: &Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or(ContractError::ArithmeticError)?;
        pool.total_staked = pool
            .total_staked
            .checked_sub(amount)
            .ok_or(ContractError::ArithmeticError)?;
        state::store_pool(env, pool);
        state::store_account(env, staker, account);

        let stake_token = state::stake_token(env)?;
        Self::transfer(
            env,
            &stake_token,
            &env.current_contract_address(),
            staker,
            amount,
            ContractError::TransferFailed,
        )?;

        log!(env, "withdrawn", staker.clone(), amount, pool.total_staked);
        events::publish_withdrawn(
            env,
            staker.clone(),
            amount,
            account.balance,
            pool.total_staked,
        );

        Ok(())
    }

    /// Zero a settled account's `rewards_owed`, persist, then pay it out.
    fn pay_reward(
        env: &Env,
        account: &mut UserAccount,
        staker: &Address,
    ) -> Result<i128, ContractError> {
        let reward = account.rewards_owed;
        account.rewards_owed = 0;
        state::store_account(env, staker, account);

        let reward_token = state::reward_token(env)?;
        Self::transfer(
            env,
            &reward_token,
            &env.current_contract_address(),
            staker,
            reward,
            ContractError::InsufficientRewardFunding,
        )?;

        log!(env, "reward paid", staker.clone(), reward);
        events::publish_reward_paid(env, staker.clone(), reward);

        Ok(reward)
    }

    /// Invoke `transfer` on a token, mapping any failure to `err`.
    ///
    /// The error return makes the host discard every write of the current
    /// invocation, so effects persisted before the call are rolled back too.
    fn transfer(
        env: &Env,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: i128,
        err: ContractError,
    ) -> Result<(), ContractError> {
        match token::Client::new(env, token).try_transfer(from, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => {
                log!(env, "transfer rejected", token.clone(), amount);
                Err(err)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod test_props;
