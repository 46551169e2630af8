use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::ContractError;

// ── Storage key constants ───────────────────────────────────────────────────

const POOL: Symbol = symbol_short!("POOL");
const STAKE_TOKEN: Symbol = symbol_short!("STK_TOK");
const REWARD_TOKEN: Symbol = symbol_short!("RWD_TOK");

// Per-user persistent storage uses tuple keys: (ACCOUNT, user_address)
const ACCOUNT: Symbol = symbol_short!("ACCT");

const INSTANCE_TTL_THRESHOLD: u32 = 518_400; // ~30 days
const INSTANCE_TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days
const ACCOUNT_TTL_THRESHOLD: u32 = 5_184_000; // ~60 days
const ACCOUNT_TTL_EXTEND_TO: u32 = 10_368_000; // ~120 days

// ── Types ───────────────────────────────────────────────────────────────────

/// Pool-wide accounting record. There is exactly one per contract instance.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PoolState {
    /// Sum of every `UserAccount::balance`.
    pub total_staked: i128,
    /// Reward units emitted per second across the whole pool.
    pub reward_rate: i128,
    /// Cumulative reward per staked unit, scaled by `rewards::PRECISION`.
    pub reward_per_unit_stored: i128,
    /// Ledger timestamp at which `reward_per_unit_stored` was last advanced.
    pub last_update_time: u64,
}

/// A participant's position. Absent records read as all zeros.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserAccount {
    pub balance: i128,
    /// Accumulator value this account has already been credited up to.
    pub reward_per_unit_paid: i128,
    /// Settled reward that has not been claimed yet.
    pub rewards_owed: i128,
}

// ── Storage helpers ─────────────────────────────────────────────────────────

fn account_key(user: &Address) -> (Symbol, Address) {
    (ACCOUNT, user.clone())
}

pub fn has_pool(env: &Env) -> bool {
    env.storage().instance().has(&POOL)
}

/// Load the pool record, failing with `NotInitialized` before `initialize`.
pub fn load_pool(env: &Env) -> Result<PoolState, ContractError> {
    env.storage()
        .instance()
        .get(&POOL)
        .ok_or(ContractError::NotInitialized)
}

pub fn store_pool(env: &Env, pool: &PoolState) {
    env.storage().instance().set(&POOL, pool);
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND_TO);
}

pub fn load_account(env: &Env, user: &Address) -> UserAccount {
    env.storage()
        .persistent()
        .get(&account_key(user))
        .unwrap_or_default()
}

pub fn store_account(env: &Env, user: &Address, account: &UserAccount) {
    let key = account_key(user);
    env.storage().persistent().set(&key, account);
    env.storage()
        .persistent()
        .extend_ttl(&key, ACCOUNT_TTL_THRESHOLD, ACCOUNT_TTL_EXTEND_TO);
}

pub fn set_tokens(env: &Env, stake_token: &Address, reward_token: &Address) {
    env.storage().instance().set(&STAKE_TOKEN, stake_token);
    env.storage().instance().set(&REWARD_TOKEN, reward_token);
}

pub fn stake_token(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&STAKE_TOKEN)
        .ok_or(ContractError::NotInitialized)
}

pub fn reward_token(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&REWARD_TOKEN)
        .ok_or(ContractError::NotInitialized)
}
