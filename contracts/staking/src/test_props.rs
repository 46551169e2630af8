#![cfg(test)]

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Env};
use std::vec::Vec;

use crate::*;

const USERS: usize = 3;
const USER_FUNDS: i128 = 1_000_000;

#[derive(Clone, Debug)]
enum Op {
    Stake { user: usize, amount: i128 },
    Withdraw { user: usize, amount: i128 },
    Claim { user: usize },
    Exit { user: usize },
    Wait { seconds: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..USERS, -10i128..2_000).prop_map(|(user, amount)| Op::Stake { user, amount }),
        2 => (0..USERS, -10i128..2_000).prop_map(|(user, amount)| Op::Withdraw { user, amount }),
        1 => (0..USERS).prop_map(|user| Op::Claim { user }),
        1 => (0..USERS).prop_map(|user| Op::Exit { user }),
        3 => (0u64..120).prop_map(|seconds| Op::Wait { seconds }),
    ]
}

struct Harness<'a> {
    env: Env,
    client: StakingContractClient<'a>,
    stake_token: token::Client<'a>,
    users: Vec<Address>,
}

fn harness<'a>(reward_rate: i128) -> Harness<'a> {
    let env = Env::default();
    env.mock_all_auths();

    let issuer = Address::generate(&env);
    let stake = env.register_stellar_asset_contract_v2(issuer.clone());
    let reward = env.register_stellar_asset_contract_v2(issuer);

    let id = env.register(StakingContract, ());
    let client = StakingContractClient::new(&env, &id);
    client.initialize(&stake.address(), &reward.address(), &reward_rate);
    token::StellarAssetClient::new(&env, &reward.address()).mint(&id, &i128::from(u64::MAX));

    let stake_admin = token::StellarAssetClient::new(&env, &stake.address());
    let users: Vec<Address> = (0..USERS)
        .map(|_| {
            let user = Address::generate(&env);
            stake_admin.mint(&user, &USER_FUNDS);
            user
        })
        .collect();

    Harness {
        client,
        stake_token: token::Client::new(&env, &stake.address()),
        users,
        env,
    }
}

impl Harness<'_> {
    /// Run `op` and check it succeeded or failed with the expected kind.
    fn apply(&self, op: &Op) -> Result<(), TestCaseError> {
        match *op {
            Op::Stake { user, amount } => {
                let user = &self.users[user];
                let wallet = self.stake_token.balance(user);
                let result = self.client.try_stake(user, &amount);
                if amount <= 0 {
                    prop_assert_eq!(result, Err(Ok(ContractError::InvalidAmount)));
                } else if amount > wallet {
                    prop_assert_eq!(result, Err(Ok(ContractError::TransferFailed)));
                } else {
                    prop_assert_eq!(result, Ok(Ok(())));
                }
            }
            Op::Withdraw { user, amount } => {
                let user = &self.users[user];
                let staked = self.client.balance_of(user);
                let result = self.client.try_withdraw(user, &amount);
                if amount <= 0 {
                    prop_assert_eq!(result, Err(Ok(ContractError::InvalidAmount)));
                } else if amount > staked {
                    prop_assert_eq!(result, Err(Ok(ContractError::InsufficientBalance)));
                } else {
                    prop_assert_eq!(result, Ok(Ok(())));
                    prop_assert_eq!(self.client.balance_of(user), staked - amount);
                }
            }
            Op::Claim { user } => {
                let user = &self.users[user];
                let pending = self.client.earned(user);
                let result = self.client.try_claim_reward(user);
                if pending == 0 {
                    prop_assert_eq!(result, Err(Ok(ContractError::NoReward)));
                } else {
                    prop_assert_eq!(result, Ok(Ok(pending)));
                }
            }
            Op::Exit { user } => {
                let user = &self.users[user];
                let staked = self.client.balance_of(user);
                let pending = self.client.earned(user);
                let result = self.client.try_exit(user);
                if staked == 0 {
                    prop_assert_eq!(result, Err(Ok(ContractError::InsufficientBalance)));
                    prop_assert_eq!(self.client.earned(user), pending);
                } else {
                    prop_assert_eq!(result, Ok(Ok(pending)));
                }
                prop_assert_eq!(self.client.balance_of(user), 0);
            }
            Op::Wait { seconds } => {
                let now = self.env.ledger().timestamp();
                self.env.ledger().set_timestamp(now + seconds);
            }
        }
        Ok(())
    }

    fn balances_sum(&self) -> i128 {
        self.users.iter().map(|u| self.client.balance_of(u)).sum()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn total_staked_equals_sum_of_balances(
        rate in 0i128..1_000,
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let h = harness(rate);
        for op in &ops {
            h.apply(op)?;
            prop_assert_eq!(h.client.total_staked(), h.balances_sum());
        }
    }

    #[test]
    fn earned_never_decreases_without_claim(
        rate in 1i128..1_000,
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let h = harness(rate);
        let mut last: Vec<i128> = h.users.iter().map(|u| h.client.earned(u)).collect();
        for op in &ops {
            h.apply(op)?;
            for (i, user) in h.users.iter().enumerate() {
                let now = h.client.earned(user);
                let claimed = match op {
                    Op::Claim { user } | Op::Exit { user } => *user == i,
                    _ => false,
                };
                if !claimed {
                    prop_assert!(now >= last[i], "earned decreased for user {}", i);
                }
                last[i] = now;
            }
        }
    }

    #[test]
    fn successful_claim_leaves_nothing_pending(
        rate in 1i128..1_000,
        stake in 1i128..10_000,
        wait in 1u64..10_000,
    ) {
        let h = harness(rate);
        let user = &h.users[0];
        h.client.stake(user, &stake);
        h.env.ledger().set_timestamp(wait);
        let pending = h.client.earned(user);
        if pending > 0 {
            prop_assert_eq!(h.client.claim_reward(user), pending);
        }
        prop_assert_eq!(h.client.earned(user), 0);
    }
}
