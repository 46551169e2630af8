#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Env};
use staking::{ContractError, StakingContract, StakingContractClient};

const USERS: usize = 4;
const USER_FUNDS: i128 = 1_000_000_000;

#[derive(Arbitrary, Debug)]
enum Action {
    Stake { user: u8, amount: u32 },
    Withdraw { user: u8, amount: u32 },
    Claim { user: u8 },
    Exit { user: u8 },
    Wait { seconds: u16 },
}

#[derive(Arbitrary, Debug)]
struct Input {
    reward_rate: u16,
    actions: Vec<Action>,
}

fn pick(users: &[Address], i: u8) -> &Address {
    &users[i as usize % USERS]
}

fuzz_target!(|input: Input| {
    let env = Env::default();
    env.mock_all_auths();

    let issuer = Address::generate(&env);
    let stake = env.register_stellar_asset_contract_v2(issuer.clone());
    let reward = env.register_stellar_asset_contract_v2(issuer);

    let id = env.register(StakingContract, ());
    let client = StakingContractClient::new(&env, &id);
    client.initialize(&stake.address(), &reward.address(), &i128::from(input.reward_rate));
    token::StellarAssetClient::new(&env, &reward.address()).mint(&id, &i128::from(u64::MAX));

    let stake_admin = token::StellarAssetClient::new(&env, &stake.address());
    let users: Vec<Address> = (0..USERS)
        .map(|_| {
            let user = Address::generate(&env);
            stake_admin.mint(&user, &USER_FUNDS);
            user
        })
        .collect();

    for action in input.actions.iter().take(64) {
        match *action {
            Action::Stake { user, amount } => {
                let res = client.try_stake(pick(&users, user), &i128::from(amount));
                if amount == 0 {
                    assert_eq!(res, Err(Ok(ContractError::InvalidAmount)));
                }
            }
            Action::Withdraw { user, amount } => {
                let before = client.balance_of(pick(&users, user));
                let res = client.try_withdraw(pick(&users, user), &i128::from(amount));
                if amount > 0 && i128::from(amount) > before {
                    assert_eq!(res, Err(Ok(ContractError::InsufficientBalance)));
                }
            }
            Action::Claim { user } => {
                if client.try_claim_reward(pick(&users, user)).is_ok() {
                    assert_eq!(client.earned(pick(&users, user)), 0);
                }
            }
            Action::Exit { user } => {
                if client.try_exit(pick(&users, user)).is_ok() {
                    assert_eq!(client.balance_of(pick(&users, user)), 0);
                }
            }
            Action::Wait { seconds } => {
                let now = env.ledger().timestamp();
                env.ledger().set_timestamp(now + u64::from(seconds));
            }
        }

        let sum: i128 = users.iter().map(|u| client.balance_of(u)).sum();
        assert_eq!(client.total_staked(), sum, "total_staked drifted from balances");
    }
});
