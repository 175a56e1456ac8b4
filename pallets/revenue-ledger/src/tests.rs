//! Unit tests for pallet-revenue-ledger.

use crate::{self as pallet_revenue_ledger, pallet::*};
use frame_support::{
    assert_noop, assert_ok, parameter_types,
    traits::{
        fungibles,
        tokens::{DepositConsequence, Fortitude, Preservation, Provenance, WithdrawConsequence},
    },
    PalletId,
};
use pallet_agent_registry::{AgentId, AgentManager, IdentityIssuer};
use sp_core::H256;
use sp_runtime::{
    traits::{BlakeTwo256, IdentityLookup},
    BuildStorage, DispatchError, DispatchResult,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

type Block = frame_system::mocking::MockBlock<Test>;

frame_support::construct_runtime!(
    pub enum Test
    {
        System: frame_system,
        RevenueLedger: pallet_revenue_ledger,
    }
);

parameter_types! {
    pub const BlockHashCount: u64 = 250;
}

impl frame_system::Config for Test {
    type BaseCallFilter = frame_support::traits::Everything;
    type BlockWeights = ();
    type BlockLength = ();
    type RuntimeOrigin = RuntimeOrigin;
    type RuntimeCall = RuntimeCall;
    type Nonce = u64;
    type Hash = H256;
    type Hashing = BlakeTwo256;
    type AccountId = u64;
    type Lookup = IdentityLookup<Self::AccountId>;
    type Block = Block;
    type RuntimeEvent = RuntimeEvent;
    type BlockHashCount = BlockHashCount;
    type DbWeight = ();
    type Version = ();
    type PalletInfo = PalletInfo;
    type AccountData = ();
    type OnNewAccount = ();
    type OnKilledAccount = ();
    type SystemWeightInfo = ();
    type SS58Prefix = ();
    type OnSetCode = ();
    type MaxConsumers = frame_support::traits::ConstU32<16>;
    type SingleBlockMigrations = ();
    type MultiBlockMigrator = ();
    type PreInherents = ();
    type PostInherents = ();
    type PostTransactions = ();
    type RuntimeTask = ();
    type ExtensionsWeightInfo = ();
}

// =========================================================
// Mock collaborators
// =========================================================

thread_local! {
    static ASSET_BALANCES: RefCell<BTreeMap<(u32, u64), u64>> = RefCell::new(BTreeMap::new());
    static ASSET_ISSUANCE: RefCell<BTreeMap<u32, u64>> = RefCell::new(BTreeMap::new());
    // agent -> (active, operating wallet)
    static AGENTS: RefCell<BTreeMap<AgentId, (bool, u64)>> = RefCell::new(BTreeMap::new());
    static IDENTITY_OWNERS: RefCell<BTreeMap<AgentId, u64>> = RefCell::new(BTreeMap::new());
    static REGISTRY_PAUSED: Cell<bool> = const { Cell::new(false) };
    static REENTER_ON_TRANSFER: RefCell<Option<ReenterWith>> = const { RefCell::new(None) };
    static REENTERED: RefCell<Option<DispatchResult>> = const { RefCell::new(None) };
}

/// Which ledger call a hostile asset implementation re-enters with while a
/// transfer is in flight.
#[derive(Clone, Copy)]
enum ReenterWith {
    Deposit,
    Distribute,
    Withdraw,
}

fn reentered() -> Option<DispatchResult> {
    REENTERED.with(|r| r.borrow().clone())
}

fn mint_asset(asset: u32, who: u64, amount: u64) {
    ASSET_BALANCES.with(|b| {
        *b.borrow_mut().entry((asset, who)).or_insert(0) += amount;
    });
    ASSET_ISSUANCE.with(|i| {
        *i.borrow_mut().entry(asset).or_insert(0) += amount;
    });
}

fn add_agent(agent_id: AgentId, owner: u64, wallet: u64) {
    AGENTS.with(|a| {
        a.borrow_mut().insert(agent_id, (true, wallet));
    });
    IDENTITY_OWNERS.with(|o| {
        o.borrow_mut().insert(agent_id, owner);
    });
}

fn set_agent_active(agent_id: AgentId, active: bool) {
    AGENTS.with(|a| {
        if let Some(agent) = a.borrow_mut().get_mut(&agent_id) {
            agent.0 = active;
        }
    });
}

fn set_agent_wallet(agent_id: AgentId, wallet: u64) {
    AGENTS.with(|a| {
        if let Some(agent) = a.borrow_mut().get_mut(&agent_id) {
            agent.1 = wallet;
        }
    });
}

pub struct MockAssets;

impl MockAssets {
    fn get(asset: u32, who: u64) -> u64 {
        ASSET_BALANCES.with(|b| b.borrow().get(&(asset, who)).copied().unwrap_or(0))
    }
}

impl fungibles::Inspect<u64> for MockAssets {
    type AssetId = u32;
    type Balance = u64;

    fn total_issuance(asset: u32) -> u64 {
        ASSET_ISSUANCE.with(|i| i.borrow().get(&asset).copied().unwrap_or(0))
    }
    fn minimum_balance(_asset: u32) -> u64 {
        0
    }
    fn total_balance(asset: u32, who: &u64) -> u64 {
        Self::get(asset, *who)
    }
    fn balance(asset: u32, who: &u64) -> u64 {
        Self::get(asset, *who)
    }
    fn reducible_balance(
        asset: u32,
        who: &u64,
        _preservation: Preservation,
        _force: Fortitude,
    ) -> u64 {
        Self::get(asset, *who)
    }
    fn can_deposit(
        _asset: u32,
        _who: &u64,
        _amount: u64,
        _provenance: Provenance,
    ) -> DepositConsequence {
        DepositConsequence::Success
    }
    fn can_withdraw(asset: u32, who: &u64, amount: u64) -> WithdrawConsequence<u64> {
        if Self::get(asset, *who) >= amount {
            WithdrawConsequence::Success
        } else {
            WithdrawConsequence::BalanceLow
        }
    }
    fn asset_exists(asset: u32) -> bool {
        ASSET_ISSUANCE.with(|i| i.borrow().contains_key(&asset))
    }
}

impl fungibles::Unbalanced<u64> for MockAssets {
    fn handle_dust(_dust: fungibles::Dust<u64, Self>) {}
    fn write_balance(asset: u32, who: &u64, amount: u64) -> Result<Option<u64>, DispatchError> {
        if let Some(call) = REENTER_ON_TRANSFER.with(|f| f.borrow_mut().take()) {
            let result = match call {
                ReenterWith::Deposit => {
                    RevenueLedger::deposit(RuntimeOrigin::signed(PAYER), AGENT, USDX, 1)
                }
                ReenterWith::Distribute => {
                    RevenueLedger::distribute(RuntimeOrigin::signed(ANYONE), AGENT, USDX)
                }
                ReenterWith::Withdraw => RevenueLedger::withdraw_buyback(
                    RuntimeOrigin::signed(OWNER),
                    AGENT,
                    USDX,
                    DEST,
                ),
            };
            REENTERED.with(|r| *r.borrow_mut() = Some(result));
        }
        ASSET_BALANCES.with(|b| {
            b.borrow_mut().insert((asset, *who), amount);
        });
        Ok(None)
    }
    fn set_total_issuance(asset: u32, amount: u64) {
        ASSET_ISSUANCE.with(|i| {
            i.borrow_mut().insert(asset, amount);
        });
    }
}

impl fungibles::Mutate<u64> for MockAssets {}

pub struct MockAgents;

impl AgentManager<u64> for MockAgents {
    fn exists(agent_id: AgentId) -> bool {
        AGENTS.with(|a| a.borrow().contains_key(&agent_id))
    }
    fn is_active(agent_id: AgentId) -> bool {
        AGENTS.with(|a| a.borrow().get(&agent_id).is_some_and(|agent| agent.0))
    }
    fn operating_wallet(agent_id: AgentId) -> Option<u64> {
        AGENTS.with(|a| a.borrow().get(&agent_id).map(|agent| agent.1))
    }
    fn endpoint(agent_id: AgentId) -> Option<Vec<u8>> {
        Self::exists(agent_id).then(|| b"https://agent.example/api".to_vec())
    }
    fn paused() -> bool {
        REGISTRY_PAUSED.with(|p| p.get())
    }
}

pub struct MockIssuer;

impl IdentityIssuer<u64> for MockIssuer {
    fn mint(_to: &u64, _metadata_uri: &[u8]) -> Result<AgentId, DispatchError> {
        Err(DispatchError::Other("not used in ledger tests"))
    }
    fn owner_of(agent_id: AgentId) -> Option<u64> {
        IDENTITY_OWNERS.with(|o| o.borrow().get(&agent_id).copied())
    }
    fn transfer(agent_id: AgentId, to: &u64) -> DispatchResult {
        IDENTITY_OWNERS.with(|o| {
            let mut owners = o.borrow_mut();
            let owner = owners
                .get_mut(&agent_id)
                .ok_or(DispatchError::Other("unknown identity"))?;
            *owner = *to;
            Ok(())
        })
    }
    fn set_metadata(_agent_id: AgentId, _key: &[u8], _value: &[u8]) -> DispatchResult {
        Ok(())
    }
    fn metadata(_agent_id: AgentId, _key: &[u8]) -> Option<Vec<u8>> {
        None
    }
}

parameter_types! {
    pub const LedgerPalletId: PalletId = PalletId(*b"agnt/rev");
    pub const MaxPlatformFeeBps: u32 = 1_000;
    pub const MaxBuybackBps: u32 = 5_000;
}

impl pallet_revenue_ledger::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type WeightInfo = ();
    type Assets = MockAssets;
    type Agents = MockAgents;
    type Identity = MockIssuer;
    type PalletId = LedgerPalletId;
    type MaxPlatformFeeBps = MaxPlatformFeeBps;
    type MaxBuybackBps = MaxBuybackBps;
}

// =========================================================
// Test helpers
// =========================================================

const OWNER: u64 = 1;
const PAYER: u64 = 2;
const ANYONE: u64 = 3;
const WALLET: u64 = 10;
const TREASURY: u64 = 11;
const DEST: u64 = 12;

const AGENT: AgentId = 1;
const USDX: u32 = 1;

fn new_test_ext() -> sp_io::TestExternalities {
    let t = frame_system::GenesisConfig::<Test>::default()
        .build_storage()
        .unwrap();
    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| System::set_block_number(1));
    ext
}

fn custody() -> u64 {
    RevenueLedger::account_id()
}

/// Whitelisted asset, one active agent, funded payer, 2% fee, 30% buyback.
fn setup() {
    add_agent(AGENT, OWNER, WALLET);
    mint_asset(USDX, PAYER, 1_000_000);
    assert_ok!(RevenueLedger::add_payment_asset(RuntimeOrigin::root(), USDX));
    assert_ok!(RevenueLedger::set_platform_fee_bps(RuntimeOrigin::root(), 200));
    assert_ok!(RevenueLedger::set_buyback_bps(RuntimeOrigin::root(), 3_000));
    assert_ok!(RevenueLedger::set_treasury(RuntimeOrigin::root(), TREASURY));
}

// =========================================================
// Deposit tests
// =========================================================

#[test]
fn deposit_moves_funds_into_custody() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));

        let record = Revenues::<Test>::get(AGENT, USDX);
        assert_eq!(record.total_deposited, 10_000);
        assert_eq!(record.total_distributed, 0);
        assert_eq!(TrackedFunds::<Test>::get(USDX), 10_000);
        assert_eq!(MockAssets::get(USDX, custody()), 10_000);
        assert_eq!(MockAssets::get(USDX, PAYER), 990_000);

        System::assert_has_event(
            Event::RevenueDeposited {
                agent_id: AGENT,
                asset: USDX,
                amount: 10_000,
                payer: PAYER,
            }
            .into(),
        );
    });
}

#[test]
fn deposit_rejects_invalid_inputs() {
    new_test_ext().execute_with(|| {
        setup();
        assert_noop!(
            RevenueLedger::deposit(RuntimeOrigin::signed(PAYER), AGENT, 99, 10_000),
            Error::<Test>::AssetNotWhitelisted
        );
        assert_noop!(
            RevenueLedger::deposit(RuntimeOrigin::signed(PAYER), AGENT, USDX, 0),
            Error::<Test>::ZeroAmount
        );
        assert_noop!(
            RevenueLedger::deposit(RuntimeOrigin::signed(PAYER), 42, USDX, 10_000),
            Error::<Test>::AgentNotFound
        );
    });
}

#[test]
fn deposit_requires_active_agent() {
    new_test_ext().execute_with(|| {
        setup();
        set_agent_active(AGENT, false);
        assert_noop!(
            RevenueLedger::deposit(RuntimeOrigin::signed(PAYER), AGENT, USDX, 10_000),
            Error::<Test>::AgentInactive
        );

        // Reactivation restores deposits.
        set_agent_active(AGENT, true);
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
    });
}

// =========================================================
// Distribution tests
// =========================================================

#[test]
fn distribute_splits_with_bps_math() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        // 2% fee off the top, 30% of the remainder escrowed for buybacks.
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));

        assert_eq!(MockAssets::get(USDX, TREASURY), 200);
        assert_eq!(MockAssets::get(USDX, WALLET), 6_860);
        assert_eq!(MockAssets::get(USDX, custody()), 2_940);

        let record = Revenues::<Test>::get(AGENT, USDX);
        assert_eq!(record.total_distributed, 10_000);
        assert_eq!(record.buyback_accrued, 2_940);
        assert_eq!(record.buyback_withdrawn, 0);
        assert_eq!(record.last_distribution_at, 1);
        // Escrow stays tracked; only the paid legs left the ledger's books.
        assert_eq!(TrackedFunds::<Test>::get(USDX), 2_940);
        assert_eq!(RevenueLedger::undistributed(AGENT, USDX), 0);
        assert_eq!(RevenueLedger::withdrawable_buyback(AGENT, USDX), 2_940);

        System::assert_has_event(
            Event::RevenueDistributed {
                agent_id: AGENT,
                asset: USDX,
                platform_fee: 200,
                agent_share: 6_860,
                buyback_share: 2_940,
            }
            .into(),
        );
    });
}

#[test]
fn distribute_truncates_and_conserves_every_unit() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_001
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));

        // fee 200 (truncated from 200.02), buyback 2940 (from 2940.3),
        // remainder 6861; the legs sum to exactly the deposit.
        assert_eq!(MockAssets::get(USDX, TREASURY), 200);
        assert_eq!(MockAssets::get(USDX, WALLET), 6_861);
        assert_eq!(Revenues::<Test>::get(AGENT, USDX).buyback_accrued, 2_940);
        assert_eq!(200 + 6_861 + 2_940, 10_001);
    });
}

#[test]
fn distribute_twice_needs_new_deposits() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));
        assert_noop!(
            RevenueLedger::distribute(RuntimeOrigin::signed(ANYONE), AGENT, USDX),
            Error::<Test>::NothingToDistribute
        );

        // A fresh deposit only distributes the new amount.
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            1_000
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));
        assert_eq!(MockAssets::get(USDX, TREASURY), 200 + 20);
        assert_eq!(MockAssets::get(USDX, WALLET), 6_860 + 686);
    });
}

#[test]
fn distribute_requires_treasury_only_for_nonzero_fee() {
    new_test_ext().execute_with(|| {
        add_agent(AGENT, OWNER, WALLET);
        mint_asset(USDX, PAYER, 1_000_000);
        assert_ok!(RevenueLedger::add_payment_asset(RuntimeOrigin::root(), USDX));
        assert_ok!(RevenueLedger::set_platform_fee_bps(RuntimeOrigin::root(), 200));
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));

        assert_noop!(
            RevenueLedger::distribute(RuntimeOrigin::signed(ANYONE), AGENT, USDX),
            Error::<Test>::TreasuryNotSet
        );

        // With a zero fee no treasury is needed.
        assert_ok!(RevenueLedger::set_platform_fee_bps(RuntimeOrigin::root(), 0));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));
        assert_eq!(MockAssets::get(USDX, WALLET), 10_000);
    });
}

#[test]
fn distribute_pays_the_current_operating_wallet() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        // The wallet changes between deposit and distribution.
        set_agent_wallet(AGENT, DEST);
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));
        assert_eq!(MockAssets::get(USDX, WALLET), 0);
        assert_eq!(MockAssets::get(USDX, DEST), 6_860);
    });
}

// =========================================================
// Buyback withdrawal tests
// =========================================================

#[test]
fn withdraw_buyback_pays_identity_owner_choice() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));

        assert_ok!(RevenueLedger::withdraw_buyback(
            RuntimeOrigin::signed(OWNER),
            AGENT,
            USDX,
            DEST
        ));
        assert_eq!(MockAssets::get(USDX, DEST), 2_940);
        assert_eq!(MockAssets::get(USDX, custody()), 0);
        assert_eq!(TrackedFunds::<Test>::get(USDX), 0);
        assert_eq!(Revenues::<Test>::get(AGENT, USDX).buyback_withdrawn, 2_940);

        assert_noop!(
            RevenueLedger::withdraw_buyback(RuntimeOrigin::signed(OWNER), AGENT, USDX, DEST),
            Error::<Test>::NothingToWithdraw
        );
    });
}

#[test]
fn withdraw_buyback_follows_identity_ownership() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));

        assert_noop!(
            RevenueLedger::withdraw_buyback(RuntimeOrigin::signed(ANYONE), AGENT, USDX, DEST),
            Error::<Test>::NotIdentityOwner
        );

        // After an identity transfer the new owner withdraws.
        assert_ok!(MockIssuer::transfer(AGENT, &ANYONE));
        assert_noop!(
            RevenueLedger::withdraw_buyback(RuntimeOrigin::signed(OWNER), AGENT, USDX, DEST),
            Error::<Test>::NotIdentityOwner
        );
        assert_ok!(RevenueLedger::withdraw_buyback(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX,
            DEST
        ));
    });
}

#[test]
fn withdraw_buyback_fails_for_unknown_agent() {
    new_test_ext().execute_with(|| {
        setup();
        assert_noop!(
            RevenueLedger::withdraw_buyback(RuntimeOrigin::signed(OWNER), 42, USDX, DEST),
            Error::<Test>::AgentNotFound
        );
    });
}

// =========================================================
// Admin tests
// =========================================================

#[test]
fn bps_setters_enforce_caps_and_root() {
    new_test_ext().execute_with(|| {
        assert_noop!(
            RevenueLedger::set_platform_fee_bps(RuntimeOrigin::signed(OWNER), 100),
            DispatchError::BadOrigin
        );
        assert_noop!(
            RevenueLedger::set_platform_fee_bps(RuntimeOrigin::root(), 1_001),
            Error::<Test>::FeeAboveCap
        );
        assert_noop!(
            RevenueLedger::set_buyback_bps(RuntimeOrigin::root(), 5_001),
            Error::<Test>::SplitAboveCap
        );
        assert_ok!(RevenueLedger::set_platform_fee_bps(RuntimeOrigin::root(), 1_000));
        assert_ok!(RevenueLedger::set_buyback_bps(RuntimeOrigin::root(), 5_000));
        assert_eq!(PlatformFeeBps::<Test>::get(), 1_000);
        assert_eq!(BuybackBps::<Test>::get(), 5_000);
    });
}

#[test]
fn whitelist_rejects_duplicates_and_unknown_removals() {
    new_test_ext().execute_with(|| {
        assert_ok!(RevenueLedger::add_payment_asset(RuntimeOrigin::root(), USDX));
        assert_noop!(
            RevenueLedger::add_payment_asset(RuntimeOrigin::root(), USDX),
            Error::<Test>::AssetAlreadyWhitelisted
        );
        assert_ok!(RevenueLedger::remove_payment_asset(RuntimeOrigin::root(), USDX));
        assert_noop!(
            RevenueLedger::remove_payment_asset(RuntimeOrigin::root(), USDX),
            Error::<Test>::AssetNotWhitelisted
        );
    });
}

#[test]
fn rescue_sweeps_only_untracked_funds() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));

        // Custody equals tracked funds, nothing to sweep.
        assert_noop!(
            RevenueLedger::rescue(RuntimeOrigin::root(), USDX, DEST),
            Error::<Test>::NothingToRescue
        );

        // Someone transfers into custody outside the ledger.
        mint_asset(USDX, custody(), 777);
        assert_ok!(RevenueLedger::rescue(RuntimeOrigin::root(), USDX, DEST));
        assert_eq!(MockAssets::get(USDX, DEST), 777);
        assert_eq!(MockAssets::get(USDX, custody()), 10_000);
        assert_eq!(TrackedFunds::<Test>::get(USDX), 10_000);
    });
}

#[test]
fn rescue_never_touches_escrow() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));

        // Custody now holds exactly the buyback escrow.
        assert_eq!(MockAssets::get(USDX, custody()), 2_940);
        assert_noop!(
            RevenueLedger::rescue(RuntimeOrigin::root(), USDX, DEST),
            Error::<Test>::NothingToRescue
        );
    });
}

// =========================================================
// Re-entrancy tests
// =========================================================

#[test]
fn deposit_rejects_reentrant_deposit_from_asset_hook() {
    new_test_ext().execute_with(|| {
        setup();
        REENTER_ON_TRANSFER.with(|f| *f.borrow_mut() = Some(ReenterWith::Deposit));
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));

        // The asset hook's nested deposit was latched out and left no trace.
        assert_eq!(reentered(), Some(Err(Error::<Test>::ReentrantCall.into())));
        assert_eq!(Revenues::<Test>::get(AGENT, USDX).total_deposited, 10_000);
        assert_eq!(TrackedFunds::<Test>::get(USDX), 10_000);
    });
}

#[test]
fn distribute_rejects_reentrant_distribute_from_asset_hook() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        REENTER_ON_TRANSFER.with(|f| *f.borrow_mut() = Some(ReenterWith::Distribute));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));

        assert_eq!(reentered(), Some(Err(Error::<Test>::ReentrantCall.into())));
        // A single split happened.
        assert_eq!(MockAssets::get(USDX, TREASURY), 200);
        assert_eq!(MockAssets::get(USDX, WALLET), 6_860);
        assert_eq!(Revenues::<Test>::get(AGENT, USDX).total_distributed, 10_000);
    });
}

#[test]
fn withdraw_buyback_rejects_reentrant_withdraw_from_asset_hook() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));
        REENTER_ON_TRANSFER.with(|f| *f.borrow_mut() = Some(ReenterWith::Withdraw));
        assert_ok!(RevenueLedger::withdraw_buyback(
            RuntimeOrigin::signed(OWNER),
            AGENT,
            USDX,
            DEST
        ));

        assert_eq!(reentered(), Some(Err(Error::<Test>::ReentrantCall.into())));
        // The escrow left custody exactly once.
        assert_eq!(MockAssets::get(USDX, DEST), 2_940);
        assert_eq!(Revenues::<Test>::get(AGENT, USDX).buyback_withdrawn, 2_940);
        assert_eq!(TrackedFunds::<Test>::get(USDX), 0);
    });
}

// =========================================================
// Pause tests
// =========================================================

#[test]
fn pause_blocks_ledger_operations() {
    new_test_ext().execute_with(|| {
        setup();
        assert_ok!(RevenueLedger::deposit(
            RuntimeOrigin::signed(PAYER),
            AGENT,
            USDX,
            10_000
        ));
        REGISTRY_PAUSED.with(|p| p.set(true));

        assert_noop!(
            RevenueLedger::deposit(RuntimeOrigin::signed(PAYER), AGENT, USDX, 1),
            Error::<Test>::Paused
        );
        assert_noop!(
            RevenueLedger::distribute(RuntimeOrigin::signed(ANYONE), AGENT, USDX),
            Error::<Test>::Paused
        );
        assert_noop!(
            RevenueLedger::withdraw_buyback(RuntimeOrigin::signed(OWNER), AGENT, USDX, DEST),
            Error::<Test>::Paused
        );

        REGISTRY_PAUSED.with(|p| p.set(false));
        assert_ok!(RevenueLedger::distribute(
            RuntimeOrigin::signed(ANYONE),
            AGENT,
            USDX
        ));
    });
}
