//! # Revenue Ledger Pallet
//!
//! Per-agent, per-asset revenue accounting for AgentPad agents.
//!
//! ## Overview
//!
//! This pallet provides functionality for:
//! - Depositing revenue in whitelisted payment assets against an agent
//! - Distributing accumulated revenue through a basis-point split between a
//!   platform treasury, the agent's operating wallet and a buyback escrow
//! - Withdrawing escrowed buyback funds, gated on live identity ownership
//! - Administrative configuration of fee levels, treasury and the whitelist
//! - Rescuing only assets sent to the custody account outside the ledger's
//!   own accounting
//!
//! All funds sit in a single pallet custody account; the ledger's storage is
//! the source of truth for who may move what. Accounting is always mutated
//! before the corresponding transfer so a collaborator failure can never leave
//! paid-but-unrecorded state, and any failure reverts the whole call.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(test)]
mod tests;

#[frame_support::pallet]
pub mod pallet {
    use frame_support::{
        pallet_prelude::*,
        traits::{
            fungibles,
            fungibles::{Inspect, Mutate},
            tokens::Preservation,
        },
        PalletId,
    };
    use frame_system::pallet_prelude::*;
    use pallet_agent_registry::{AgentId, AgentManager, IdentityIssuer};
    use sp_runtime::traits::{AccountIdConversion, SaturatedConversion, Saturating, Zero};

    pub type AssetIdOf<T> = <<T as Config>::Assets as fungibles::Inspect<
        <T as frame_system::Config>::AccountId,
    >>::AssetId;

    pub type AssetBalanceOf<T> = <<T as Config>::Assets as fungibles::Inspect<
        <T as frame_system::Config>::AccountId,
    >>::Balance;

    /// Denominator for all basis-point arithmetic.
    pub const BPS_DENOMINATOR: u128 = 10_000;

    /// Lifetime revenue accounting for one (agent, asset) pair.
    ///
    /// All fields are monotonically increasing; current balances are always
    /// differences (`total_deposited - total_distributed` is undistributed,
    /// `buyback_accrued - buyback_withdrawn` is escrowed).
    #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
    #[scale_info(skip_type_params(T))]
    pub struct RevenueRecord<T: Config> {
        /// Lifetime deposits.
        pub total_deposited: AssetBalanceOf<T>,
        /// Lifetime amount that has been through a distribution.
        pub total_distributed: AssetBalanceOf<T>,
        /// Lifetime buyback share accrued into escrow.
        pub buyback_accrued: AssetBalanceOf<T>,
        /// Lifetime buyback escrow withdrawn.
        pub buyback_withdrawn: AssetBalanceOf<T>,
        /// Block of the most recent distribution.
        pub last_distribution_at: BlockNumberFor<T>,
    }

    impl<T: Config> codec::DecodeWithMemTracking for RevenueRecord<T> {}

    impl<T: Config> Default for RevenueRecord<T> {
        fn default() -> Self {
            Self {
                total_deposited: Zero::zero(),
                total_distributed: Zero::zero(),
                buyback_accrued: Zero::zero(),
                buyback_withdrawn: Zero::zero(),
                last_distribution_at: Zero::zero(),
            }
        }
    }

    /// The pallet's configuration trait.
    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// The overarching runtime event type.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Weight information for extrinsics in this pallet.
        type WeightInfo: WeightInfo;

        /// The payment assets held in custody by the ledger.
        type Assets: fungibles::Inspect<Self::AccountId, AssetId: codec::DecodeWithMemTracking>
            + fungibles::Mutate<Self::AccountId>;

        /// Registry view used for existence, activity, wallet and pause checks.
        type Agents: AgentManager<Self::AccountId>;

        /// Identity issuer, for live ownership checks on withdrawal.
        type Identity: IdentityIssuer<Self::AccountId>;

        /// Pallet account holding all custodied revenue.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Hard cap on the platform fee, in basis points.
        #[pallet::constant]
        type MaxPlatformFeeBps: Get<u32>;

        /// Hard cap on the buyback split, in basis points.
        #[pallet::constant]
        type MaxBuybackBps: Get<u32>;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ========== Storage ==========

    /// Revenue accounting per agent per payment asset.
    #[pallet::storage]
    #[pallet::getter(fn revenues)]
    pub type Revenues<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        AgentId,
        Blake2_128Concat,
        AssetIdOf<T>,
        RevenueRecord<T>,
        ValueQuery,
    >;

    /// Funds the ledger is answerable for, per asset: the sum of all
    /// undistributed deposits and unwithdrawn buyback escrow. Anything the
    /// custody account holds beyond this is rescuable.
    #[pallet::storage]
    #[pallet::getter(fn tracked_funds)]
    pub type TrackedFunds<T: Config> =
        StorageMap<_, Blake2_128Concat, AssetIdOf<T>, AssetBalanceOf<T>, ValueQuery>;

    /// Platform fee taken off the top of every distribution, in basis points.
    #[pallet::storage]
    #[pallet::getter(fn platform_fee_bps)]
    pub type PlatformFeeBps<T: Config> = StorageValue<_, u32, ValueQuery>;

    /// Share of the post-fee remainder escrowed for buybacks, in basis points.
    #[pallet::storage]
    #[pallet::getter(fn buyback_bps)]
    pub type BuybackBps<T: Config> = StorageValue<_, u32, ValueQuery>;

    /// Destination of the platform fee leg. Must be set before any
    /// distribution with a non-zero fee.
    #[pallet::storage]
    #[pallet::getter(fn treasury)]
    pub type Treasury<T: Config> = StorageValue<_, T::AccountId, OptionQuery>;

    /// Whitelist of assets accepted by `deposit`.
    #[pallet::storage]
    #[pallet::getter(fn payment_assets)]
    pub type PaymentAssets<T: Config> =
        StorageMap<_, Blake2_128Concat, AssetIdOf<T>, bool, ValueQuery>;

    /// Re-entrancy latch for entry points that move funds.
    #[pallet::storage]
    pub type EntryGuard<T: Config> = StorageValue<_, bool, ValueQuery>;

    // ========== Events ==========

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// Revenue was deposited against an agent.
        RevenueDeposited {
            agent_id: AgentId,
            asset: AssetIdOf<T>,
            amount: AssetBalanceOf<T>,
            payer: T::AccountId,
        },
        /// Accumulated revenue was split and paid out.
        RevenueDistributed {
            agent_id: AgentId,
            asset: AssetIdOf<T>,
            platform_fee: AssetBalanceOf<T>,
            agent_share: AssetBalanceOf<T>,
            buyback_share: AssetBalanceOf<T>,
        },
        /// Escrowed buyback funds were withdrawn.
        BuybackWithdrawn {
            agent_id: AgentId,
            asset: AssetIdOf<T>,
            amount: AssetBalanceOf<T>,
            destination: T::AccountId,
        },
        /// The platform fee was updated.
        PlatformFeeUpdated { bps: u32 },
        /// The buyback split was updated.
        BuybackSplitUpdated { bps: u32 },
        /// The treasury account was updated.
        TreasuryUpdated { treasury: T::AccountId },
        /// An asset was added to the payment whitelist.
        PaymentAssetAdded { asset: AssetIdOf<T> },
        /// An asset was removed from the payment whitelist.
        PaymentAssetRemoved { asset: AssetIdOf<T> },
        /// Untracked funds were swept out of the custody account.
        FundsRescued {
            asset: AssetIdOf<T>,
            amount: AssetBalanceOf<T>,
            destination: T::AccountId,
        },
    }

    // ========== Errors ==========

    #[pallet::error]
    pub enum Error<T> {
        /// The agent ID was not found in the registry.
        AgentNotFound,
        /// The agent is deactivated and cannot receive deposits.
        AgentInactive,
        /// The caller is not the current owner of the agent's identity.
        NotIdentityOwner,
        /// The asset is not on the payment whitelist.
        AssetNotWhitelisted,
        /// The asset is already on the payment whitelist.
        AssetAlreadyWhitelisted,
        /// Deposit amounts must be positive.
        ZeroAmount,
        /// There is no undistributed revenue for this (agent, asset) pair.
        NothingToDistribute,
        /// There is no withdrawable buyback escrow for this pair.
        NothingToWithdraw,
        /// The custody account holds nothing beyond tracked funds.
        NothingToRescue,
        /// The platform fee exceeds its hard cap.
        FeeAboveCap,
        /// The buyback split exceeds its hard cap.
        SplitAboveCap,
        /// A distribution with a non-zero fee leg requires a treasury.
        TreasuryNotSet,
        /// Basis-point arithmetic overflowed.
        ArithmeticOverflow,
        /// The registry is administratively paused.
        Paused,
        /// Re-entrant call into a guarded entry point.
        ReentrantCall,
    }

    // ========== Extrinsics ==========

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Deposit `amount` of a whitelisted `asset` as revenue for an active
        /// agent. The funds move into the ledger's custody account and remain
        /// undistributed until someone calls `distribute`.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::deposit())]
        pub fn deposit(
            origin: OriginFor<T>,
            agent_id: AgentId,
            asset: AssetIdOf<T>,
            amount: AssetBalanceOf<T>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            ensure!(
                PaymentAssets::<T>::get(&asset),
                Error::<T>::AssetNotWhitelisted
            );
            ensure!(!amount.is_zero(), Error::<T>::ZeroAmount);
            ensure!(T::Agents::exists(agent_id), Error::<T>::AgentNotFound);
            ensure!(T::Agents::is_active(agent_id), Error::<T>::AgentInactive);

            Revenues::<T>::mutate(agent_id, &asset, |record| {
                record.total_deposited = record.total_deposited.saturating_add(amount);
            });
            TrackedFunds::<T>::mutate(&asset, |tracked| {
                *tracked = tracked.saturating_add(amount);
            });

            T::Assets::transfer(
                asset.clone(),
                &who,
                &Self::account_id(),
                amount,
                Preservation::Preserve,
            )?;

            Self::exit_guard();

            Self::deposit_event(Event::RevenueDeposited {
                agent_id,
                asset,
                amount,
                payer: who,
            });

            Ok(())
        }

        /// Distribute everything undistributed for one (agent, asset) pair.
        ///
        /// Permissionless: anyone may trigger a distribution. The platform fee
        /// comes off the top, the buyback share of the remainder stays in
        /// custody as escrow, and the rest goes to the agent's current
        /// operating wallet as read from the registry at call time.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::distribute())]
        pub fn distribute(
            origin: OriginFor<T>,
            agent_id: AgentId,
            asset: AssetIdOf<T>,
        ) -> DispatchResult {
            ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            let record = Revenues::<T>::get(agent_id, &asset);
            let undistributed = record.total_deposited.saturating_sub(record.total_distributed);
            ensure!(!undistributed.is_zero(), Error::<T>::NothingToDistribute);

            let wallet =
                T::Agents::operating_wallet(agent_id).ok_or(Error::<T>::AgentNotFound)?;

            // Fee truncation loses at most one unit per leg; the remainders
            // are subtractions so the three legs always sum to exactly the
            // undistributed amount.
            let amount: u128 = undistributed.saturated_into();
            let fee_bps = PlatformFeeBps::<T>::get() as u128;
            let buyback_bps = BuybackBps::<T>::get() as u128;

            let platform_fee = amount
                .checked_mul(fee_bps)
                .ok_or(Error::<T>::ArithmeticOverflow)?
                / BPS_DENOMINATOR;
            let remaining = amount.saturating_sub(platform_fee);
            let buyback_share = remaining
                .checked_mul(buyback_bps)
                .ok_or(Error::<T>::ArithmeticOverflow)?
                / BPS_DENOMINATOR;
            let agent_share = remaining.saturating_sub(buyback_share);

            let platform_fee: AssetBalanceOf<T> = platform_fee.saturated_into();
            let buyback_share: AssetBalanceOf<T> = buyback_share.saturated_into();
            let agent_share: AssetBalanceOf<T> = agent_share.saturated_into();

            let treasury = if platform_fee.is_zero() {
                None
            } else {
                Some(Treasury::<T>::get().ok_or(Error::<T>::TreasuryNotSet)?)
            };

            // Accounting first, transfers after.
            Revenues::<T>::mutate(agent_id, &asset, |record| {
                record.total_distributed = record.total_distributed.saturating_add(undistributed);
                record.buyback_accrued = record.buyback_accrued.saturating_add(buyback_share);
                record.last_distribution_at = <frame_system::Pallet<T>>::block_number();
            });
            // The buyback share stays in custody as escrow and remains
            // tracked; only the paid-out legs stop being the ledger's concern.
            TrackedFunds::<T>::mutate(&asset, |tracked| {
                *tracked = tracked
                    .saturating_sub(platform_fee)
                    .saturating_sub(agent_share);
            });

            let custody = Self::account_id();
            if let Some(treasury) = treasury {
                T::Assets::transfer(
                    asset.clone(),
                    &custody,
                    &treasury,
                    platform_fee,
                    Preservation::Expendable,
                )?;
            }
            if !agent_share.is_zero() {
                T::Assets::transfer(
                    asset.clone(),
                    &custody,
                    &wallet,
                    agent_share,
                    Preservation::Expendable,
                )?;
            }

            log::debug!(
                target: "runtime::revenue-ledger",
                "distributed for agent {}: fee {:?}, agent {:?}, buyback {:?}",
                agent_id,
                platform_fee,
                agent_share,
                buyback_share,
            );

            Self::exit_guard();

            Self::deposit_event(Event::RevenueDistributed {
                agent_id,
                asset,
                platform_fee,
                agent_share,
                buyback_share,
            });

            Ok(())
        }

        /// Withdraw the agent's entire escrowed buyback balance for one asset
        /// to `destination`. Only the current identity owner may withdraw.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::withdraw_buyback())]
        pub fn withdraw_buyback(
            origin: OriginFor<T>,
            agent_id: AgentId,
            asset: AssetIdOf<T>,
            destination: T::AccountId,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            ensure!(T::Agents::exists(agent_id), Error::<T>::AgentNotFound);
            ensure!(
                T::Identity::owner_of(agent_id) == Some(who.clone()),
                Error::<T>::NotIdentityOwner
            );

            let record = Revenues::<T>::get(agent_id, &asset);
            let available = record.buyback_accrued.saturating_sub(record.buyback_withdrawn);
            ensure!(!available.is_zero(), Error::<T>::NothingToWithdraw);

            Revenues::<T>::mutate(agent_id, &asset, |record| {
                record.buyback_withdrawn = record.buyback_withdrawn.saturating_add(available);
            });
            TrackedFunds::<T>::mutate(&asset, |tracked| {
                *tracked = tracked.saturating_sub(available);
            });

            T::Assets::transfer(
                asset.clone(),
                &Self::account_id(),
                &destination,
                available,
                Preservation::Expendable,
            )?;

            Self::exit_guard();

            Self::deposit_event(Event::BuybackWithdrawn {
                agent_id,
                asset,
                amount: available,
                destination,
            });

            Ok(())
        }

        /// Set the platform fee in basis points. Root only, hard-capped.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::set_platform_fee_bps())]
        pub fn set_platform_fee_bps(origin: OriginFor<T>, bps: u32) -> DispatchResult {
            ensure_root(origin)?;
            ensure!(bps <= T::MaxPlatformFeeBps::get(), Error::<T>::FeeAboveCap);
            PlatformFeeBps::<T>::put(bps);
            Self::deposit_event(Event::PlatformFeeUpdated { bps });
            Ok(())
        }

        /// Set the buyback split in basis points. Root only, hard-capped.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::set_buyback_bps())]
        pub fn set_buyback_bps(origin: OriginFor<T>, bps: u32) -> DispatchResult {
            ensure_root(origin)?;
            ensure!(bps <= T::MaxBuybackBps::get(), Error::<T>::SplitAboveCap);
            BuybackBps::<T>::put(bps);
            Self::deposit_event(Event::BuybackSplitUpdated { bps });
            Ok(())
        }

        /// Set the treasury account receiving the platform fee leg. Root only.
        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::set_treasury())]
        pub fn set_treasury(origin: OriginFor<T>, treasury: T::AccountId) -> DispatchResult {
            ensure_root(origin)?;
            Treasury::<T>::put(&treasury);
            Self::deposit_event(Event::TreasuryUpdated { treasury });
            Ok(())
        }

        /// Add an asset to the payment whitelist. Root only.
        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::add_payment_asset())]
        pub fn add_payment_asset(origin: OriginFor<T>, asset: AssetIdOf<T>) -> DispatchResult {
            ensure_root(origin)?;
            ensure!(
                !PaymentAssets::<T>::get(&asset),
                Error::<T>::AssetAlreadyWhitelisted
            );
            PaymentAssets::<T>::insert(&asset, true);
            Self::deposit_event(Event::PaymentAssetAdded { asset });
            Ok(())
        }

        /// Remove an asset from the payment whitelist. Root only. Existing
        /// records in the removed asset keep working; only new deposits stop.
        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::remove_payment_asset())]
        pub fn remove_payment_asset(origin: OriginFor<T>, asset: AssetIdOf<T>) -> DispatchResult {
            ensure_root(origin)?;
            ensure!(
                PaymentAssets::<T>::get(&asset),
                Error::<T>::AssetNotWhitelisted
            );
            PaymentAssets::<T>::remove(&asset);
            Self::deposit_event(Event::PaymentAssetRemoved { asset });
            Ok(())
        }

        /// Sweep funds the custody account holds beyond its tracked
        /// obligations, such as direct transfers made outside `deposit`.
        /// Undistributed deposits and buyback escrow can never be rescued.
        #[pallet::call_index(8)]
        #[pallet::weight(T::WeightInfo::rescue())]
        pub fn rescue(
            origin: OriginFor<T>,
            asset: AssetIdOf<T>,
            destination: T::AccountId,
        ) -> DispatchResult {
            ensure_root(origin)?;
            Self::enter_guard()?;

            let custody = Self::account_id();
            let custodied = T::Assets::balance(asset.clone(), &custody);
            let tracked = TrackedFunds::<T>::get(&asset);
            let rescuable = custodied.saturating_sub(tracked);
            ensure!(!rescuable.is_zero(), Error::<T>::NothingToRescue);

            T::Assets::transfer(
                asset.clone(),
                &custody,
                &destination,
                rescuable,
                Preservation::Expendable,
            )?;

            log::info!(
                target: "runtime::revenue-ledger",
                "rescued {:?} of untracked funds",
                rescuable,
            );

            Self::exit_guard();

            Self::deposit_event(Event::FundsRescued {
                asset,
                amount: rescuable,
                destination,
            });

            Ok(())
        }
    }

    // ========== Internal helpers ==========

    impl<T: Config> Pallet<T> {
        /// The ledger's custody account.
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }

        // The pause flag lives in the registry and gates both pallets.
        fn ensure_not_paused() -> Result<(), Error<T>> {
            ensure!(!T::Agents::paused(), Error::<T>::Paused);
            Ok(())
        }

        fn enter_guard() -> Result<(), Error<T>> {
            ensure!(!EntryGuard::<T>::get(), Error::<T>::ReentrantCall);
            EntryGuard::<T>::put(true);
            Ok(())
        }

        // An error between enter and exit reverts the latch together with
        // everything else in the transactional extrinsic.
        fn exit_guard() {
            EntryGuard::<T>::kill();
        }

        // ===== Read helpers =====

        /// Deposited but not yet distributed revenue for one pair.
        pub fn undistributed(agent_id: AgentId, asset: AssetIdOf<T>) -> AssetBalanceOf<T> {
            let record = Revenues::<T>::get(agent_id, &asset);
            record.total_deposited.saturating_sub(record.total_distributed)
        }

        /// Escrowed buyback funds not yet withdrawn for one pair.
        pub fn withdrawable_buyback(agent_id: AgentId, asset: AssetIdOf<T>) -> AssetBalanceOf<T> {
            let record = Revenues::<T>::get(agent_id, &asset);
            record.buyback_accrued.saturating_sub(record.buyback_withdrawn)
        }
    }

    // ========== Weight Info Trait ==========

    /// Weight information for the pallet's extrinsics.
    pub trait WeightInfo {
        fn deposit() -> Weight;
        fn distribute() -> Weight;
        fn withdraw_buyback() -> Weight;
        fn set_platform_fee_bps() -> Weight;
        fn set_buyback_bps() -> Weight;
        fn set_treasury() -> Weight;
        fn add_payment_asset() -> Weight;
        fn remove_payment_asset() -> Weight;
        fn rescue() -> Weight;
    }

    /// Default weights for testing.
    impl WeightInfo for () {
        fn deposit() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn distribute() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn withdraw_buyback() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn set_platform_fee_bps() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn set_buyback_bps() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn set_treasury() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn add_payment_asset() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn remove_payment_asset() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn rescue() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }
}
