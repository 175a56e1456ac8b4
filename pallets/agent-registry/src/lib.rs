//! # Agent Registry Pallet
//!
//! The core AgentPad pallet for issuing and tracking agent identities on-chain.
//!
//! ## Overview
//!
//! This pallet provides functionality for:
//! - Launching agents atomically: identity mint, bonded-token creation, record
//!   persistence and refund of any unspent payment budget in one call
//! - Registering agents without a token, with the token linkable exactly once later
//! - A global one-to-one index between linked tokens and agent identifiers
//! - Identity-owner gated lifecycle operations (endpoint, wallet, activation)
//! - An administrative pause flag shared with the revenue ledger
//!
//! The identity issuer, token factory, market oracle and reputation aggregator
//! are external collaborators reached through the traits defined at the crate
//! root. Authorization is always a live ownership query against the issuer,
//! never the stored creator, because identities can change hands.
//!
//! ## Interface
//!
//! ### Dispatchable Functions
//!
//! - `launch` - Mint an identity, create a bonded token and register the agent
//! - `register` - Register an agent without a token
//! - `link_token` - Attach a token to a tokenless agent (once per agent, once per token)
//! - `update_endpoint` - Change the agent's service endpoint
//! - `update_operating_wallet` - Change the revenue recipient wallet
//! - `deactivate` / `reactivate` - Toggle the activity flag
//! - `pause` / `unpause` - Administrative halt of all state-mutating operations

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


use alloc::vec::Vec;
use sp_core::H256;
use sp_runtime::{DispatchError, DispatchResult};

/// Type alias for agent IDs, assigned by the identity issuer at mint time.
pub type AgentId = u64;

/// External identity issuer: mints uniquely-owned agent identifiers, tracks
/// their ownership and stores per-identifier metadata.
pub trait IdentityIssuer<AccountId> {
    /// Mint a new identity owned by `to`, returning the assigned agent ID.
    fn mint(to: &AccountId, metadata_uri: &[u8]) -> Result<AgentId, DispatchError>;
    /// Current owner of an identity, `None` if it was never minted.
    fn owner_of(agent_id: AgentId) -> Option<AccountId>;
    /// Transfer an identity to a new owner.
    fn transfer(agent_id: AgentId, to: &AccountId) -> DispatchResult;
    /// Write a metadata entry for an identity.
    fn set_metadata(agent_id: AgentId, key: &[u8], value: &[u8]) -> DispatchResult;
    /// Read a metadata entry for an identity.
    fn metadata(agent_id: AgentId, key: &[u8]) -> Option<Vec<u8>>;
}

/// External bonding-curve token factory.
///
/// `create` pulls its creation fee plus any initial-purchase cost from
/// `funder`'s native balance and credits purchased tokens to `funder`. The fee
/// schedule belongs to the factory; callers must measure actual spend by
/// balance delta rather than assuming a constant.
pub trait TokenFactory<AccountId, AssetId, Balance> {
    fn create(
        funder: &AccountId,
        name: &[u8],
        symbol: &[u8],
        metadata_uri: &[u8],
        initial_buy: Balance,
        salt: H256,
    ) -> Result<(AssetId, AccountId), DispatchError>;
}

/// Read-only market-state oracle for bonded tokens.
pub trait MarketOracle<AssetId> {
    /// Bonding-curve progress in basis points (0-10000), `None` if unknown.
    fn progress_bps(token: &AssetId) -> Option<u32>;
    /// Whether the token has graduated to open-market trading.
    fn has_graduated(token: &AssetId) -> Option<bool>;
}

/// External reputation aggregator accepting scored feedback and returning
/// aggregate summaries per agent.
pub trait ReputationAggregator<AccountId> {
    #[allow(clippy::too_many_arguments)]
    fn submit_feedback(
        agent_id: AgentId,
        score: u16,
        decimals: u8,
        tag1: &[u8],
        tag2: &[u8],
        endpoint: &[u8],
        feedback_uri: &[u8],
        feedback_hash: H256,
    ) -> DispatchResult;
    /// Returns (feedback count, summed score, score decimals).
    fn summary(
        agent_id: AgentId,
        client: Option<AccountId>,
        tag1: Option<&[u8]>,
        tag2: Option<&[u8]>,
    ) -> (u64, u64, u8);
}

/// Cross-pallet view of the registry, consumed by the revenue ledger and the
/// rating gateway. Implemented by this pallet.
pub trait AgentManager<AccountId> {
    fn exists(agent_id: AgentId) -> bool;
    fn is_active(agent_id: AgentId) -> bool;
    fn operating_wallet(agent_id: AgentId) -> Option<AccountId>;
    fn endpoint(agent_id: AgentId) -> Option<Vec<u8>>;
    /// The shared administrative pause flag.
    fn paused() -> bool;
}

#[frame_support::pallet]
pub mod pallet {
    use super::*;
    use frame_support::{
        pallet_prelude::*,
        traits::{
            fungibles,
            fungibles::{Inspect, Mutate},
            tokens::Preservation,
            Currency, ExistenceRequirement,
        },
        PalletId,
    };
    use frame_system::pallet_prelude::*;
    use sp_runtime::traits::{AccountIdConversion, CheckedSub, Saturating, Zero};

    pub type BalanceOf<T> =
        <<T as Config>::Currency as Currency<<T as frame_system::Config>::AccountId>>::Balance;

    pub type AssetIdOf<T> = <<T as Config>::Assets as fungibles::Inspect<
        <T as frame_system::Config>::AccountId,
    >>::AssetId;

    pub type AssetBalanceOf<T> = <<T as Config>::Assets as fungibles::Inspect<
        <T as frame_system::Config>::AccountId,
    >>::Balance;

    /// Metadata key under which the registered endpoint is mirrored into the
    /// identity issuer.
    pub const ENDPOINT_METADATA_KEY: &[u8] = b"endpoint";

    /// Core agent information stored on-chain.
    #[derive(Clone, Encode, Decode, Eq, PartialEq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
    #[scale_info(skip_type_params(T))]
    pub struct AgentRecord<T: Config> {
        /// The bonded token linked to this agent, set at most once.
        pub token: Option<AssetIdOf<T>>,
        /// The account that performed the registration. Never used for
        /// authorization; ownership is queried live from the issuer.
        pub creator: T::AccountId,
        /// Account receiving the agent's revenue share on distribution.
        pub operating_wallet: T::AccountId,
        /// Service-location string for the agent.
        pub endpoint: BoundedVec<u8, T::MaxEndpointLength>,
        /// Block number when the agent was registered.
        pub created_at: BlockNumberFor<T>,
        /// Gates ledger deposits and rating submission.
        pub active: bool,
    }

    impl<T: Config> codec::DecodeWithMemTracking for AgentRecord<T> {}

    /// The pallet's configuration trait.
    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// The overarching runtime event type.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Weight information for extrinsics in this pallet.
        type WeightInfo: WeightInfo;

        /// Native currency carrying the launch payment budget.
        type Currency: Currency<Self::AccountId>;

        /// Fungible tokens created by the factory and forwarded to launchers.
        type Assets: fungibles::Inspect<Self::AccountId, AssetId: codec::DecodeWithMemTracking>
            + fungibles::Mutate<Self::AccountId>;

        /// The external identity issuer.
        type Identity: IdentityIssuer<Self::AccountId>;

        /// The external bonding-curve token factory.
        type Factory: TokenFactory<Self::AccountId, AssetIdOf<Self>, BalanceOf<Self>>;

        /// The external market-state oracle.
        type Oracle: MarketOracle<AssetIdOf<Self>>;

        /// The external reputation aggregator, for summary pass-through.
        type Reputation: ReputationAggregator<Self::AccountId>;

        /// Pallet account holding budgets and minted identities mid-launch.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Maximum length of identity/token metadata URIs in bytes.
        #[pallet::constant]
        type MaxUriLength: Get<u32>;

        /// Maximum length of a token name in bytes.
        #[pallet::constant]
        type MaxNameLength: Get<u32>;

        /// Maximum length of a token symbol in bytes.
        #[pallet::constant]
        type MaxSymbolLength: Get<u32>;

        /// Maximum length of an agent endpoint in bytes.
        #[pallet::constant]
        type MaxEndpointLength: Get<u32>;

        /// Maximum number of agents indexed per creator account.
        #[pallet::constant]
        type MaxAgentsPerCreator: Get<u32>;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ========== Storage ==========

    /// Map from AgentId to its record.
    #[pallet::storage]
    #[pallet::getter(fn agents)]
    pub type Agents<T: Config> =
        StorageMap<_, Blake2_128Concat, AgentId, AgentRecord<T>, OptionQuery>;

    /// Reverse side of the token-uniqueness index: token to agent.
    /// The forward side lives in the record's `token` field.
    #[pallet::storage]
    #[pallet::getter(fn agent_by_token)]
    pub type TokenToAgent<T: Config> =
        StorageMap<_, Blake2_128Concat, AssetIdOf<T>, AgentId, OptionQuery>;

    /// Map from creator account to the agents it registered.
    #[pallet::storage]
    #[pallet::getter(fn agents_by_creator)]
    pub type AgentsByCreator<T: Config> = StorageMap<
        _,
        Blake2_128Concat,
        T::AccountId,
        BoundedVec<AgentId, T::MaxAgentsPerCreator>,
        ValueQuery,
    >;

    /// Total number of agents ever registered through this registry.
    #[pallet::storage]
    #[pallet::getter(fn agent_count)]
    pub type AgentCount<T: Config> = StorageValue<_, u64, ValueQuery>;

    /// Administrative pause flag, checked by every state-mutating operation
    /// here and in the revenue ledger.
    #[pallet::storage]
    #[pallet::getter(fn is_paused)]
    pub type Paused<T: Config> = StorageValue<_, bool, ValueQuery>;

    /// Re-entrancy latch, taken by every state-mutating extrinsic.
    /// Collaborator calls (issuer, factory) can run arbitrary code.
    #[pallet::storage]
    pub type EntryGuard<T: Config> = StorageValue<_, bool, ValueQuery>;

    // ========== Events ==========

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// An agent was launched with a freshly created token.
        AgentLaunched {
            agent_id: AgentId,
            token: AssetIdOf<T>,
            pool: T::AccountId,
            creator: T::AccountId,
            identity_uri: Vec<u8>,
            token_uri: Vec<u8>,
            token_name: Vec<u8>,
            token_symbol: Vec<u8>,
        },
        /// An agent was registered without a token.
        AgentRegistered {
            agent_id: AgentId,
            creator: T::AccountId,
            identity_uri: Vec<u8>,
        },
        /// A token was linked to a previously tokenless agent.
        TokenLinked {
            agent_id: AgentId,
            token: AssetIdOf<T>,
        },
        /// An agent's endpoint was updated.
        EndpointUpdated {
            agent_id: AgentId,
            endpoint: Vec<u8>,
        },
        /// An agent's operating wallet was updated.
        OperatingWalletUpdated {
            agent_id: AgentId,
            wallet: T::AccountId,
        },
        /// An agent's activity flag was toggled.
        ActivationToggled { agent_id: AgentId, active: bool },
        /// The registry (and with it the ledger) was paused.
        RegistryPaused,
        /// The registry was unpaused.
        RegistryUnpaused,
    }

    // ========== Errors ==========

    #[pallet::error]
    pub enum Error<T> {
        /// The agent ID was not found in the registry.
        AgentNotFound,
        /// The caller is not the current owner of the agent's identity.
        NotIdentityOwner,
        /// The identity metadata URI must not be empty.
        EmptyIdentityUri,
        /// The token name must not be empty.
        EmptyTokenName,
        /// The token symbol must not be empty.
        EmptyTokenSymbol,
        /// A metadata URI exceeds the maximum allowed length.
        UriTooLong,
        /// The token name exceeds the maximum allowed length.
        NameTooLong,
        /// The token symbol exceeds the maximum allowed length.
        SymbolTooLong,
        /// The endpoint exceeds the maximum allowed length.
        EndpointTooLong,
        /// The agent already has a linked token.
        TokenAlreadyLinked,
        /// The token is already linked to a different agent.
        TokenAlreadyClaimed,
        /// The agent has no linked token.
        TokenNotLinked,
        /// The agent is already active.
        AlreadyActive,
        /// The agent is already inactive.
        AlreadyInactive,
        /// The creator has reached the maximum number of agents.
        TooManyAgents,
        /// The issuer returned an agent ID that is already registered.
        AgentAlreadyRegistered,
        /// The token factory spent more than the supplied payment budget.
        BudgetExceeded,
        /// The registry is administratively paused.
        Paused,
        /// The registry is already paused.
        AlreadyPaused,
        /// The registry is not paused.
        NotPaused,
        /// Re-entrant call into a guarded entry point.
        ReentrantCall,
        /// The market oracle has no data for the linked token.
        OracleUnavailable,
    }

    // ========== Extrinsics ==========

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Launch a new agent: mint an identity, create a bonded token with an
        /// optional initial purchase, persist the record and refund whatever
        /// part of `payment_budget` the factory did not spend.
        ///
        /// The whole call is atomic; a failure in any step (including the
        /// collaborator calls) reverts every state change and returns the
        /// full budget to the caller.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::launch())]
        #[allow(clippy::too_many_arguments)]
        pub fn launch(
            origin: OriginFor<T>,
            identity_uri: Vec<u8>,
            endpoint: Vec<u8>,
            token_name: Vec<u8>,
            token_symbol: Vec<u8>,
            token_uri: Vec<u8>,
            initial_buy: BalanceOf<T>,
            salt: H256,
            payment_budget: BalanceOf<T>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            ensure!(!identity_uri.is_empty(), Error::<T>::EmptyIdentityUri);
            ensure!(!token_name.is_empty(), Error::<T>::EmptyTokenName);
            ensure!(!token_symbol.is_empty(), Error::<T>::EmptyTokenSymbol);
            ensure!(
                identity_uri.len() <= T::MaxUriLength::get() as usize
                    && token_uri.len() <= T::MaxUriLength::get() as usize,
                Error::<T>::UriTooLong
            );
            ensure!(
                token_name.len() <= T::MaxNameLength::get() as usize,
                Error::<T>::NameTooLong
            );
            ensure!(
                token_symbol.len() <= T::MaxSymbolLength::get() as usize,
                Error::<T>::SymbolTooLong
            );
            let bounded_endpoint: BoundedVec<u8, T::MaxEndpointLength> = endpoint
                .clone()
                .try_into()
                .map_err(|_| Error::<T>::EndpointTooLong)?;

            let registry = Self::account_id();

            // Commit the budget, then measure the factory's actual spend as a
            // balance delta. The fee schedule is the factory's parameter.
            T::Currency::transfer(
                &who,
                &registry,
                payment_budget,
                ExistenceRequirement::KeepAlive,
            )?;

            let agent_id = T::Identity::mint(&registry, &identity_uri)?;
            ensure!(
                !Agents::<T>::contains_key(agent_id),
                Error::<T>::AgentAlreadyRegistered
            );

            let before = T::Currency::free_balance(&registry);
            let (token, pool) = T::Factory::create(
                &registry,
                &token_name,
                &token_symbol,
                &token_uri,
                initial_buy,
                salt,
            )?;
            let after = T::Currency::free_balance(&registry);
            let spent = before.saturating_sub(after);
            let refund = payment_budget
                .checked_sub(&spent)
                .ok_or(Error::<T>::BudgetExceeded)?;

            ensure!(
                !TokenToAgent::<T>::contains_key(&token),
                Error::<T>::TokenAlreadyClaimed
            );

            Self::insert_agent(agent_id, &who, bounded_endpoint, Some(token.clone()))?;
            TokenToAgent::<T>::insert(&token, agent_id);

            T::Identity::set_metadata(agent_id, ENDPOINT_METADATA_KEY, &endpoint)?;
            T::Identity::transfer(agent_id, &who)?;

            // Forward tokens acquired by the initial purchase.
            let purchased = T::Assets::balance(token.clone(), &registry);
            if !purchased.is_zero() {
                T::Assets::transfer(
                    token.clone(),
                    &registry,
                    &who,
                    purchased,
                    Preservation::Expendable,
                )?;
            }

            if !refund.is_zero() {
                T::Currency::transfer(&registry, &who, refund, ExistenceRequirement::AllowDeath)?;
            }

            Self::exit_guard();

            Self::deposit_event(Event::AgentLaunched {
                agent_id,
                token,
                pool,
                creator: who,
                identity_uri,
                token_uri,
                token_name,
                token_symbol,
            });

            Ok(())
        }

        /// Register a new agent without creating a token. The token can be
        /// attached later through `link_token`.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::register())]
        pub fn register(
            origin: OriginFor<T>,
            identity_uri: Vec<u8>,
            endpoint: Vec<u8>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            ensure!(!identity_uri.is_empty(), Error::<T>::EmptyIdentityUri);
            ensure!(
                identity_uri.len() <= T::MaxUriLength::get() as usize,
                Error::<T>::UriTooLong
            );
            let bounded_endpoint: BoundedVec<u8, T::MaxEndpointLength> = endpoint
                .clone()
                .try_into()
                .map_err(|_| Error::<T>::EndpointTooLong)?;

            let registry = Self::account_id();
            let agent_id = T::Identity::mint(&registry, &identity_uri)?;
            ensure!(
                !Agents::<T>::contains_key(agent_id),
                Error::<T>::AgentAlreadyRegistered
            );

            Self::insert_agent(agent_id, &who, bounded_endpoint, None)?;

            T::Identity::set_metadata(agent_id, ENDPOINT_METADATA_KEY, &endpoint)?;
            T::Identity::transfer(agent_id, &who)?;

            Self::exit_guard();

            Self::deposit_event(Event::AgentRegistered {
                agent_id,
                creator: who,
                identity_uri,
            });

            Ok(())
        }

        /// Link a token to a tokenless agent. Only the current identity owner
        /// may link; each token can back at most one agent, ever.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::link_token())]
        pub fn link_token(
            origin: OriginFor<T>,
            agent_id: AgentId,
            token: AssetIdOf<T>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            Agents::<T>::try_mutate(agent_id, |maybe_agent| -> DispatchResult {
                let agent = maybe_agent.as_mut().ok_or(Error::<T>::AgentNotFound)?;
                Self::ensure_identity_owner(&who, agent_id)?;
                ensure!(agent.token.is_none(), Error::<T>::TokenAlreadyLinked);
                ensure!(
                    !TokenToAgent::<T>::contains_key(&token),
                    Error::<T>::TokenAlreadyClaimed
                );

                agent.token = Some(token.clone());
                TokenToAgent::<T>::insert(&token, agent_id);
                Ok(())
            })?;

            Self::exit_guard();

            Self::deposit_event(Event::TokenLinked { agent_id, token });

            Ok(())
        }

        /// Update the agent's service endpoint. Identity-owner gated.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::update_endpoint())]
        pub fn update_endpoint(
            origin: OriginFor<T>,
            agent_id: AgentId,
            endpoint: Vec<u8>,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            Agents::<T>::try_mutate(agent_id, |maybe_agent| -> DispatchResult {
                let agent = maybe_agent.as_mut().ok_or(Error::<T>::AgentNotFound)?;
                Self::ensure_identity_owner(&who, agent_id)?;

                agent.endpoint = endpoint
                    .clone()
                    .try_into()
                    .map_err(|_| Error::<T>::EndpointTooLong)?;
                Ok(())
            })?;

            T::Identity::set_metadata(agent_id, ENDPOINT_METADATA_KEY, &endpoint)?;

            Self::exit_guard();

            Self::deposit_event(Event::EndpointUpdated { agent_id, endpoint });

            Ok(())
        }

        /// Update the wallet receiving the agent's revenue share.
        /// Identity-owner gated.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::update_operating_wallet())]
        pub fn update_operating_wallet(
            origin: OriginFor<T>,
            agent_id: AgentId,
            wallet: T::AccountId,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            Agents::<T>::try_mutate(agent_id, |maybe_agent| -> DispatchResult {
                let agent = maybe_agent.as_mut().ok_or(Error::<T>::AgentNotFound)?;
                Self::ensure_identity_owner(&who, agent_id)?;

                agent.operating_wallet = wallet.clone();
                Ok(())
            })?;

            Self::exit_guard();

            Self::deposit_event(Event::OperatingWalletUpdated { agent_id, wallet });

            Ok(())
        }

        /// Deactivate an active agent. Fails if already inactive.
        #[pallet::call_index(5)]
        #[pallet::weight(T::WeightInfo::deactivate())]
        pub fn deactivate(origin: OriginFor<T>, agent_id: AgentId) -> DispatchResult {
            Self::toggle_active(origin, agent_id, false)
        }

        /// Reactivate an inactive agent. Fails if already active.
        #[pallet::call_index(6)]
        #[pallet::weight(T::WeightInfo::reactivate())]
        pub fn reactivate(origin: OriginFor<T>, agent_id: AgentId) -> DispatchResult {
            Self::toggle_active(origin, agent_id, true)
        }

        /// Pause all state-mutating registry and ledger operations.
        #[pallet::call_index(7)]
        #[pallet::weight(T::WeightInfo::pause())]
        pub fn pause(origin: OriginFor<T>) -> DispatchResult {
            ensure_root(origin)?;
            ensure!(!Paused::<T>::get(), Error::<T>::AlreadyPaused);
            Paused::<T>::put(true);
            Self::deposit_event(Event::RegistryPaused);
            Ok(())
        }

        /// Lift the administrative pause.
        #[pallet::call_index(8)]
        #[pallet::weight(T::WeightInfo::unpause())]
        pub fn unpause(origin: OriginFor<T>) -> DispatchResult {
            ensure_root(origin)?;
            ensure!(Paused::<T>::get(), Error::<T>::NotPaused);
            Paused::<T>::put(false);
            Self::deposit_event(Event::RegistryUnpaused);
            Ok(())
        }
    }

    // ========== Internal helpers ==========

    impl<T: Config> Pallet<T> {
        /// The registry's custody account for budgets and in-flight identities.
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }

        fn ensure_not_paused() -> Result<(), Error<T>> {
            ensure!(!Paused::<T>::get(), Error::<T>::Paused);
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

        /// Live authorization check against the identity issuer.
        fn ensure_identity_owner(who: &T::AccountId, agent_id: AgentId) -> Result<(), Error<T>> {
            match T::Identity::owner_of(agent_id) {
                Some(owner) if owner == *who => Ok(()),
                _ => Err(Error::<T>::NotIdentityOwner),
            }
        }

        fn insert_agent(
            agent_id: AgentId,
            creator: &T::AccountId,
            endpoint: BoundedVec<u8, T::MaxEndpointLength>,
            token: Option<AssetIdOf<T>>,
        ) -> DispatchResult {
            let record = AgentRecord::<T> {
                token,
                creator: creator.clone(),
                operating_wallet: creator.clone(),
                endpoint,
                created_at: <frame_system::Pallet<T>>::block_number(),
                active: true,
            };
            Agents::<T>::insert(agent_id, record);
            AgentCount::<T>::mutate(|count| *count = count.saturating_add(1));
            AgentsByCreator::<T>::try_mutate(creator, |agents| {
                agents
                    .try_push(agent_id)
                    .map_err(|_| Error::<T>::TooManyAgents)
            })?;
            Ok(())
        }

        fn toggle_active(origin: OriginFor<T>, agent_id: AgentId, active: bool) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::ensure_not_paused()?;
            Self::enter_guard()?;

            Agents::<T>::try_mutate(agent_id, |maybe_agent| -> DispatchResult {
                let agent = maybe_agent.as_mut().ok_or(Error::<T>::AgentNotFound)?;
                Self::ensure_identity_owner(&who, agent_id)?;
                if active {
                    ensure!(!agent.active, Error::<T>::AlreadyActive);
                } else {
                    ensure!(agent.active, Error::<T>::AlreadyInactive);
                }
                agent.active = active;
                Ok(())
            })?;

            Self::exit_guard();

            Self::deposit_event(Event::ActivationToggled { agent_id, active });

            Ok(())
        }

        // ===== Read helpers =====

        /// The token linked to an agent, if any.
        pub fn token_of(agent_id: AgentId) -> Option<AssetIdOf<T>> {
            Agents::<T>::get(agent_id).and_then(|agent| agent.token)
        }

        /// Bonding-curve progress pass-through for the agent's linked token.
        pub fn token_progress(agent_id: AgentId) -> Result<u32, DispatchError> {
            let agent = Agents::<T>::get(agent_id).ok_or(Error::<T>::AgentNotFound)?;
            let token = agent.token.ok_or(Error::<T>::TokenNotLinked)?;
            T::Oracle::progress_bps(&token).ok_or_else(|| Error::<T>::OracleUnavailable.into())
        }

        /// Graduation pass-through for the agent's linked token.
        pub fn token_graduated(agent_id: AgentId) -> Result<bool, DispatchError> {
            let agent = Agents::<T>::get(agent_id).ok_or(Error::<T>::AgentNotFound)?;
            let token = agent.token.ok_or(Error::<T>::TokenNotLinked)?;
            T::Oracle::has_graduated(&token).ok_or_else(|| Error::<T>::OracleUnavailable.into())
        }

        /// Reputation summary pass-through to the aggregator.
        pub fn reputation_summary(
            agent_id: AgentId,
            client: Option<T::AccountId>,
            tag1: Option<Vec<u8>>,
            tag2: Option<Vec<u8>>,
        ) -> Result<(u64, u64, u8), DispatchError> {
            ensure!(
                Agents::<T>::contains_key(agent_id),
                Error::<T>::AgentNotFound
            );
            Ok(T::Reputation::summary(
                agent_id,
                client,
                tag1.as_deref(),
                tag2.as_deref(),
            ))
        }
    }

    // ========== AgentManager Trait Implementation ==========

    impl<T: Config> AgentManager<T::AccountId> for Pallet<T> {
        fn exists(agent_id: AgentId) -> bool {
            Agents::<T>::contains_key(agent_id)
        }

        fn is_active(agent_id: AgentId) -> bool {
            Agents::<T>::get(agent_id).is_some_and(|agent| agent.active)
        }

        fn operating_wallet(agent_id: AgentId) -> Option<T::AccountId> {
            Agents::<T>::get(agent_id).map(|agent| agent.operating_wallet)
        }

        fn endpoint(agent_id: AgentId) -> Option<Vec<u8>> {
            Agents::<T>::get(agent_id).map(|agent| agent.endpoint.to_vec())
        }

        fn paused() -> bool {
            Paused::<T>::get()
        }
    }

    // ========== Weight Info Trait ==========

    /// Weight information for the pallet's extrinsics.
    pub trait WeightInfo {
        fn launch() -> Weight;
        fn register() -> Weight;
        fn link_token() -> Weight;
        fn update_endpoint() -> Weight;
        fn update_operating_wallet() -> Weight;
        fn deactivate() -> Weight;
        fn reactivate() -> Weight;
        fn pause() -> Weight;
        fn unpause() -> Weight;
    }

    /// Default weights for testing.
    impl WeightInfo for () {
        fn launch() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn register() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn link_token() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn update_endpoint() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn update_operating_wallet() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn deactivate() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn reactivate() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn pause() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn unpause() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }
}
