//! # Rating Gateway Pallet
//!
//! Validated front door for rating AgentPad agents.
//!
//! The gateway owns no reputation state of its own. It checks that the score
//! is inside the configured fixed-point range, that the primary tag is
//! present, and that the target agent exists and is active, then forwards the
//! feedback to the external reputation aggregator together with the agent's
//! registered endpoint. The emitted event carries the true caller so
//! off-chain consumers can attribute ratings even though the aggregator sees
//! the gateway as the submitter.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[frame_support::pallet]
pub mod pallet {
    use alloc::vec::Vec;
    use frame_support::pallet_prelude::*;
    use frame_system::pallet_prelude::*;
    use pallet_agent_registry::{AgentId, AgentManager, ReputationAggregator};
    use sp_core::H256;

    /// The pallet's configuration trait.
    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// The overarching runtime event type.
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Weight information for extrinsics in this pallet.
        type WeightInfo: WeightInfo;

        /// Registry view used for existence, activity, endpoint and pause
        /// checks.
        type Agents: AgentManager<Self::AccountId>;

        /// The external reputation aggregator receiving validated feedback.
        type Reputation: ReputationAggregator<Self::AccountId>;

        /// Lowest accepted score, in fixed-point units.
        #[pallet::constant]
        type MinScore: Get<u16>;

        /// Highest accepted score, in fixed-point units.
        #[pallet::constant]
        type MaxScore: Get<u16>;

        /// Number of implied decimal places in submitted scores.
        #[pallet::constant]
        type ScoreDecimals: Get<u8>;

        /// Maximum length of a tag in bytes.
        #[pallet::constant]
        type MaxTagLength: Get<u32>;

        /// Maximum length of a feedback URI in bytes.
        #[pallet::constant]
        type MaxUriLength: Get<u32>;
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ========== Events ==========

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// A rating passed validation and was forwarded to the aggregator.
        RatingSubmitted {
            agent_id: AgentId,
            rater: T::AccountId,
            score: u16,
            tag1: Vec<u8>,
            tag2: Vec<u8>,
            feedback_hash: H256,
        },
    }

    // ========== Errors ==========

    #[pallet::error]
    pub enum Error<T> {
        /// The agent ID was not found in the registry.
        AgentNotFound,
        /// The agent is deactivated and cannot be rated.
        AgentInactive,
        /// The score is outside the accepted inclusive range.
        ScoreOutOfRange,
        /// The primary tag must not be empty.
        EmptyTag,
        /// A tag exceeds the maximum allowed length.
        TagTooLong,
        /// The feedback URI exceeds the maximum allowed length.
        UriTooLong,
        /// The registry is administratively paused.
        Paused,
    }

    // ========== Extrinsics ==========

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Rate an agent with a fixed-point `score` and forward the feedback
        /// to the reputation aggregator.
        ///
        /// With two score decimals a range of 100 to 500 means ratings of
        /// 1.00 to 5.00 stars. Both bounds are inclusive.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::rate())]
        pub fn rate(
            origin: OriginFor<T>,
            agent_id: AgentId,
            score: u16,
            tag1: Vec<u8>,
            tag2: Vec<u8>,
            feedback_uri: Vec<u8>,
            feedback_hash: H256,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            ensure!(!T::Agents::paused(), Error::<T>::Paused);

            ensure!(
                score >= T::MinScore::get() && score <= T::MaxScore::get(),
                Error::<T>::ScoreOutOfRange
            );
            ensure!(!tag1.is_empty(), Error::<T>::EmptyTag);
            ensure!(
                tag1.len() <= T::MaxTagLength::get() as usize
                    && tag2.len() <= T::MaxTagLength::get() as usize,
                Error::<T>::TagTooLong
            );
            ensure!(
                feedback_uri.len() <= T::MaxUriLength::get() as usize,
                Error::<T>::UriTooLong
            );

            ensure!(T::Agents::exists(agent_id), Error::<T>::AgentNotFound);
            ensure!(T::Agents::is_active(agent_id), Error::<T>::AgentInactive);

            let endpoint = T::Agents::endpoint(agent_id).ok_or(Error::<T>::AgentNotFound)?;

            T::Reputation::submit_feedback(
                agent_id,
                score,
                T::ScoreDecimals::get(),
                &tag1,
                &tag2,
                &endpoint,
                &feedback_uri,
                feedback_hash,
            )?;

            Self::deposit_event(Event::RatingSubmitted {
                agent_id,
                rater: who,
                score,
                tag1,
                tag2,
                feedback_hash,
            });

            Ok(())
        }
    }

    // ========== Weight Info Trait ==========

    /// Weight information for the pallet's extrinsics.
    pub trait WeightInfo {
        fn rate() -> Weight;
    }

    /// Default weights for testing.
    impl WeightInfo for () {
        fn rate() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }
}
