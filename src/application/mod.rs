//! Campaign control: the death-test loop, the campaign kinds it drives,
//! and the two-phase composer.

pub mod campaigns;
pub mod composer;

#[cfg(test)]
pub(crate) mod test_support;

pub use campaigns::{
    ActiveCampaign, ChessCampaign, NativeCampaign, ProfileCampaign, RaceCampaign, RandomCampaign,
    SnapshotReader,
};
pub use composer::TwoPhaseCampaign;
pub use death_test::{CampaignKind, DeathTest};
