//! Two-phase campaigns: a coverage-building phase followed by an exploiting
//! phase (profile then active, race then chess).

use tracing::info;

use super::death_test::DeathTest;
use crate::domain::errors::DomainResult;
use crate::domain::models::{CampaignState, CampaignStats};

/// Runs `first`, then `second` unless `first` ended fatally.
pub struct TwoPhaseCampaign {
    name: String,
    first: DeathTest,
    second: DeathTest,
    state: CampaignState,
}

impl TwoPhaseCampaign {
    /// Compose two controllers under one campaign name.
    pub fn new(name: impl Into<String>, first: DeathTest, second: DeathTest) -> Self {
        Self {
            name: name.into(),
            first,
            second,
            state: CampaignState::NotStarted,
        }
    }

    /// Campaign name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The coverage-building phase.
    pub fn first(&self) -> &DeathTest {
        &self.first
    }

    /// The exploiting phase.
    pub fn second(&self) -> &DeathTest {
        &self.second
    }

    /// Combined state of both phases.
    pub fn state(&self) -> CampaignState {
        self.state
    }

    /// Fatal iff either phase was fatal.
    pub fn is_fatal(&self) -> bool {
        self.first.is_fatal() || self.second.is_fatal()
    }

    /// Run both phases to completion. Calling again once terminal returns
    /// the final state without launching anything.
    pub async fn run(&mut self) -> DomainResult<CampaignState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        self.state = CampaignState::Running;
        info!(campaign = %self.name, "Starting {} phase", self.first.label());

        let first = self.first.run().await?;
        if first.is_fatal() {
            info!(
                campaign = %self.name,
                "Skipping {} phase after fatal {} phase",
                self.second.label(),
                self.first.label()
            );
        } else {
            info!(campaign = %self.name, "Starting {} phase", self.second.label());
            self.second.run().await?;
        }

        self.state = if self.is_fatal() {
            CampaignState::Fatal
        } else {
            CampaignState::Converged
        };
        self.log_stat();
        Ok(self.state)
    }

    /// Statistics of the phases that ran.
    pub fn stats(&self) -> Vec<CampaignStats> {
        [&self.first, &self.second]
            .into_iter()
            .filter(|phase| phase.state() != CampaignState::NotStarted)
            .map(DeathTest::stats)
            .collect()
    }

    fn log_stat(&self) {
        info!("---------------------------");
        self.first.log_stat();
        if self.second.state() != CampaignState::NotStarted {
            self.second.log_stat();
        }
    }
}
