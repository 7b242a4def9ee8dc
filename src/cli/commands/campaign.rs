//! Implementation of the campaign commands (`native`, `profile`, `active`,
//! `race`, `chess`, `random`, `idiom`, `chess-race`).

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::adapters::{FileCoverageSink, JsonSnapshotStore, ProcessLauncher};
use crate::application::{
    ActiveCampaign, CampaignKind, ChessCampaign, DeathTest, NativeCampaign, ProfileCampaign,
    RaceCampaign, RandomCampaign, SnapshotReader, TwoPhaseCampaign,
};
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::{
    ActiveArgs, ChessRaceArgs, IdiomArgs, PhaseArgs, RandomArgs, TargetArgs,
};
use crate::domain::models::{
    CampaignState, CampaignStats, Config, Idiom, ModeKind, PhaseConfig, RunSpec, StopMode,
};
use crate::domain::ports::{CoverageSink, SnapshotStore, TargetLauncher};
use crate::infrastructure::config::ConfigLoader;

/// What to run, as selected on the command line
pub enum CampaignPlan {
    /// `native`
    Native(PhaseArgs),
    /// `profile`
    Profile(PhaseArgs),
    /// `active`
    Active(ActiveArgs),
    /// `race`
    Race(PhaseArgs),
    /// `chess`
    Chess(PhaseArgs),
    /// `random`
    Random(RandomArgs),
    /// `idiom`: profile then active
    Idiom(IdiomArgs),
    /// `chess-race`: race then chess
    ChessRace(ChessRaceArgs),
}

/// Result of a campaign command
#[derive(Debug, Serialize)]
pub struct CampaignOutput {
    /// Campaign name
    pub campaign: String,
    /// Final state
    pub state: CampaignState,
    /// Whether a fatal run was seen
    pub fatal: bool,
    /// Statistics of every phase that ran
    pub phases: Vec<CampaignStats>,
}

impl CommandOutput for CampaignOutput {
    fn to_human(&self) -> String {
        let verdict = if self.fatal {
            "fatal error detected"
        } else {
            "threshold reached"
        };
        format!(
            "Campaign {}: {verdict}\n{}",
            self.campaign,
            TableFormatter::new().format_campaign_stats(&self.phases)
        )
    }
}

/// Ports shared by every phase of a campaign
struct Engine {
    launcher: Arc<dyn TargetLauncher>,
    store: Arc<dyn SnapshotStore>,
    sink: Arc<dyn CoverageSink>,
    config: Config,
    max_runs: Option<u64>,
    spec: RunSpec,
}

impl Engine {
    fn new(config: &Config, target: &TargetArgs) -> Result<Self> {
        let Some((program, args)) = target.program.split_first() else {
            bail!("No program given; pass it after `--`");
        };
        let spec = target
            .options
            .iter()
            .fold(RunSpec::new(program, args.to_vec()), |spec, (knob, value)| {
                spec.with_option(knob.as_str(), value)
            });

        let max_runs = target.max_runs.or(config.campaign.max_runs);
        if max_runs == Some(0) {
            bail!("--max-runs must be at least 1");
        }

        Ok(Self {
            launcher: Arc::new(ProcessLauncher::from_config(&config.engine)),
            store: Arc::new(JsonSnapshotStore::new()),
            sink: Arc::new(FileCoverageSink::from_config(&config.reporting)),
            config: config.clone(),
            max_runs,
            spec,
        })
    }

    fn reader(&self) -> SnapshotReader {
        SnapshotReader::new(Arc::clone(&self.store), self.config.snapshots.clone())
    }

    fn phase(&self, kind: Box<dyn CampaignKind>, mode: StopMode) -> DeathTest {
        DeathTest::new(kind, mode, Arc::clone(&self.launcher), self.spec.clone())
            .with_max_runs(self.max_runs)
    }

    /// Command-line mode and threshold over the configured defaults.
    fn stop_mode(
        &self,
        phase: &'static str,
        defaults: PhaseConfig,
        mode: Option<ModeKind>,
        threshold: Option<u64>,
    ) -> Result<StopMode> {
        let settings = PhaseConfig::new(
            mode.unwrap_or(defaults.mode),
            threshold.unwrap_or(defaults.threshold),
        );
        ConfigLoader::validate_phase(phase, &settings, self.max_runs)?;
        Ok(settings.stop_mode())
    }
}

/// Run a campaign; the exit code is non-zero when a fatal run was seen.
pub async fn execute(plan: CampaignPlan, config: &Config, json_mode: bool) -> Result<ExitCode> {
    let defaults = &config.campaign;

    let result = match plan {
        CampaignPlan::Native(args) => {
            let engine = Engine::new(config, &args.target)?;
            let mode = engine.stop_mode("native", defaults.native, args.mode, args.threshold)?;
            let kind = NativeCampaign::new(Arc::clone(&engine.sink));
            run_single(engine.phase(Box::new(kind), mode)).await?
        }
        CampaignPlan::Profile(args) => {
            let engine = Engine::new(config, &args.target)?;
            let mode = engine.stop_mode("profile", defaults.profile, args.mode, args.threshold)?;
            let kind = ProfileCampaign::new(engine.reader(), Arc::clone(&engine.sink));
            run_single(engine.phase(Box::new(kind), mode)).await?
        }
        CampaignPlan::Active(args) => {
            let phase = args.phase;
            let engine = Engine::new(config, &phase.target)?;
            let mode = engine.stop_mode("active", defaults.active, phase.mode, phase.threshold)?;
            let kind = active(&engine, args.idiom);
            run_single(engine.phase(Box::new(kind), mode)).await?
        }
        CampaignPlan::Race(args) => {
            let engine = Engine::new(config, &args.target)?;
            let mode = engine.stop_mode("race", defaults.race, args.mode, args.threshold)?;
            let kind = RaceCampaign::new(Arc::clone(&engine.store), config.snapshots.clone());
            run_single(engine.phase(Box::new(kind), mode)).await?
        }
        CampaignPlan::Chess(args) => {
            let engine = Engine::new(config, &args.target)?;
            let mode = engine.stop_mode("chess", defaults.chess, args.mode, args.threshold)?;
            let kind = ChessCampaign::new(engine.reader(), Arc::clone(&engine.sink));
            run_single(engine.phase(Box::new(kind), mode)).await?
        }
        CampaignPlan::Random(args) => {
            let phase = args.phase;
            let engine = Engine::new(config, &phase.target)?;
            let mode = engine.stop_mode("random", defaults.random, phase.mode, phase.threshold)?;
            let kind =
                RandomCampaign::new(engine.reader(), Arc::clone(&engine.sink), args.scheduler);
            run_single(engine.phase(Box::new(kind), mode)).await?
        }
        CampaignPlan::Idiom(args) => {
            let engine = Engine::new(config, &args.target)?;
            let profile_mode = engine.stop_mode(
                "profile",
                defaults.profile,
                args.profile_mode,
                args.profile_threshold,
            )?;
            let active_mode = engine.stop_mode(
                "active",
                defaults.active,
                args.active_mode,
                args.active_threshold,
            )?;
            let profile = ProfileCampaign::new(engine.reader(), Arc::clone(&engine.sink));
            let campaign = TwoPhaseCampaign::new(
                "idiom",
                engine.phase(Box::new(profile), profile_mode),
                engine.phase(Box::new(active(&engine, args.idiom)), active_mode),
            );
            run_two_phase(campaign).await?
        }
        CampaignPlan::ChessRace(args) => {
            let engine = Engine::new(config, &args.target)?;
            let race_mode =
                engine.stop_mode("race", defaults.race, args.race_mode, args.race_threshold)?;
            let chess_mode =
                engine.stop_mode("chess", defaults.chess, args.chess_mode, args.chess_threshold)?;
            let race = RaceCampaign::new(Arc::clone(&engine.store), config.snapshots.clone());
            let chess = ChessCampaign::new(engine.reader(), Arc::clone(&engine.sink))
                .with_race_scheduling(true);
            let campaign = TwoPhaseCampaign::new(
                "chess-race",
                engine.phase(Box::new(race), race_mode),
                engine.phase(Box::new(chess), chess_mode),
            );
            run_two_phase(campaign).await?
        }
    };

    output(&result, json_mode);
    Ok(if result.fatal {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn active(engine: &Engine, idiom: Option<Idiom>) -> ActiveCampaign {
    ActiveCampaign::new(engine.reader(), Arc::clone(&engine.sink), idiom)
}

async fn run_single(mut phase: DeathTest) -> Result<CampaignOutput> {
    let state = phase
        .run()
        .await
        .with_context(|| format!("{} campaign failed", phase.label()))?;
    phase.log_stat();
    Ok(CampaignOutput {
        campaign: phase.label().to_string(),
        state,
        fatal: state.is_fatal(),
        phases: vec![phase.stats()],
    })
}

async fn run_two_phase(mut campaign: TwoPhaseCampaign) -> Result<CampaignOutput> {
    let state = campaign
        .run()
        .await
        .with_context(|| format!("{} campaign failed", campaign.name()))?;
    Ok(CampaignOutput {
        campaign: campaign.name().to_string(),
        state,
        fatal: campaign.is_fatal(),
        phases: campaign.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(max_runs: Option<u64>) -> TargetArgs {
        TargetArgs {
            options: vec![],
            max_runs,
            program: vec!["./app".to_string()],
        }
    }

    #[test]
    fn test_stop_mode_overrides() {
        let engine = Engine::new(&Config::default(), &target(None)).unwrap();
        let defaults = PhaseConfig::new(ModeKind::Stable, 3);
        assert_eq!(
            engine.stop_mode("profile", defaults, None, None).unwrap(),
            StopMode::Stable(3)
        );
        assert_eq!(
            engine.stop_mode("profile", defaults, None, Some(5)).unwrap(),
            StopMode::Stable(5)
        );
        assert_eq!(
            engine
                .stop_mode("profile", defaults, Some(ModeKind::Runout), Some(2))
                .unwrap(),
            StopMode::Runout(2)
        );
        assert!(engine
            .stop_mode("profile", defaults, Some(ModeKind::Runout), Some(0))
            .is_err());
    }

    #[test]
    fn test_unbounded_mode_needs_max_runs() {
        let defaults = PhaseConfig::new(ModeKind::Runout, 1);
        let unbounded = Engine::new(&Config::default(), &target(None)).unwrap();
        assert!(unbounded
            .stop_mode("native", defaults, Some(ModeKind::Finish), None)
            .is_err());
        assert!(unbounded
            .stop_mode("random", defaults, Some(ModeKind::Stable), None)
            .is_err());

        let capped = Engine::new(&Config::default(), &target(Some(20))).unwrap();
        assert_eq!(
            capped
                .stop_mode("native", defaults, Some(ModeKind::Finish), None)
                .unwrap(),
            StopMode::Finish
        );
    }

    #[test]
    fn test_engine_builds_run_spec() {
        let target = TargetArgs {
            options: vec![("enable_observer".to_string(), "1".to_string())],
            max_runs: None,
            program: vec!["./app".to_string(), "-n".to_string(), "8".to_string()],
        };
        let engine = Engine::new(&Config::default(), &target).unwrap();
        assert_eq!(engine.spec.program, std::path::PathBuf::from("./app"));
        assert_eq!(engine.spec.args, vec!["-n", "8"]);
        assert_eq!(
            engine.spec.options.get("enable_observer").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_engine_rejects_zero_max_runs() {
        assert!(Engine::new(&Config::default(), &target(Some(0))).is_err());
    }
}
